//! Pure calculation functions for output dimensions.

/// Largest size with the source aspect ratio that fits inside `target`.
///
/// Without `enlarge`, a source that already fits is returned unchanged.
/// Neither returned dimension is ever zero.
pub fn fit_within(source: (u32, u32), target: (u32, u32), enlarge: bool) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if src_w == 0 || src_h == 0 {
        return (tgt_w.max(1), tgt_h.max(1));
    }

    let scale = f64::min(tgt_w as f64 / src_w as f64, tgt_h as f64 / src_h as f64);

    if scale >= 1.0 && !enlarge {
        return source;
    }

    let w = ((src_w as f64 * scale).round() as u32).clamp(1, tgt_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, tgt_h.max(1));
    (w, h)
}

/// Top-left offset that centres `inner` inside `outer`.
pub fn centre_offset(inner: (u32, u32), outer: (u32, u32)) -> (i64, i64) {
    (
        (outer.0 as i64 - inner.0 as i64) / 2,
        (outer.1 as i64 - inner.1 as i64) / 2,
    )
}
