//! Pixel work for pictor.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop | `DynamicImage::resize_to_fill` (centre gravity) |
//! | Pad | fit, then `imageops::overlay` onto a filled canvas |
//! | Encode | `JpegEncoder` with quality, lossless `WebPEncoder` |
//!
//! Dimension math lives in [`calculations`] and is tested without images.

pub mod calculations;
pub mod engine;
pub mod rust_engine;

pub use engine::{ImageEngine, ImagingError, ImagingResult, ProcessedImage};
pub use rust_engine::RustImageEngine;
