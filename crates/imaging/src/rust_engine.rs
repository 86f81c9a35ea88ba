use crate::calculations::{centre_offset, fit_within};
use crate::engine::{ImageEngine, ImagingError, ImagingResult, ProcessedImage};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use pictor_core::{OutputType, ProcessingConfig, TransformMode};
use tracing::debug;

/// Engine built on the pure Rust `image` crate.
pub struct RustImageEngine {
    filter: FilterType,
}

impl RustImageEngine {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    fn apply(&self, img: DynamicImage, config: &ProcessingConfig) -> DynamicImage {
        let target = (config.width, config.height);

        match config.mode() {
            TransformMode::Crop => img.resize_to_fill(config.width, config.height, self.filter),
            TransformMode::Scale => self.fit(img, target, true),
            TransformMode::Auto => self.fit(img, target, false),
            TransformMode::Pad(color) => {
                let fitted = self.fit(img, target, false);
                let [red, green, blue] = color.to_array();
                let mut canvas =
                    RgbaImage::from_pixel(config.width, config.height, Rgba([red, green, blue, 255]));
                let (x, y) = centre_offset(fitted.dimensions(), target);
                imageops::overlay(&mut canvas, &fitted.to_rgba8(), x, y);
                DynamicImage::ImageRgba8(canvas)
            }
        }
    }

    fn fit(&self, img: DynamicImage, target: (u32, u32), enlarge: bool) -> DynamicImage {
        let source = img.dimensions();
        let (w, h) = fit_within(source, target, enlarge);

        if (w, h) == source {
            img
        } else {
            img.resize_exact(w, h, self.filter)
        }
    }
}

impl Default for RustImageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEngine for RustImageEngine {
    fn process(&self, source: &[u8], config: &ProcessingConfig) -> ImagingResult<ProcessedImage> {
        let img = image::load_from_memory(source).map_err(|e| ImagingError::Decode(e.to_string()))?;

        debug!(
            "Processing {}x{} source into {}x{} ({:?}, {:?})",
            img.width(),
            img.height(),
            config.width,
            config.height,
            config.mode(),
            config.output_type
        );

        let output = self.apply(img, config);
        let (width, height) = output.dimensions();
        let data = encode(&output, config.output_type, config.quality)?;

        Ok(ProcessedImage {
            data,
            width,
            height,
            output_type: config.output_type,
        })
    }
}

fn encode(img: &DynamicImage, output_type: OutputType, quality: u8) -> ImagingResult<Vec<u8>> {
    let mut buffer = Vec::new();

    match output_type {
        OutputType::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
                .map_err(|e| ImagingError::Encode(format!("JPEG encode failed: {}", e)))?;
        }
        OutputType::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let encoder = WebPEncoder::new_lossless(&mut buffer);
            rgba.write_with_encoder(encoder)
                .map_err(|e| ImagingError::Encode(format!("WebP encode failed: {}", e)))?;
        }
    }

    Ok(buffer)
}
