use pictor_core::{OutputType, ProcessingConfig};
use thiserror::Error;

pub type ImagingResult<T> = Result<T, ImagingError>;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("Failed to encode output image: {0}")]
    Encode(String),
}

/// Encoded result of a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub output_type: OutputType,
}

/// Applies a [`ProcessingConfig`] to encoded source bytes.
///
/// Implementations are CPU-bound and blocking; async callers should run them
/// on a blocking thread.
pub trait ImageEngine: Send + Sync {
    fn process(&self, source: &[u8], config: &ProcessingConfig) -> ImagingResult<ProcessedImage>;
}
