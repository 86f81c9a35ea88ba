//! Core of the pictor image proxy: descriptor parsing, pad colour decoding,
//! mode resolution and configuration. Nothing in here performs I/O.

pub mod color;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod transform;

pub use color::{hex_to_rgb, Rgb};
pub use config::PictorConfig;
pub use descriptor::{DimensionLimits, TransformDescriptor};
pub use error::{CoreError, CoreResult};
pub use transform::{
    resolve, Extend, Gravity, OutputType, ProcessingConfig, TransformMode, TransformOptions,
};
