//! Mapping of a parsed descriptor onto image processing parameters.

use crate::color::{hex_to_rgb, Rgb};
use crate::descriptor::TransformDescriptor;
use crate::CoreResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Offset of the colour token inside a pad mode (`pad-` prefix).
const PAD_PREFIX_LEN: usize = 4;

const DEFAULT_QUALITY: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Jpeg,
    WebP,
}

impl OutputType {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    #[default]
    Centre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Extend {
    #[default]
    None,
    Background,
}

/// Recognized transform mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "background")]
pub enum TransformMode {
    Auto,
    Scale,
    Crop,
    Pad(Rgb),
}

impl TransformMode {
    /// Recognize a mode token. Tokens with no dedicated handling (`auto`,
    /// `fit`, anything unknown) resolve to [`TransformMode::Auto`].
    pub fn from_token(token: &str) -> CoreResult<Self> {
        if token == "crop" {
            return Ok(Self::Crop);
        }

        if token == "scale" {
            return Ok(Self::Scale);
        }

        if token.contains("pad") {
            let hex = token.get(PAD_PREFIX_LEN..).unwrap_or_default();
            return hex_to_rgb(hex).map(Self::Pad);
        }

        if token == "fit" {
            debug!("Mode 'fit' is not supported, falling back to auto");
        } else if token != "auto" {
            debug!("Unrecognized mode '{}', falling back to auto", token);
        }

        Ok(Self::Auto)
    }
}

/// Request-independent inputs to the resolver, built once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub webp_enabled: bool,
    pub quality: u8,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            webp_enabled: false,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl TransformOptions {
    pub fn output_type(&self) -> OutputType {
        if self.webp_enabled {
            OutputType::WebP
        } else {
            OutputType::Jpeg
        }
    }
}

/// Concrete parameters handed to the image engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingConfig {
    pub width: u32,
    pub height: u32,
    pub output_type: OutputType,
    pub quality: u8,
    pub crop: bool,
    pub gravity: Option<Gravity>,
    pub enlarge: bool,
    pub embed: bool,
    pub extend: Extend,
    pub background: Option<Rgb>,
}

impl ProcessingConfig {
    /// Plain resize with every mode flag cleared.
    pub fn new(width: u32, height: u32, options: &TransformOptions) -> Self {
        Self {
            width,
            height,
            output_type: options.output_type(),
            quality: options.quality,
            crop: false,
            gravity: None,
            enlarge: false,
            embed: false,
            extend: Extend::None,
            background: None,
        }
    }

    pub fn with_mode(mut self, mode: TransformMode) -> Self {
        match mode {
            TransformMode::Auto => {}
            TransformMode::Crop => {
                self.crop = true;
                self.gravity = Some(Gravity::Centre);
            }
            TransformMode::Scale => {
                self.enlarge = true;
            }
            TransformMode::Pad(color) => {
                self.embed = true;
                self.extend = Extend::Background;
                self.background = Some(color);
            }
        }
        self
    }

    /// The mode whose flags are set.
    pub fn mode(&self) -> TransformMode {
        if self.crop {
            TransformMode::Crop
        } else if self.enlarge {
            TransformMode::Scale
        } else if let (true, Some(color)) = (self.embed, self.background) {
            TransformMode::Pad(color)
        } else {
            TransformMode::Auto
        }
    }
}

/// Resolve a parsed descriptor into processing parameters.
pub fn resolve(
    descriptor: &TransformDescriptor,
    options: &TransformOptions,
) -> CoreResult<ProcessingConfig> {
    let mode = TransformMode::from_token(&descriptor.mode)?;

    Ok(ProcessingConfig::new(descriptor.width, descriptor.height, options).with_mode(mode))
}
