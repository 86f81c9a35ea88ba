use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Message returned for any structurally malformed descriptor.
pub const DESCRIPTOR_FORMAT_HELP: &str = "The URL does not have enough parts. The format must be '/{resource}/{resourceId}/{md5}.{auto|scale|crop|pad-{colour}}.{width}x{height}.jpg'";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid pad colour: {0}")]
    InvalidColor(String),
}

impl CoreError {
    pub fn invalid_descriptor<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Structural failure with the standard format help text.
    pub fn malformed_descriptor() -> Self {
        Self::InvalidDescriptor(DESCRIPTOR_FORMAT_HELP.to_string())
    }

    pub fn invalid_color<S: Into<String>>(msg: S) -> Self {
        Self::InvalidColor(msg.into())
    }
}
