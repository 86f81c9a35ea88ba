//! Transform descriptor parsing.
//!
//! A descriptor is the last path segment of an image request:
//!
//! ```text
//! {contentId}.{mode}.{width}x{height}.{extension}
//! ```
//!
//! `contentId` is exactly [`CONTENT_ID_LEN`] bytes. Everything after it is
//! split on `.` and must yield four fields, the first one empty. Mode tokens
//! are not interpreted here; see [`crate::transform`].

use crate::{CoreError, CoreResult};
use serde::Serialize;

pub const CONTENT_ID_LEN: usize = 32;

/// Fixed key prefix for source objects.
pub const STORAGE_PREFIX: &str = "listings";

const FIELD_COUNT: usize = 4;

/// Bounds on the requested output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionLimits {
    /// Upper bound for either side.
    pub max_dimension: u32,
    /// Upper bound for `width * height`; the pad canvas is allocated at this size.
    pub max_pixels: u64,
}

impl DimensionLimits {
    pub fn unbounded() -> Self {
        Self {
            max_dimension: u32::MAX,
            max_pixels: u64::MAX,
        }
    }
}

impl Default for DimensionLimits {
    fn default() -> Self {
        Self {
            max_dimension: 8192,
            max_pixels: 4096 * 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformDescriptor {
    pub content_id: String,
    pub mode: String,
    pub width: u32,
    pub height: u32,
    pub extension: String,
}

impl TransformDescriptor {
    /// Parse a descriptor without an upper bound on the dimensions.
    pub fn parse(segment: &str) -> CoreResult<Self> {
        Self::parse_with_limits(segment, DimensionLimits::unbounded())
    }

    /// Parse a descriptor, rejecting sizes outside `limits`.
    pub fn parse_with_limits(segment: &str, limits: DimensionLimits) -> CoreResult<Self> {
        if segment.is_empty() {
            return Err(CoreError::malformed_descriptor());
        }

        let (content_id, remainder) = segment
            .get(..CONTENT_ID_LEN)
            .zip(segment.get(CONTENT_ID_LEN..))
            .ok_or_else(CoreError::malformed_descriptor)?;

        if content_id.contains(&['.', '/', '\\'][..]) {
            return Err(CoreError::invalid_descriptor(format!(
                "Content id must be {} characters without '.', '/' or '\\'",
                CONTENT_ID_LEN
            )));
        }

        let fields: Vec<&str> = remainder.split('.').collect();
        if fields.len() != FIELD_COUNT || !fields[0].is_empty() {
            return Err(CoreError::malformed_descriptor());
        }

        let mode = fields[1];
        let dimensions = fields[2];
        let extension = fields[3];

        if mode.is_empty() {
            return Err(CoreError::malformed_descriptor());
        }

        if extension.is_empty() || !extension.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(CoreError::invalid_descriptor(format!(
                "Invalid file extension '{}'",
                extension
            )));
        }

        let (width, height) = parse_dimensions(dimensions, limits.max_dimension)?;

        let area = u64::from(width) * u64::from(height);
        if area > limits.max_pixels {
            return Err(CoreError::invalid_descriptor(format!(
                "The requested size {}x{} exceeds {} pixels",
                width, height, limits.max_pixels
            )));
        }

        Ok(Self {
            content_id: content_id.to_string(),
            mode: mode.to_string(),
            width,
            height,
            extension: extension.to_string(),
        })
    }

    /// Object key of the source image, `listings/{contentId}.{extension}`.
    pub fn storage_key(&self) -> String {
        format!("{}/{}.{}", STORAGE_PREFIX, self.content_id, self.extension)
    }
}

impl std::str::FromStr for TransformDescriptor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_dimensions(token: &str, max_dimension: u32) -> CoreResult<(u32, u32)> {
    let parts: Vec<&str> = token.split('x').collect();
    if parts.len() != 2 {
        return Err(CoreError::invalid_descriptor(format!(
            "Dimensions must be '{{width}}x{{height}}', got '{}'",
            token
        )));
    }

    Ok((
        parse_dimension(parts[0], "width", max_dimension)?,
        parse_dimension(parts[1], "height", max_dimension)?,
    ))
}

fn parse_dimension(token: &str, name: &str, max_dimension: u32) -> CoreResult<u32> {
    // u32 parsing accepts a leading '+', which is not base-10 digits only
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::invalid_descriptor(format!(
            "The {} must be a positive integer, got '{}'",
            name, token
        )));
    }

    let value: u32 = token.parse().map_err(|_| {
        CoreError::invalid_descriptor(format!("The {} '{}' is too large", name, token))
    })?;

    if value == 0 {
        return Err(CoreError::invalid_descriptor(format!(
            "The {} must be greater than zero",
            name
        )));
    }

    if value > max_dimension {
        return Err(CoreError::invalid_descriptor(format!(
            "The {} must not exceed {} pixels, got {}",
            name, max_dimension, value
        )));
    }

    Ok(value)
}
