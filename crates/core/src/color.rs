//! Pad colour decoding.
//!
//! Colours arrive as 3 or 6 hex digits. The short form doubles each digit
//! (`f80` becomes `ff8800`), the same convention as CSS short hex colours.

use crate::{CoreError, CoreResult};
use serde::Serialize;

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Expand a 3-digit shorthand token to 6 digits. Other lengths pass through.
pub fn expand_hex(token: &str) -> String {
    if token.chars().count() == 3 {
        token.chars().flat_map(|c| [c, c]).collect()
    } else {
        token.to_string()
    }
}

/// Decode a 3 or 6 digit hex token into RGB channels.
pub fn hex_to_rgb(token: &str) -> CoreResult<Rgb> {
    let hex = expand_hex(token);

    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::invalid_color(format!(
            "'{}' is not a 3 or 6 digit hex colour",
            token
        )));
    }

    let value = u32::from_str_radix(&hex, 16)
        .map_err(|e| CoreError::invalid_color(format!("'{}': {}", token, e)))?;

    Ok(Rgb {
        red: ((value >> 16) & 0xff) as u8,
        green: ((value >> 8) & 0xff) as u8,
        blue: (value & 0xff) as u8,
    })
}

impl std::str::FromStr for Rgb {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_rgb(s)
    }
}
