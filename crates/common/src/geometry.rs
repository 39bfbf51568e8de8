//! Frame geometry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FramecastError;

/// A `width x height` pair in CSS pixels.
///
/// Serializes as `"WIDTHxHEIGHT"`; deserializes from either that string
/// form or a `{ "width": .., "height": .. }` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 9:16 portrait, full HD.
    pub const fn portrait_hd() -> Self {
        Self::new(1080, 1920)
    }

    /// Both sides are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = FramecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (w, h) = trimmed
            .split_once(['x', 'X'])
            .ok_or_else(|| FramecastError::validation(format!("expected WIDTHxHEIGHT, got {s:?}")))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| FramecastError::validation(format!("invalid width in {s:?}")))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| FramecastError::validation(format!("invalid height in {s:?}")))?;
        let dims = Self { width, height };
        if !dims.is_valid() {
            return Err(FramecastError::validation(format!(
                "dimensions must be positive, got {s:?}"
            )));
        }
        Ok(dims)
    }
}

impl Serialize for Dimensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionsRepr {
    Text(String),
    Pair { width: u32, height: u32 },
}

impl<'de> Deserialize<'de> for Dimensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match DimensionsRepr::deserialize(deserializer)? {
            DimensionsRepr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            DimensionsRepr::Pair { width, height } => {
                let dims = Dimensions { width, height };
                if dims.is_valid() {
                    Ok(dims)
                } else {
                    Err(serde::de::Error::custom(format!(
                        "dimensions must be positive, got {dims}"
                    )))
                }
            }
        }
    }
}
