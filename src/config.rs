// SPDX-License-Identifier: GPL-3.0-only

//! Preview configuration
//!
//! [`PreviewConfig`] is built once from the command line, validated, and then
//! only read. Every numeric check happens here so that nothing invalid ever
//! reaches a camera backend.

use crate::constants::defaults;
use crate::errors::ConfigError;
use gstreamer_video::VideoOrientationMethod;
use serde::Serialize;
use std::str::FromStr;

/// Largest dimension or framerate accepted (GStreamer caps fields are `gint`)
const MAX_VALUE: i64 = i32::MAX as i64;

/// Rotation applied to the captured frame before display (clockwise)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "u32")]
pub enum Rotation {
    /// No rotation
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl Rotation {
    /// All accepted rotations, in degree order
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Rotate90,
        Rotation::Rotate180,
        Rotation::Rotate270,
    ];

    /// Create rotation from a degree value. Only exact right angles are accepted.
    pub fn from_degrees(degrees: i64) -> Result<Self, ConfigError> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Rotate90),
            180 => Ok(Rotation::Rotate180),
            270 => Ok(Rotation::Rotate270),
            other => Err(ConfigError::InvalidRotation(other.to_string())),
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }

    /// Orientation understood by `glimagesink`'s `rotate-method` and
    /// `videoflip`'s `video-direction`.
    ///
    /// 90° is a transpose followed by a horizontal flip, 270° a transpose
    /// followed by a vertical flip, matching libcamera's transform convention.
    pub fn orientation_method(&self) -> VideoOrientationMethod {
        match self {
            Rotation::None => VideoOrientationMethod::Identity,
            Rotation::Rotate90 => VideoOrientationMethod::_90r,
            Rotation::Rotate180 => VideoOrientationMethod::_180,
            Rotation::Rotate270 => VideoOrientationMethod::_90l,
        }
    }
}

impl FromStr for Rotation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let degrees = s
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidRotation(s.to_string()))?;
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Parse a strictly positive integer for the named option
pub fn parse_positive(field: &'static str, value: &str) -> Result<u32, ConfigError> {
    let parsed = value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::NotAnInteger {
            field,
            value: value.to_string(),
        })?;

    if parsed <= 0 {
        return Err(ConfigError::NonPositive {
            field,
            value: parsed,
        });
    }
    if parsed > MAX_VALUE {
        return Err(ConfigError::OutOfRange {
            field,
            value: parsed,
            max: MAX_VALUE,
        });
    }

    Ok(parsed as u32)
}

/// clap value parser for `--width`
pub fn parse_width(value: &str) -> Result<u32, ConfigError> {
    parse_positive("width", value)
}

/// clap value parser for `--height`
pub fn parse_height(value: &str) -> Result<u32, ConfigError> {
    parse_positive("height", value)
}

/// clap value parser for `--framerate`
pub fn parse_framerate(value: &str) -> Result<u32, ConfigError> {
    parse_positive("framerate", value)
}

/// clap value parser for `--rotation`
pub fn parse_rotation(value: &str) -> Result<Rotation, ConfigError> {
    value.parse()
}

/// Validated, immutable preview configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewConfig {
    width: u32,
    height: u32,
    framerate: u32,
    fullscreen: bool,
    rotation: Rotation,
    display: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: defaults::WIDTH,
            height: defaults::HEIGHT,
            framerate: defaults::FRAMERATE,
            fullscreen: true,
            rotation: Rotation::None,
            display: defaults::DISPLAY.to_string(),
        }
    }
}

impl PreviewConfig {
    /// Build a configuration, rejecting non-positive or oversized numbers.
    pub fn new(
        width: u32,
        height: u32,
        framerate: u32,
        fullscreen: bool,
        rotation: Rotation,
        display: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        for (field, value) in [("width", width), ("height", height), ("framerate", framerate)] {
            if value == 0 {
                return Err(ConfigError::NonPositive { field, value: 0 });
            }
            if i64::from(value) > MAX_VALUE {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: i64::from(value),
                    max: MAX_VALUE,
                });
            }
        }

        Ok(Self {
            width,
            height,
            framerate,
            fullscreen,
            rotation,
            display: display.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn framerate(&self) -> u32 {
        self.framerate
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Resolved display identifier (flag, then environment, then default)
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl std::fmt::Display for PreviewConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}@{}fps rotation={} {} on {}",
            self.width,
            self.height,
            self.framerate,
            self.rotation,
            if self.fullscreen { "fullscreen" } else { "windowed" },
            self.display
        )
    }
}
