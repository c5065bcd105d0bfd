//! Shared types for the inkwash stylization pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can hand pixel grids to the
/// pipeline without depending on `image` directly.
///
/// Every stage consumes and produces this type: a row-major grid of
/// three 8-bit channels.
pub use image::RgbImage;

/// Re-export `GrayImage` for the single-channel intermediates (luma,
/// Canny edge maps).
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing image.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` when the image holds no pixels at all.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Color space the segmenter works in.
///
/// Images always enter and leave the pipeline as RGB. The working copy
/// used for superpixel segmentation is converted into this space first
/// (see [`crate::color::convert`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// CIE L*a*b* (D65), 8-bit encoded.
    #[default]
    Lab,
    /// Plain sRGB, no conversion.
    Rgb,
    /// Hue/saturation/value, 8-bit encoded.
    Hsv,
}

impl ColorSpace {
    /// All supported color spaces, in presentation order.
    pub const ALL: [Self; 3] = [Self::Lab, Self::Rgb, Self::Hsv];

    /// The lowercase tag used in configs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lab => "lab",
            Self::Rgb => "rgb",
            Self::Hsv => "hsv",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorSpace {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|space| space.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::UnsupportedColorSpace(s.to_string()))
    }
}

/// Errors that can occur during pipeline processing.
///
/// Every payload is a plain string so the error can cross a process or
/// worker boundary through serde unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// A color-space tag that is not one of `lab`, `rgb`, `hsv`.
    #[error("unsupported color space: {0:?}")]
    UnsupportedColorSpace(String),

    /// A parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A segment labeling violates its invariants (wrong size,
    /// out-of-range id, or a label with no member pixels).
    #[error("invalid segment labeling: {0}")]
    InvalidLabeling(String),

    /// An operation was invoked before any image was loaded.
    #[error("no image loaded")]
    NoImageLoaded,
}
