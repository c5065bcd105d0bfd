//! The closed set of editing operations a front end can request.

use serde::{Deserialize, Serialize};

use crate::params::SegmentationParams;
use crate::types::{PipelineError, RgbImage};

/// One image operation with its parameters.
///
/// Front ends build one of these (from a menu choice, a CLI subcommand,
/// a JSON job file) and hand it to [`Operation::apply`] or
/// [`crate::session::Session::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Luma replicated to three channels.
    Grayscale,
    /// K-means palette reduction of the raw image.
    Quantize {
        /// Palette size (`2..=16`).
        n_colors: u32,
    },
    /// The full stylization pipeline.
    Stylize(SegmentationParams),
}

impl Operation {
    /// Run the operation on `image`, returning a new image.
    ///
    /// # Errors
    ///
    /// Whatever the underlying boundary function returns:
    /// [`crate::grayscale()`], [`crate::quantize_only`], or
    /// [`crate::run_stylization`].
    pub fn apply(&self, image: &RgbImage) -> Result<RgbImage, PipelineError> {
        match self {
            Self::Grayscale => crate::grayscale(image),
            Self::Quantize { n_colors } => crate::quantize_only(image, *n_colors),
            Self::Stylize(params) => crate::run_stylization(image, params),
        }
    }

    /// Short display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Grayscale => "Grayscale",
            Self::Quantize { .. } => "K-means",
            Self::Stylize(_) => "Smart Segmentation",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn two_tone() -> RgbImage {
        RgbImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                image::Rgb([200, 30, 30])
            } else {
                image::Rgb([30, 30, 200])
            }
        })
    }

    #[test]
    fn grayscale_dispatch() {
        let img = two_tone();
        let out = Operation::Grayscale.apply(&img).unwrap();
        assert_eq!(out, crate::grayscale::grayscale(&img));
    }

    #[test]
    fn quantize_dispatch_validates_range() {
        let result = Operation::Quantize { n_colors: 1 }.apply(&two_tone());
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));
    }

    #[test]
    fn stylize_dispatch_preserves_dimensions() {
        let op = Operation::Stylize(SegmentationParams::painterly());
        assert_eq!(op.apply(&two_tone()).unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn names() {
        assert_eq!(Operation::Grayscale.name(), "Grayscale");
        assert_eq!(Operation::Quantize { n_colors: 4 }.name(), "K-means");
        assert_eq!(
            Operation::Stylize(SegmentationParams::default()).name(),
            "Smart Segmentation",
        );
    }

    #[test]
    fn serde_is_tagged() {
        let json = serde_json::to_string(&Operation::Quantize { n_colors: 6 }).unwrap();
        assert_eq!(json, r#"{"op":"quantize","n_colors":6}"#);

        let op: Operation = serde_json::from_str(r#"{"op":"grayscale"}"#).unwrap();
        assert_eq!(op, Operation::Grayscale);

        let op: Operation =
            serde_json::from_str(r#"{"op":"stylize","n_colors":4,"sigma":0}"#).unwrap();
        let expected = Operation::Stylize(SegmentationParams {
            n_colors: 4,
            sigma: 0.0,
            ..SegmentationParams::default()
        });
        assert_eq!(op, expected);
    }

    #[test]
    fn unknown_operation_rejected() {
        let result: Result<Operation, _> = serde_json::from_str(r#"{"op":"sepia"}"#);
        assert!(result.is_err());
    }
}
