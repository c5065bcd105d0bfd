//! Stylization parameters and named presets.
//!
//! [`SegmentationParams`] is a plain value: presets are built fresh by
//! constructor functions every time they are requested, so editing a
//! "custom" copy can never leak into a named preset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{ColorSpace, PipelineError};

/// Largest palette the clustering stage can index.
pub const MAX_COLORS: u32 = 255;

/// Upper end of the compactness range offered to users. At this value
/// and above segmentation ignores color and regions are the cells of a
/// regular grid.
pub const MAX_COMPACTNESS: f32 = 100.0;

/// Parameter set for one run of the stylization pipeline.
///
/// All fields have defaults (see the `DEFAULT_*` constants), and
/// deserialization fills in any field missing from the input.
///
/// Stages whose strength field is exactly zero (`sigma`, `edge_weight`,
/// `smoothing_factor`, `edge_enhancement`) are skipped entirely rather
/// than applied at zero strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Target number of superpixels. The segmenter may produce fewer.
    pub n_segments: u32,

    /// Palette size of the quantized output (`1..=MAX_COLORS`).
    pub n_colors: u32,

    /// Spatial-versus-color tradeoff for superpixels. `0` follows color
    /// boundaries only; [`MAX_COMPACTNESS`] gives grid-like regions.
    pub compactness: f32,

    /// Gaussian pre-blur sigma applied before segmentation. `0` disables it.
    pub sigma: f32,

    /// How strongly original-image edges are blended back in (0 to 1).
    pub edge_weight: f32,

    /// Color space the segmenter works in.
    pub color_space: ColorSpace,

    /// Strength of the final edge-preserving smoothing (0 to 1).
    pub smoothing_factor: f32,

    /// Strength of the final unsharp-mask sharpening (0 to 1).
    pub edge_enhancement: f32,

    /// Seed for palette clustering. Identical image, parameters, and seed
    /// always give byte-identical output.
    pub seed: u64,
}

impl SegmentationParams {
    /// Default target superpixel count.
    pub const DEFAULT_N_SEGMENTS: u32 = 100;
    /// Default palette size.
    pub const DEFAULT_N_COLORS: u32 = 8;
    /// Default compactness.
    pub const DEFAULT_COMPACTNESS: f32 = 10.0;
    /// Default pre-blur sigma.
    pub const DEFAULT_SIGMA: f32 = 3.0;
    /// Default edge blend weight.
    pub const DEFAULT_EDGE_WEIGHT: f32 = 1.0;
    /// Default working color space.
    pub const DEFAULT_COLOR_SPACE: ColorSpace = ColorSpace::Lab;
    /// Default final smoothing strength.
    pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.5;
    /// Default sharpening strength.
    pub const DEFAULT_EDGE_ENHANCEMENT: f32 = 0.5;
    /// Default clustering seed.
    pub const DEFAULT_SEED: u64 = 42;

    /// Bold outlines, flat color, strong sharpening.
    #[must_use]
    pub fn cartoon() -> Self {
        Self {
            n_segments: 100,
            n_colors: 8,
            compactness: 20.0,
            edge_weight: 1.0,
            edge_enhancement: 0.8,
            smoothing_factor: 0.7,
            ..Self::default()
        }
    }

    /// Many loose regions and a wider palette, with light edge work.
    #[must_use]
    pub fn painterly() -> Self {
        Self {
            n_segments: 200,
            n_colors: 12,
            compactness: 5.0,
            edge_weight: 0.3,
            edge_enhancement: 0.2,
            smoothing_factor: 0.6,
            ..Self::default()
        }
    }

    /// Few blocky regions and a small palette.
    #[must_use]
    pub fn abstract_art() -> Self {
        Self {
            n_segments: 50,
            n_colors: 6,
            compactness: 30.0,
            edge_weight: 0.5,
            edge_enhancement: 0.4,
            smoothing_factor: 0.8,
            ..Self::default()
        }
    }

    /// Check every field against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] naming the first field
    /// that is out of range.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.n_segments == 0 {
            return Err(PipelineError::InvalidParameter(
                "n_segments must be at least 1".to_string(),
            ));
        }
        validate_n_colors(self.n_colors)?;
        validate_non_negative("compactness", self.compactness)?;
        validate_non_negative("sigma", self.sigma)?;
        validate_unit("edge_weight", self.edge_weight)?;
        validate_unit("smoothing_factor", self.smoothing_factor)?;
        validate_unit("edge_enhancement", self.edge_enhancement)?;
        Ok(())
    }
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            n_segments: Self::DEFAULT_N_SEGMENTS,
            n_colors: Self::DEFAULT_N_COLORS,
            compactness: Self::DEFAULT_COMPACTNESS,
            sigma: Self::DEFAULT_SIGMA,
            edge_weight: Self::DEFAULT_EDGE_WEIGHT,
            color_space: Self::DEFAULT_COLOR_SPACE,
            smoothing_factor: Self::DEFAULT_SMOOTHING_FACTOR,
            edge_enhancement: Self::DEFAULT_EDGE_ENHANCEMENT,
            seed: Self::DEFAULT_SEED,
        }
    }
}

/// `n_colors` must index into a `u8`-addressed palette.
pub(crate) fn validate_n_colors(n_colors: u32) -> Result<(), PipelineError> {
    if (1..=MAX_COLORS).contains(&n_colors) {
        Ok(())
    } else {
        Err(PipelineError::InvalidParameter(format!(
            "n_colors must be between 1 and {MAX_COLORS}, got {n_colors}"
        )))
    }
}

pub(crate) fn validate_non_negative(name: &str, value: f32) -> Result<(), PipelineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidParameter(format!(
            "{name} must be a finite non-negative number, got {value}"
        )))
    }
}

pub(crate) fn validate_unit(name: &str, value: f32) -> Result<(), PipelineError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::InvalidParameter(format!(
            "{name} must be between 0 and 1, got {value}"
        )))
    }
}

/// Named parameter presets.
///
/// `Custom` stands for user-edited values and has no canonical instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// User-edited values.
    #[default]
    Custom,
    /// See [`SegmentationParams::cartoon`].
    Cartoon,
    /// See [`SegmentationParams::painterly`].
    Painterly,
    /// See [`SegmentationParams::abstract_art`].
    Abstract,
}

impl Preset {
    /// All presets, in presentation order.
    pub const ALL: [Self; 4] = [Self::Custom, Self::Cartoon, Self::Painterly, Self::Abstract];

    /// A fresh parameter record for this preset, or `None` for `Custom`.
    #[must_use]
    pub fn params(self) -> Option<SegmentationParams> {
        match self {
            Self::Custom => None,
            Self::Cartoon => Some(SegmentationParams::cartoon()),
            Self::Painterly => Some(SegmentationParams::painterly()),
            Self::Abstract => Some(SegmentationParams::abstract_art()),
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Cartoon => "Cartoon",
            Self::Painterly => "Painterly",
            Self::Abstract => "Abstract",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::InvalidParameter(format!("unknown preset {s:?}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_defaults() {
        let params = SegmentationParams::default();
        assert_eq!(params.n_segments, 100);
        assert_eq!(params.n_colors, 8);
        assert!((params.compactness - 10.0).abs() < f32::EPSILON);
        assert!((params.sigma - 3.0).abs() < f32::EPSILON);
        assert!((params.edge_weight - 1.0).abs() < f32::EPSILON);
        assert_eq!(params.color_space, ColorSpace::Lab);
        assert!((params.smoothing_factor - 0.5).abs() < f32::EPSILON);
        assert!((params.edge_enhancement - 0.5).abs() < f32::EPSILON);
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(SegmentationParams::default().validate().is_ok());
    }

    #[test]
    fn every_preset_is_valid() {
        for preset in Preset::ALL {
            if let Some(params) = preset.params() {
                assert!(params.validate().is_ok(), "{preset} failed validation");
            }
        }
    }

    #[test]
    fn custom_has_no_canonical_params() {
        assert!(Preset::Custom.params().is_none());
    }

    #[test]
    fn cartoon_values() {
        let params = Preset::Cartoon.params().unwrap();
        assert_eq!(params.n_segments, 100);
        assert_eq!(params.n_colors, 8);
        assert!((params.compactness - 20.0).abs() < f32::EPSILON);
        assert!((params.edge_enhancement - 0.8).abs() < f32::EPSILON);
        assert!((params.smoothing_factor - 0.7).abs() < f32::EPSILON);
        // Unlisted fields keep their defaults.
        assert!((params.sigma - SegmentationParams::DEFAULT_SIGMA).abs() < f32::EPSILON);
    }

    #[test]
    fn presets_are_fresh_values() {
        let mut edited = Preset::Painterly.params().unwrap();
        edited.n_colors = 3;
        assert_eq!(Preset::Painterly.params().unwrap().n_colors, 12);
    }

    #[test]
    fn preset_parses_case_insensitively() {
        assert_eq!("cartoon".parse::<Preset>().unwrap(), Preset::Cartoon);
        assert_eq!("ABSTRACT".parse::<Preset>().unwrap(), Preset::Abstract);
        assert!("watercolor".parse::<Preset>().is_err());
    }

    #[test]
    fn zero_segments_rejected() {
        let params = SegmentationParams {
            n_segments: 0,
            ..SegmentationParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_colors_rejected() {
        let params = SegmentationParams {
            n_colors: 0,
            ..SegmentationParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn too_many_colors_rejected() {
        let params = SegmentationParams {
            n_colors: MAX_COLORS + 1,
            ..SegmentationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn negative_sigma_rejected() {
        let params = SegmentationParams {
            sigma: -1.0,
            ..SegmentationParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("sigma"), "unexpected message: {err}");
    }

    #[test]
    fn nan_compactness_rejected() {
        let params = SegmentationParams {
            compactness: f32::NAN,
            ..SegmentationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn edge_weight_above_one_rejected() {
        let params = SegmentationParams {
            edge_weight: 1.5,
            ..SegmentationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn all_stages_disabled_is_valid() {
        let params = SegmentationParams {
            sigma: 0.0,
            edge_weight: 0.0,
            smoothing_factor: 0.0,
            edge_enhancement: 0.0,
            compactness: 0.0,
            ..SegmentationParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn params_serde_round_trip() {
        let params = SegmentationParams::abstract_art();
        let json = serde_json::to_string(&params).unwrap();
        let back: SegmentationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: SegmentationParams =
            serde_json::from_str(r#"{"n_colors": 4, "color_space": "hsv"}"#).unwrap();
        assert_eq!(params.n_colors, 4);
        assert_eq!(params.color_space, ColorSpace::Hsv);
        assert_eq!(params.n_segments, SegmentationParams::DEFAULT_N_SEGMENTS);
    }

    #[test]
    fn unknown_color_space_in_json_fails() {
        let result: Result<SegmentationParams, _> =
            serde_json::from_str(r#"{"color_space": "cmyk"}"#);
        assert!(result.is_err());
    }
}
