//! Incremental stylization: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! [`crate::run_stylization`] runs the whole chain in one call.
//! [`Stylization`] lets the caller drive it one step at a time:
//!
//! ```rust
//! # use inkwash_pipeline::{PipelineError, RgbImage, SegmentationParams, Stylization};
//! # fn run(photo: RgbImage) -> Result<RgbImage, PipelineError> {
//! let params = SegmentationParams::cartoon();
//! let done = Stylization::new(photo, params)?
//!     .convert()
//!     .pre_blur()
//!     .segment()?
//!     .average()?
//!     .quantize()?
//!     .blend_edges()?
//!     .smooth()?
//!     .enhance()?;
//! Ok(done.into_image())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state. The
//! untouched original travels along until edge blending, the last stage
//! that reads it. Conditional stages (pre-blur, edge blend, smooth,
//! enhance) are skipped outright when their strength parameter is zero:
//! the image is moved through untouched and `applied()` reports `false`.

use crate::diagnostics::StageMetrics;
use crate::edge::EdgeMask;
use crate::params::SegmentationParams;
use crate::segment::SegmentLabeling;
use crate::types::{ColorSpace, Dimensions, PipelineError, RgbImage};

/// Entry point for the stage-by-stage API.
pub struct Stylization;

impl Stylization {
    /// Validate the inputs and create the [`Pending`] state.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoImageLoaded`] if the image has zero
    /// area, or [`PipelineError::InvalidParameter`] if `params` fails
    /// [`SegmentationParams::validate`].
    #[allow(clippy::new_ret_no_self)]
    pub fn new(original: RgbImage, params: SegmentationParams) -> Result<Pending, PipelineError> {
        if Dimensions::of(&original).is_empty() {
            return Err(PipelineError::NoImageLoaded);
        }
        params.validate()?;
        Ok(Pending { params, original })
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Inputs accepted, nothing computed yet.
#[must_use = "pipeline stages are consumed by advancing — call .convert() to continue"]
pub struct Pending {
    params: SegmentationParams,
    original: RgbImage,
}

impl Pending {
    /// The source image.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// The parameters this run uses.
    #[must_use]
    pub const fn params(&self) -> &SegmentationParams {
        &self.params
    }

    /// Convert a working copy into `params.color_space`.
    pub fn convert(self) -> Converted {
        let working = crate::color::convert(&self.original, ColorSpace::Rgb, self.params.color_space);
        Converted {
            params: self.params,
            original: self.original,
            working,
        }
    }
}

// ───────────────────────── Stage 1: Converted ────────────────────────

/// Working copy converted to the segmentation color space.
#[must_use = "pipeline stages are consumed by advancing — call .pre_blur() to continue"]
pub struct Converted {
    params: SegmentationParams,
    original: RgbImage,
    working: RgbImage,
}

impl Converted {
    /// The converted working image.
    #[must_use]
    pub const fn working(&self) -> &RgbImage {
        &self.working
    }

    /// Blur the working copy by `params.sigma`; skipped when it is zero.
    pub fn pre_blur(self) -> PreBlurred {
        let applied = self.params.sigma > 0.0;
        let working = if applied {
            crate::blur::gaussian_blur_rgb(&self.working, self.params.sigma)
        } else {
            self.working
        };
        PreBlurred {
            params: self.params,
            original: self.original,
            working,
            applied,
        }
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Convert {
            color_space: self.params.color_space,
            width: self.working.width(),
            height: self.working.height(),
        }
    }
}

// ───────────────────────── Stage 2: PreBlurred ───────────────────────

/// Working copy after the optional pre-segmentation blur.
#[must_use = "pipeline stages are consumed by advancing — call .segment() to continue"]
pub struct PreBlurred {
    params: SegmentationParams,
    original: RgbImage,
    working: RgbImage,
    applied: bool,
}

impl PreBlurred {
    /// The (possibly blurred) working image.
    #[must_use]
    pub const fn working(&self) -> &RgbImage {
        &self.working
    }

    /// Whether the blur ran.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Partition the working copy into superpixels.
    ///
    /// The segmenter applies its own `sigma` blur on top of the
    /// pre-blur, so a non-zero sigma smooths twice.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::segment::segment`] errors.
    pub fn segment(self) -> Result<Segmented, PipelineError> {
        let labeling = crate::segment::segment(
            &self.working,
            self.params.n_segments,
            self.params.compactness,
            self.params.sigma,
        )?;
        Ok(Segmented {
            params: self.params,
            original: self.original,
            labeling,
        })
    }

    /// Metrics for this stage, or `None` when it was skipped.
    #[must_use]
    pub const fn metrics(&self) -> Option<StageMetrics> {
        if self.applied {
            Some(StageMetrics::PreBlur {
                sigma: self.params.sigma,
            })
        } else {
            None
        }
    }
}

// ───────────────────────── Stage 3: Segmented ────────────────────────

/// Superpixel labeling of the working copy.
#[must_use = "pipeline stages are consumed by advancing — call .average() to continue"]
pub struct Segmented {
    params: SegmentationParams,
    original: RgbImage,
    labeling: SegmentLabeling,
}

impl Segmented {
    /// The segment labeling.
    #[must_use]
    pub const fn labeling(&self) -> &SegmentLabeling {
        &self.labeling
    }

    /// Fill every segment with its mean color from the original image.
    /// The labeling is dropped afterwards.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::average::average`] errors.
    pub fn average(self) -> Result<Averaged, PipelineError> {
        let image = crate::average::average(&self.original, &self.labeling)?;
        Ok(Averaged {
            params: self.params,
            original: self.original,
            image,
            segment_count: self.labeling.segment_count(),
        })
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        let sizes = self.labeling.segment_sizes();
        StageMetrics::Segment {
            requested: self.params.n_segments,
            compactness: self.params.compactness,
            segment_count: self.labeling.segment_count(),
            min_segment_pixels: sizes.iter().copied().min().unwrap_or(0),
            max_segment_pixels: sizes.iter().copied().max().unwrap_or(0),
        }
    }
}

// ───────────────────────── Stage 4: Averaged ─────────────────────────

/// Image with each segment flattened to its mean color.
#[must_use = "pipeline stages are consumed by advancing — call .quantize() to continue"]
pub struct Averaged {
    params: SegmentationParams,
    original: RgbImage,
    image: RgbImage,
    segment_count: u32,
}

impl Averaged {
    /// The averaged image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Number of segments that were averaged.
    #[must_use]
    pub const fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Reduce the averaged image to `params.n_colors` colors.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::quantize::quantize`] errors.
    pub fn quantize(self) -> Result<Quantized, PipelineError> {
        let image = crate::quantize::quantize(&self.image, self.params.n_colors, self.params.seed)?;
        Ok(Quantized {
            params: self.params,
            original: self.original,
            image,
            segment_count: self.segment_count,
        })
    }

    /// Metrics for this stage.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Average {
            segment_count: self.segment_count,
        }
    }
}

// ───────────────────────── Stage 5: Quantized ────────────────────────

/// Image reduced to the target palette.
#[must_use = "pipeline stages are consumed by advancing — call .blend_edges() to continue"]
pub struct Quantized {
    params: SegmentationParams,
    original: RgbImage,
    image: RgbImage,
    segment_count: u32,
}

impl Quantized {
    /// The quantized image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Detect edges in the original and mix it back in along them.
    /// Skipped (no detection either) when `params.edge_weight` is zero.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::edge::blend`] errors.
    pub fn blend_edges(self) -> Result<EdgesBlended, PipelineError> {
        let (image, mask) = if self.params.edge_weight > 0.0 {
            let mask = crate::edge::detect_edges(&self.original);
            let blended =
                crate::edge::blend(&self.original, &self.image, &mask, self.params.edge_weight)?;
            (blended, Some(mask))
        } else {
            (self.image, None)
        };
        Ok(EdgesBlended {
            params: self.params,
            image,
            mask,
            segment_count: self.segment_count,
        })
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Quantize {
            n_colors: self.params.n_colors,
            output_colors: crate::quantize::count_distinct_colors(&self.image),
        }
    }
}

// ───────────────────────── Stage 6: EdgesBlended ─────────────────────

/// Image after the optional edge blend.
#[must_use = "pipeline stages are consumed by advancing — call .smooth() to continue"]
pub struct EdgesBlended {
    params: SegmentationParams,
    image: RgbImage,
    mask: Option<EdgeMask>,
    segment_count: u32,
}

impl EdgesBlended {
    /// The current image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// The edge mask, if blending ran.
    #[must_use]
    pub const fn mask(&self) -> Option<&EdgeMask> {
        self.mask.as_ref()
    }

    /// Whether blending ran.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.mask.is_some()
    }

    /// Edge-preserving smoothing; skipped when `params.smoothing_factor`
    /// is zero.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::smooth::smooth`] errors.
    pub fn smooth(self) -> Result<Smoothed, PipelineError> {
        let applied = self.params.smoothing_factor > 0.0;
        let image = if applied {
            crate::smooth::smooth(&self.image, self.params.smoothing_factor)?
        } else {
            self.image
        };
        Ok(Smoothed {
            params: self.params,
            image,
            applied,
            segment_count: self.segment_count,
        })
    }

    /// Metrics for this stage, or `None` when it was skipped.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        self.mask.as_ref().map(|mask| StageMetrics::EdgeBlend {
            edge_weight: self.params.edge_weight,
            edge_pixel_count: mask.edge_count(),
            total_pixel_count: Dimensions::of(&self.image).pixel_count(),
        })
    }
}

// ───────────────────────── Stage 7: Smoothed ─────────────────────────

/// Image after the optional edge-preserving smoothing.
#[must_use = "pipeline stages are consumed by advancing — call .enhance() to continue"]
pub struct Smoothed {
    params: SegmentationParams,
    image: RgbImage,
    applied: bool,
    segment_count: u32,
}

impl Smoothed {
    /// The current image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Whether smoothing ran.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Unsharp-mask sharpening; skipped when `params.edge_enhancement`
    /// is zero.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::enhance::enhance`] errors.
    pub fn enhance(self) -> Result<Enhanced, PipelineError> {
        let applied = self.params.edge_enhancement > 0.0;
        let image = if applied {
            crate::enhance::enhance(&self.image, self.params.edge_enhancement)?
        } else {
            self.image
        };
        Ok(Enhanced {
            params: self.params,
            image,
            applied,
            segment_count: self.segment_count,
        })
    }

    /// Metrics for this stage, or `None` when it was skipped.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        self.applied.then(|| StageMetrics::Smooth {
            smoothing_factor: self.params.smoothing_factor,
            sigma_spatial: (crate::smooth::MAX_SIGMA_SPATIAL * self.params.smoothing_factor)
                .trunc(),
        })
    }
}

// ───────────────────────── Stage 8: Enhanced ─────────────────────────

/// Final state: the stylized image.
#[must_use = "call .into_image() to take the stylized image"]
pub struct Enhanced {
    params: SegmentationParams,
    image: RgbImage,
    applied: bool,
    segment_count: u32,
}

impl Enhanced {
    /// The stylized image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Whether sharpening ran.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Number of superpixels the image was built from.
    #[must_use]
    pub const fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Metrics for this stage, or `None` when it was skipped.
    #[must_use]
    pub const fn metrics(&self) -> Option<StageMetrics> {
        if self.applied {
            Some(StageMetrics::Enhance {
                strength: self.params.edge_enhancement,
            })
        } else {
            None
        }
    }

    /// Consume the pipeline and return the stylized image.
    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}
