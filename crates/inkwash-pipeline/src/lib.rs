//! inkwash-pipeline: Pure image stylization pipeline (sans-IO).
//!
//! Turns a photograph into a simplified, cartoon-like rendition through:
//! color conversion -> pre-blur -> superpixel segmentation -> per-segment
//! averaging -> palette quantization -> edge blending -> edge-preserving
//! smoothing -> sharpening.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! [`RgbImage`] buffers. Decoding and encoding files lives in
//! `inkwash-io`.

pub mod average;
pub mod blur;
pub mod color;
pub mod diagnostics;
pub mod edge;
pub mod enhance;
pub mod grayscale;
pub mod operation;
pub mod params;
pub mod pipeline;
pub mod quantize;
pub mod segment;
pub mod session;
pub mod smooth;
pub mod types;

pub use edge::EdgeMask;
pub use operation::Operation;
pub use params::{Preset, SegmentationParams};
pub use pipeline::Stylization;
pub use segment::SegmentLabeling;
pub use session::Session;
pub use types::{ColorSpace, Dimensions, GrayImage, PipelineError, RgbImage};

/// Smallest palette accepted by [`quantize_only`].
pub const QUANTIZE_ONLY_MIN_COLORS: u32 = 2;

/// Largest palette accepted by [`quantize_only`].
pub const QUANTIZE_ONLY_MAX_COLORS: u32 = 16;

/// Run the full stylization pipeline.
///
/// # Pipeline steps
///
/// 1. Convert a working copy to `params.color_space`
/// 2. Gaussian pre-blur (skipped when `sigma == 0`)
/// 3. SLIC superpixel segmentation of the working copy
/// 4. Fill every segment with its mean color from the original
/// 5. K-means palette quantization to `params.n_colors`
/// 6. Blend original edges back in (skipped when `edge_weight == 0`)
/// 7. Edge-preserving smoothing (skipped when `smoothing_factor == 0`)
/// 8. Unsharp-mask sharpening (skipped when `edge_enhancement == 0`)
///
/// The output has the dimensions of `image`, which is not modified.
///
/// # Errors
///
/// Returns [`PipelineError::NoImageLoaded`] for a zero-area image and
/// [`PipelineError::InvalidParameter`] for an invalid parameter record.
/// Stage failures abort the run and are returned unchanged.
pub fn run_stylization(
    image: &RgbImage,
    params: &SegmentationParams,
) -> Result<RgbImage, PipelineError> {
    let done = Stylization::new(image.clone(), params.clone())?
        .convert()
        .pre_blur()
        .segment()?
        .average()?
        .quantize()?
        .blend_edges()?
        .smooth()?
        .enhance()?;
    Ok(done.into_image())
}

/// Palette-reduce the raw image, bypassing segmentation and smoothing.
///
/// Clustering uses [`quantize::DEFAULT_SEED`], so the same image and
/// palette size always produce the same result.
///
/// # Errors
///
/// Returns [`PipelineError::NoImageLoaded`] for a zero-area image and
/// [`PipelineError::InvalidParameter`] if `n_colors` is outside
/// [`QUANTIZE_ONLY_MIN_COLORS`]`..=`[`QUANTIZE_ONLY_MAX_COLORS`].
pub fn quantize_only(image: &RgbImage, n_colors: u32) -> Result<RgbImage, PipelineError> {
    ensure_loaded(image)?;
    if !(QUANTIZE_ONLY_MIN_COLORS..=QUANTIZE_ONLY_MAX_COLORS).contains(&n_colors) {
        return Err(PipelineError::InvalidParameter(format!(
            "n_colors must be between {QUANTIZE_ONLY_MIN_COLORS} and {QUANTIZE_ONLY_MAX_COLORS}, got {n_colors}"
        )));
    }
    quantize::quantize(image, n_colors, quantize::DEFAULT_SEED)
}

/// Convert to grayscale, replicated to three channels.
///
/// # Errors
///
/// Returns [`PipelineError::NoImageLoaded`] for a zero-area image.
pub fn grayscale(image: &RgbImage) -> Result<RgbImage, PipelineError> {
    ensure_loaded(image)?;
    Ok(grayscale::grayscale(image))
}

fn ensure_loaded(image: &RgbImage) -> Result<(), PipelineError> {
    if Dimensions::of(image).is_empty() {
        Err(PipelineError::NoImageLoaded)
    } else {
        Ok(())
    }
}
