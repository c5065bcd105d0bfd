//! Edge detection on the original image and edge-weighted blending.
//!
//! [`detect_edges`] runs [`imageproc::edges::canny`] on the luma of the
//! original photo, then widens the result by one dilation pass so the
//! edges survive the color shifts introduced by quantization.
//! [`blend`] mixes original pixels back in wherever the mask is set.

use imageproc::distance_transform::Norm;

use crate::grayscale::luma;
use crate::params::validate_unit;
use crate::types::{PipelineError, RgbImage};

/// Canny low (hysteresis) threshold.
pub const CANNY_LOW: f32 = 100.0;

/// Canny high (definite edge) threshold.
pub const CANNY_HIGH: f32 = 200.0;

/// Dilation radius in pixels (L∞, so a 3×3 structuring element).
pub const DILATION_RADIUS: u8 = 1;

/// Boolean edge map with the dimensions of the image it was detected on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMask {
    width: u32,
    height: u32,
    edges: Vec<bool>,
}

impl EdgeMask {
    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at `(x, y)` lies on an edge.
    #[must_use]
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.edges[y as usize * self.width as usize + x as usize]
    }

    /// Number of edge pixels.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|&&e| e).count()
    }
}

/// Detect edges in `original`.
///
/// Canny with [`CANNY_LOW`]/[`CANNY_HIGH`] on the luma, followed by a
/// dilation of [`DILATION_RADIUS`].
#[must_use = "returns the edge mask"]
pub fn detect_edges(original: &RgbImage) -> EdgeMask {
    let (width, height) = original.dimensions();
    if width == 0 || height == 0 {
        return EdgeMask {
            width,
            height,
            edges: Vec::new(),
        };
    }

    let edges = imageproc::edges::canny(&luma(original), CANNY_LOW, CANNY_HIGH);
    let dilated = imageproc::morphology::dilate(&edges, Norm::LInf, DILATION_RADIUS);

    EdgeMask {
        width,
        height,
        edges: dilated.pixels().map(|p| p.0[0] > 0).collect(),
    }
}

/// Mix `original` into `quantized` on edge pixels.
///
/// Masked pixels become `original * edge_weight + quantized * (1 -
/// edge_weight)`, rounded; the rest are copied from `quantized`.
/// `edge_weight == 0` returns `quantized` unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `edge_weight` is
/// outside `[0, 1]` or the three inputs differ in size.
pub fn blend(
    original: &RgbImage,
    quantized: &RgbImage,
    mask: &EdgeMask,
    edge_weight: f32,
) -> Result<RgbImage, PipelineError> {
    validate_unit("edge_weight", edge_weight)?;

    let dims = quantized.dimensions();
    if original.dimensions() != dims || (mask.width, mask.height) != dims {
        return Err(PipelineError::InvalidParameter(format!(
            "blend inputs differ in size: original {:?}, quantized {dims:?}, mask {:?}",
            original.dimensions(),
            (mask.width, mask.height),
        )));
    }

    if edge_weight == 0.0 {
        return Ok(quantized.clone());
    }

    let keep = 1.0 - edge_weight;
    let mut out = quantized.clone();
    for ((pixel, source), &is_edge) in out.pixels_mut().zip(original.pixels()).zip(&mask.edges) {
        if !is_edge {
            continue;
        }
        for (q, &o) in pixel.0.iter_mut().zip(&source.0) {
            *q = crate::color::quantize_channel(
                f32::from(o).mul_add(edge_weight, f32::from(*q) * keep),
            );
        }
    }
    Ok(out)
}
