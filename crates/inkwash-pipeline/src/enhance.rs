//! Unsharp-mask sharpening.

use crate::blur::gaussian_blur_rgb;
use crate::color::quantize_channel;
use crate::params::validate_unit;
use crate::types::{PipelineError, RgbImage};

/// Sigma of the blurred copy subtracted from the image.
pub const BLUR_SIGMA: f32 = 3.0;

/// Sharpen `image` as `image * (1 + strength) - blurred * strength`,
/// rounded and clamped per channel.
///
/// `strength == 0` returns the image unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `strength` is outside
/// `[0, 1]`.
pub fn enhance(image: &RgbImage, strength: f32) -> Result<RgbImage, PipelineError> {
    validate_unit("edge_enhancement", strength)?;
    if strength == 0.0 {
        return Ok(image.clone());
    }

    let blurred = gaussian_blur_rgb(image, BLUR_SIGMA);
    let gain = 1.0 + strength;

    let mut out = image.clone();
    for (pixel, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for (c, &b) in pixel.0.iter_mut().zip(&soft.0) {
            *c = quantize_channel(f32::from(*c).mul_add(gain, -f32::from(b) * strength));
        }
    }
    Ok(out)
}
