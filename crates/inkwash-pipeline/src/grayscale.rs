//! Grayscale conversion.
//!
//! [`luma`] produces the single-channel image the edge detector works
//! on; [`grayscale`] replicates it back to three channels so the result
//! can flow through the rest of the pipeline as an [`RgbImage`].

use crate::types::{GrayImage, RgbImage};

/// Single-channel luma of an RGB image.
///
/// Uses the `image` crate's integer Rec. 709 weights, which sum to one,
/// so a pixel whose three channels are equal maps to that same value.
#[must_use = "returns the luma image"]
pub fn luma(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Convert to gray and replicate the luma into all three channels.
///
/// Idempotent: `grayscale(&grayscale(img)) == grayscale(img)`.
#[must_use = "returns the grayscale image"]
pub fn grayscale(image: &RgbImage) -> RgbImage {
    let gray = luma(image);
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        image::Rgb([v, v, v])
    })
}
