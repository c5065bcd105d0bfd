//! Gaussian blur for color images.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`], which only accepts a
//! single channel, by splitting the image into its three channels,
//! blurring each, and reassembling. Gaussian blur is linear and
//! per-channel, so the result is the same as blurring in color space.
//!
//! Used three times in the pipeline: the pre-segmentation blur, the
//! segmenter's own noise blur, and the blurred copy the edge enhancer
//! subtracts.

use image::GrayImage;

use crate::types::RgbImage;

/// Apply Gaussian blur to every channel of an RGB image.
///
/// Non-positive (or non-finite) sigma values return the image
/// unchanged, since `imageproc`'s underlying function panics on
/// `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_rgb(image: &RgbImage, sigma: f32) -> RgbImage {
    if !(sigma > 0.0 && sigma.is_finite()) {
        return image.clone();
    }

    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let channels: [GrayImage; 3] = std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    });

    let blurred: [GrayImage; 3] =
        std::array::from_fn(|c| imageproc::filter::gaussian_blur_f32(&channels[c], sigma));

    RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([
            blurred[0].get_pixel(x, y).0[0],
            blurred[1].get_pixel(x, y).0[0],
            blurred[2].get_pixel(x, y).0[0],
        ])
    })
}
