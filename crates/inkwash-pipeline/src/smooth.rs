//! Edge-preserving smoothing with a domain-transform recursive filter.
//!
//! The filter (Gastal & Oliveira, "Domain Transform for Edge-Aware Image
//! and Video Processing", 2011) runs a first-order recursive blur along
//! rows and columns. The feedback coefficient between two neighbors is
//! `a^d`, where `d` grows with the color difference between them, so
//! smoothing decays sharply across strong edges and stays flat within
//! regions.

use crate::color::quantize_channel;
use crate::params::validate_unit;
use crate::types::{PipelineError, RgbImage};

/// Spatial sigma at `smoothing_factor == 1`.
pub const MAX_SIGMA_SPATIAL: f32 = 60.0;

/// Range sigma on the `0..=1` channel scale.
pub const SIGMA_RANGE: f32 = 0.4;

/// Horizontal + vertical pass pairs.
pub const ITERATIONS: u32 = 3;

/// Smooth `image` while preserving edges.
///
/// The spatial sigma is `trunc(MAX_SIGMA_SPATIAL * smoothing_factor)`.
/// A factor of zero, or one small enough that the sigma truncates to
/// zero, returns the image unchanged without running the filter.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `smoothing_factor` is
/// outside `[0, 1]`.
pub fn smooth(image: &RgbImage, smoothing_factor: f32) -> Result<RgbImage, PipelineError> {
    validate_unit("smoothing_factor", smoothing_factor)?;

    let sigma_s = (MAX_SIGMA_SPATIAL * smoothing_factor).trunc();
    let (width, height) = image.dimensions();
    if sigma_s == 0.0 || width == 0 || height == 0 {
        return Ok(image.clone());
    }

    Ok(recursive_filter(image, sigma_s, SIGMA_RANGE, ITERATIONS))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
fn recursive_filter(image: &RgbImage, sigma_s: f32, sigma_r: f32, iterations: u32) -> RgbImage {
    let w = image.width() as usize;
    let h = image.height() as usize;

    let mut data: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| p.0.map(|c| f32::from(c) / 255.0))
        .collect();

    // Domain-transform derivatives from the unfiltered input:
    // `dx[i]` couples pixel i with its left neighbor, `dy[i]` with the
    // one above. Entries in the first column/row are unused.
    let ratio = sigma_s / sigma_r;
    let mut dx = vec![1.0f32; w * h];
    let mut dy = vec![1.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if x > 0 {
                dx[i] = ratio.mul_add(abs_diff_sum(data[i], data[i - 1]), 1.0);
            }
            if y > 0 {
                dy[i] = ratio.mul_add(abs_diff_sum(data[i], data[i - w]), 1.0);
            }
        }
    }

    let n = iterations as i32;
    let normalizer = (4.0f32.powi(n) - 1.0).sqrt();
    for i in 0..n {
        let sigma_i = sigma_s * 3.0f32.sqrt() * 2.0f32.powi(n - (i + 1)) / normalizer;
        let a = (-std::f32::consts::SQRT_2 / sigma_i).exp();

        let vx: Vec<f32> = dx.iter().map(|&d| a.powf(d)).collect();
        let vy: Vec<f32> = dy.iter().map(|&d| a.powf(d)).collect();

        for y in 0..h {
            let row = y * w;
            for x in 1..w {
                feed(&mut data, row + x, row + x - 1, vx[row + x]);
            }
            for x in (0..w.saturating_sub(1)).rev() {
                feed(&mut data, row + x, row + x + 1, vx[row + x + 1]);
            }
        }

        for x in 0..w {
            for y in 1..h {
                let i = y * w + x;
                feed(&mut data, i, i - w, vy[i]);
            }
            for y in (0..h.saturating_sub(1)).rev() {
                let i = y * w + x;
                feed(&mut data, i, i + w, vy[i + w]);
            }
        }
    }

    let mut out = image.clone();
    for (pixel, value) in out.pixels_mut().zip(&data) {
        pixel.0 = value.map(|c| quantize_channel(c * 255.0));
    }
    out
}

/// `data[target] += v * (data[source] - data[target])` per channel.
fn feed(data: &mut [[f32; 3]], target: usize, source: usize, v: f32) {
    let from = data[source];
    for (t, s) in data[target].iter_mut().zip(from) {
        *t = v.mul_add(s - *t, *t);
    }
}

fn abs_diff_sum(a: [f32; 3], b: [f32; 3]) -> f32 {
    (a[0] - b[0]).abs() + (a[1] - b[1]).abs() + (a[2] - b[2]).abs()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checkerboard(low: u8, high: u8) -> RgbImage {
        RgbImage::from_fn(16, 16, |x, y| {
            let v = if (x + y) % 2 == 0 { low } else { high };
            image::Rgb([v, v, v])
        })
    }

    fn channel_spread(img: &RgbImage) -> u8 {
        let values = img.pixels().map(|p| p.0[0]);
        let max = values.clone().max().unwrap_or(0);
        let min = values.min().unwrap_or(0);
        max - min
    }

    #[test]
    fn zero_factor_is_identity() {
        let img = checkerboard(0, 255);
        assert_eq!(smooth(&img, 0.0).unwrap(), img);
    }

    #[test]
    fn tiny_factor_truncates_to_identity() {
        let img = checkerboard(0, 255);
        assert_eq!(smooth(&img, 0.01).unwrap(), img);
    }

    #[test]
    fn factor_out_of_range_rejected() {
        let img = checkerboard(0, 255);
        assert!(matches!(
            smooth(&img, 1.2),
            Err(PipelineError::InvalidParameter(_))
        ));
        assert!(matches!(
            smooth(&img, f32::NAN),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn uniform_image_unchanged() {
        let img = RgbImage::from_fn(12, 9, |_, _| image::Rgb([33, 144, 201]));
        assert_eq!(smooth(&img, 1.0).unwrap(), img);
    }

    #[test]
    fn low_contrast_texture_is_flattened() {
        let img = checkerboard(100, 110);
        let out = smooth(&img, 0.5).unwrap();
        let spread = channel_spread(&out);
        assert!(spread < 5, "expected texture to flatten, spread = {spread}");
    }

    #[test]
    fn strong_edge_is_preserved() {
        let img = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        let out = smooth(&img, 0.5).unwrap();
        for y in 0..10 {
            assert!(out.get_pixel(9, y).0[0] <= 2, "dark side bled at y = {y}");
            assert!(out.get_pixel(10, y).0[0] >= 253, "light side bled at y = {y}");
        }
    }

    #[test]
    fn dimensions_preserved() {
        let img = checkerboard(10, 20);
        assert_eq!(smooth(&img, 0.7).unwrap().dimensions(), (16, 16));
        let strip = RgbImage::new(1, 5);
        assert_eq!(smooth(&strip, 0.7).unwrap().dimensions(), (1, 5));
    }
}
