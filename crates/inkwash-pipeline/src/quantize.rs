//! Palette quantization by k-means clustering.
//!
//! Pixels are treated as points in normalized RGB and clustered with
//! [`kmeans_colors::get_kmeans`]; each pixel is then replaced by its
//! cluster's centroid. Clustering is seeded, so the same image, palette
//! size, and seed always give the same output.

use std::collections::HashSet;

use kmeans_colors::{Kmeans, get_kmeans};
use palette::Srgb;

use crate::color::quantize_channel;
use crate::params::validate_n_colors;
use crate::types::{PipelineError, RgbImage};

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// Iteration cap for a single k-means run.
pub const MAX_ITERATIONS: usize = 100;

/// A run stops once centroids move less than this between iterations.
pub const CONVERGENCE: f32 = 1e-5;

/// Independent k-means runs (seeds `seed`, `seed + 1`, ...). The run
/// with the lowest score wins.
pub const RESTARTS: u64 = 10;

/// Reduce `image` to at most `n_colors` distinct colors.
///
/// Images that already have `n_colors` or fewer distinct colors are
/// returned unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `n_colors` is outside
/// `1..=255`.
pub fn quantize(image: &RgbImage, n_colors: u32, seed: u64) -> Result<RgbImage, PipelineError> {
    validate_n_colors(n_colors)?;

    if count_distinct_colors(image) <= n_colors as usize {
        return Ok(image.clone());
    }

    let points: Vec<Srgb<f32>> = image
        .pixels()
        .map(|p| Srgb::new(p.0[0], p.0[1], p.0[2]).into_format::<f32>())
        .collect();

    let best = (0..RESTARTS)
        .map(|run| {
            get_kmeans(
                n_colors as usize,
                MAX_ITERATIONS,
                CONVERGENCE,
                false,
                &points,
                seed.wrapping_add(run),
            )
        })
        .min_by(|a, b| a.score.total_cmp(&b.score));

    let Some(Kmeans {
        centroids, indices, ..
    }) = best
    else {
        return Ok(image.clone());
    };

    let palette: Vec<[u8; 3]> = centroids
        .iter()
        .map(|c| {
            [
                quantize_channel(c.red * 255.0),
                quantize_channel(c.green * 255.0),
                quantize_channel(c.blue * 255.0),
            ]
        })
        .collect();

    let mut out = image.clone();
    for (pixel, &index) in out.pixels_mut().zip(&indices) {
        pixel.0 = palette[usize::from(index)];
    }
    Ok(out)
}

/// Number of distinct RGB triples in `image`.
#[must_use]
pub fn count_distinct_colors(image: &RgbImage) -> usize {
    image.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}
