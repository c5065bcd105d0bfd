//! Superpixel segmentation (SLIC).
//!
//! Partitions an image into roughly `n_segments` regions that are
//! compact in pixel space and coherent in color space.
//!
//! # Algorithm
//!
//! 1. Optional Gaussian blur (`sigma`) to reduce noise sensitivity.
//! 2. Channels are scaled to `0..=100` so `compactness` has the same
//!    meaning whatever color space the caller converted to.
//! 3. Cluster centers are seeded on a regular grid with step
//!    `S = sqrt(pixels / n_segments)`.
//! 4. Assign/update iterations: every center claims pixels within a
//!    `±S` window by `(1 - c / MAX) · color² + (c / S)² · spatial²`, where
//!    `c` is `compactness` and `MAX` is [`MAX_COMPACTNESS`], then moves
//!    to the mean of its pixels. Stops when no label changes or after
//!    [`MAX_ITERATIONS`]. At `MAX` and above color is ignored and the
//!    regions are the seed grid's cells.
//! 5. Connectivity enforcement: each 4-connected piece becomes its own
//!    region; pieces smaller than half the expected region size are
//!    absorbed by a neighbor.
//! 6. Adjacent regions that are each a single flat color, and the same
//!    color, are merged, so a uniform image collapses to a single region.
//!    Textured regions are never merged.
//!
//! Labels in the result are contiguous, numbered in row-major order of
//! first appearance.

use crate::params::{MAX_COMPACTNESS, validate_non_negative};
use crate::types::{PipelineError, RgbImage};

/// Upper bound on assign/update iterations.
pub const MAX_ITERATIONS: usize = 10;

/// Connected pieces smaller than this fraction of the expected region
/// size are absorbed by a neighbor.
const MIN_SIZE_FACTOR: f32 = 0.5;

/// Channel spread (on the `0..=100` scale) below which a region counts
/// as flat, and mean difference below which two flat regions merge.
const MERGE_TOLERANCE: f32 = 1e-3;

/// Scales 8-bit channels to `0..=100`.
const CHANNEL_SCALE: f32 = 100.0 / 255.0;

/// Per-pixel segment ids produced by [`segment`].
///
/// Every id is in `0..segment_count`. Dimensions match the segmented
/// image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLabeling {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    segment_count: u32,
}

impl SegmentLabeling {
    /// Build a labeling from raw row-major ids.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidLabeling`] if `labels` does not
    /// hold exactly `width * height` entries or any id is not below
    /// `segment_count`.
    pub fn new(
        width: u32,
        height: u32,
        labels: Vec<u32>,
        segment_count: u32,
    ) -> Result<Self, PipelineError> {
        let expected = width as usize * height as usize;
        if labels.len() != expected {
            return Err(PipelineError::InvalidLabeling(format!(
                "expected {expected} labels for {width}x{height}, got {}",
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&id| id >= segment_count) {
            return Err(PipelineError::InvalidLabeling(format!(
                "label {bad} is out of range for {segment_count} segments"
            )));
        }
        Ok(Self {
            width,
            height,
            labels,
            segment_count,
        })
    }

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

    /// Number of distinct segment ids.
    #[must_use]
    pub const fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Segment id of the pixel at `(x, y)`.
    #[must_use]
    pub fn label(&self, x: u32, y: u32) -> u32 {
        self.labels[y as usize * self.width as usize + x as usize]
    }

    /// All ids in row-major order.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Pixel count of every segment, indexed by id.
    #[must_use]
    pub fn segment_sizes(&self) -> Vec<u64> {
        let mut sizes = vec![0u64; self.segment_count as usize];
        for &id in &self.labels {
            sizes[id as usize] += 1;
        }
        sizes
    }
}

struct Center {
    color: [f32; 3],
    x: f32,
    y: f32,
}

/// Partition `image` into superpixels.
///
/// The image is segmented in whatever color space it is already in.
/// The number of segments produced may be lower than `n_segments`
/// (small or uniform images, merged regions); that is not an error.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `n_segments` is zero
/// or `compactness`/`sigma` are negative or not finite.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn segment(
    image: &RgbImage,
    n_segments: u32,
    compactness: f32,
    sigma: f32,
) -> Result<SegmentLabeling, PipelineError> {
    if n_segments == 0 {
        return Err(PipelineError::InvalidParameter(
            "n_segments must be at least 1".to_string(),
        ));
    }
    validate_non_negative("compactness", compactness)?;
    validate_non_negative("sigma", sigma)?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return SegmentLabeling::new(width, height, Vec::new(), 0);
    }
    let (w, h) = (width as usize, height as usize);
    let pixel_count = w * h;

    let smoothed = crate::blur::gaussian_blur_rgb(image, sigma);
    let features: Vec<[f32; 3]> = smoothed
        .pixels()
        .map(|p| p.0.map(|c| f32::from(c) * CHANNEL_SCALE))
        .collect();

    let expected_size = pixel_count as f32 / n_segments as f32;
    let step = (expected_size.sqrt().round() as usize).max(1);

    let xs = grid_positions(w, step);
    let ys = grid_positions(h, step);
    let mut centers: Vec<Center> = ys
        .iter()
        .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
        .map(|(x, y)| Center {
            color: features[y * w + x],
            x: x as f32,
            y: y as f32,
        })
        .collect();

    // Start from the grid cell each pixel falls in, so pixels no window
    // reaches still carry a valid label.
    let mut labels: Vec<u32> = (0..pixel_count)
        .map(|i| {
            let col = ((i % w) / step).min(xs.len() - 1);
            let row = ((i / w) / step).min(ys.len() - 1);
            (row * xs.len() + col) as u32
        })
        .collect();

    let color_weight = (1.0 - compactness / MAX_COMPACTNESS).max(0.0);
    let spatial_weight = (compactness / step as f32).powi(2);
    let mut distances = vec![f32::MAX; pixel_count];

    for _ in 0..MAX_ITERATIONS {
        distances.fill(f32::MAX);
        let mut changed = false;

        for (id, center) in centers.iter().enumerate() {
            let cx = center.x.round() as usize;
            let cy = center.y.round() as usize;
            let x_range = cx.saturating_sub(step)..(cx + step + 1).min(w);
            let y_range = cy.saturating_sub(step)..(cy + step + 1).min(h);

            for y in y_range {
                let dy = y as f32 - center.y;
                let row = y * w;
                for x in x_range.clone() {
                    let idx = row + x;
                    let dx = x as f32 - center.x;
                    let d = color_weight.mul_add(
                        color_distance_sq(features[idx], center.color),
                        spatial_weight * dx.mul_add(dx, dy * dy),
                    );
                    if d < distances[idx] {
                        distances[idx] = d;
                        if labels[idx] != id as u32 {
                            labels[idx] = id as u32;
                            changed = true;
                        }
                    }
                }
            }
        }

        update_centers(&mut centers, &labels, &features, w);

        if !changed {
            break;
        }
    }

    let min_size = (MIN_SIZE_FACTOR * expected_size) as usize;
    let (connected, count) = enforce_connectivity(&labels, &features, w, h, min_size);
    let (merged, count) = merge_uniform_regions(&connected, count, &features, w, h);

    SegmentLabeling::new(width, height, merged, count)
}

/// Grid seed coordinates along one axis: `step/2, step/2 + step, ...`,
/// or the midpoint when the axis is shorter than half a step.
fn grid_positions(len: usize, step: usize) -> Vec<usize> {
    let positions: Vec<usize> = (step / 2..len).step_by(step).collect();
    if positions.is_empty() {
        vec![len / 2]
    } else {
        positions
    }
}

fn color_distance_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0.mul_add(d0, d1.mul_add(d1, d2 * d2))
}

/// Move every center to the mean color and position of its pixels.
/// Centers that lost all their pixels stay where they are.
#[allow(clippy::cast_precision_loss)]
fn update_centers(centers: &mut [Center], labels: &[u32], features: &[[f32; 3]], width: usize) {
    let mut sums = vec![[0.0f64; 5]; centers.len()];
    let mut counts = vec![0u64; centers.len()];

    for (idx, (&id, color)) in labels.iter().zip(features).enumerate() {
        let sum = &mut sums[id as usize];
        sum[0] += f64::from(color[0]);
        sum[1] += f64::from(color[1]);
        sum[2] += f64::from(color[2]);
        sum[3] += (idx % width) as f64;
        sum[4] += (idx / width) as f64;
        counts[id as usize] += 1;
    }

    for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
        if count == 0 {
            continue;
        }
        let n = count as f64;
        #[allow(clippy::cast_possible_truncation)]
        {
            center.color = [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32];
            center.x = (sum[3] / n) as f32;
            center.y = (sum[4] / n) as f32;
        }
    }
}

/// 4-connected neighbors of a row-major index.
fn neighbors(index: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
    let (x, y) = (index % width, index / width);
    [
        (x > 0).then(|| index - 1),
        (x + 1 < width).then(|| index + 1),
        (y > 0).then(|| index - width),
        (y + 1 < height).then(|| index + width),
    ]
    .into_iter()
    .flatten()
}

/// Relabel so every region is a single 4-connected piece.
///
/// Pieces smaller than `min_size` take the label of the already
/// relabeled neighbor pixel closest in color to the piece's mean.
/// Returns the new labels and their count.
fn enforce_connectivity(
    labels: &[u32],
    features: &[[f32; 3]],
    width: usize,
    height: usize,
    min_size: usize,
) -> (Vec<u32>, u32) {
    const UNSET: u32 = u32::MAX;

    let mut out = vec![UNSET; labels.len()];
    let mut next = 0u32;
    let mut piece: Vec<usize> = Vec::new();

    for start in 0..labels.len() {
        if out[start] != UNSET {
            continue;
        }

        let original = labels[start];
        piece.clear();
        piece.push(start);
        out[start] = next;
        let mut head = 0;
        while head < piece.len() {
            let idx = piece[head];
            head += 1;
            for n in neighbors(idx, width, height) {
                if out[n] == UNSET && labels[n] == original {
                    out[n] = next;
                    piece.push(n);
                }
            }
        }

        let absorb_into = if piece.len() < min_size {
            let mean = mean_feature(&piece, features);
            piece
                .iter()
                .flat_map(|&idx| neighbors(idx, width, height))
                .filter(|&n| out[n] != UNSET && out[n] != next)
                .min_by(|&a, &b| {
                    color_distance_sq(features[a], mean)
                        .total_cmp(&color_distance_sq(features[b], mean))
                })
                .map(|n| out[n])
        } else {
            None
        };

        match absorb_into {
            Some(label) => {
                for &idx in &piece {
                    out[idx] = label;
                }
            }
            None => next += 1,
        }
    }

    (out, next)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn mean_feature(pixels: &[usize], features: &[[f32; 3]]) -> [f32; 3] {
    let mut sum = [0.0f64; 3];
    for &idx in pixels {
        for (s, &c) in sum.iter_mut().zip(&features[idx]) {
            *s += f64::from(c);
        }
    }
    let n = pixels.len().max(1) as f64;
    sum.map(|s| (s / n) as f32)
}

/// Merge adjacent flat regions of equal color, then renumber in
/// row-major order of first appearance.
///
/// A region is flat when every channel's spread is within
/// [`MERGE_TOLERANCE`]. Two textured regions can share a mean (cells of
/// a checkerboard do) and must stay apart.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn merge_uniform_regions(
    labels: &[u32],
    count: u32,
    features: &[[f32; 3]],
    width: usize,
    height: usize,
) -> (Vec<u32>, u32) {
    let regions = count as usize;
    let mut sums = vec![[0.0f64; 3]; regions];
    let mut sizes = vec![0u64; regions];
    let mut lows = vec![[f32::MAX; 3]; regions];
    let mut highs = vec![[f32::MIN; 3]; regions];
    for (&id, color) in labels.iter().zip(features) {
        let id = id as usize;
        for (s, &c) in sums[id].iter_mut().zip(color) {
            *s += f64::from(c);
        }
        for ((lo, hi), &c) in lows[id].iter_mut().zip(&mut highs[id]).zip(color) {
            *lo = lo.min(c);
            *hi = hi.max(c);
        }
        sizes[id] += 1;
    }
    let flat: Vec<bool> = lows
        .iter()
        .zip(&highs)
        .map(|(lo, hi)| lo.iter().zip(hi).all(|(l, h)| h - l < MERGE_TOLERANCE))
        .collect();
    let means: Vec<[f32; 3]> = sums
        .iter()
        .zip(&sizes)
        .map(|(sum, &size)| {
            let n = size.max(1) as f64;
            [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32]
        })
        .collect();

    let mut parent: Vec<u32> = (0..count).collect();
    let tolerance_sq = MERGE_TOLERANCE * MERGE_TOLERANCE;
    for (idx, &a) in labels.iter().enumerate() {
        let right = (idx % width + 1 < width).then(|| idx + 1);
        let down = (idx / width + 1 < height).then(|| idx + width);
        for n in [right, down].into_iter().flatten() {
            let b = labels[n];
            if a != b
                && flat[a as usize]
                && flat[b as usize]
                && color_distance_sq(means[a as usize], means[b as usize]) < tolerance_sq
            {
                join(&mut parent, a, b);
            }
        }
    }

    let mut renumber = vec![u32::MAX; regions];
    let mut next = 0u32;
    let merged = labels
        .iter()
        .map(|&id| {
            let root = find(&mut parent, id) as usize;
            if renumber[root] == u32::MAX {
                renumber[root] = next;
                next += 1;
            }
            renumber[root]
        })
        .collect();

    (merged, next)
}

fn find(parent: &mut [u32], mut node: u32) -> u32 {
    while parent[node as usize] != node {
        let grandparent = parent[parent[node as usize] as usize];
        parent[node as usize] = grandparent;
        node = grandparent;
    }
    node
}

/// Union by smaller root id.
fn join(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra < rb {
        parent[rb as usize] = ra;
    } else if rb < ra {
        parent[ra as usize] = rb;
    }
}
