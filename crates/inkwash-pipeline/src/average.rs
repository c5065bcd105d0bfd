//! Per-region color averaging.
//!
//! Every pixel is replaced by the mean color of its segment, computed
//! from the original RGB image rather than the color-converted working
//! copy the segmenter saw.

use crate::segment::SegmentLabeling;
use crate::types::{PipelineError, RgbImage};

/// Replace each segment's pixels with the segment's mean color.
///
/// Means are taken per channel over `original` and rounded to nearest.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidLabeling`] if the labeling's
/// dimensions differ from the image's, or a segment id has no pixels.
pub fn average(original: &RgbImage, labeling: &SegmentLabeling) -> Result<RgbImage, PipelineError> {
    let (width, height) = original.dimensions();
    if (labeling.width(), labeling.height()) != (width, height) {
        return Err(PipelineError::InvalidLabeling(format!(
            "labeling is {}x{} but image is {width}x{height}",
            labeling.width(),
            labeling.height(),
        )));
    }

    let count = labeling.segment_count() as usize;
    let mut sums = vec![[0u64; 3]; count];
    let mut sizes = vec![0u64; count];

    for (pixel, &id) in original.pixels().zip(labeling.labels()) {
        let sum = &mut sums[id as usize];
        for (s, &c) in sum.iter_mut().zip(&pixel.0) {
            *s += u64::from(c);
        }
        sizes[id as usize] += 1;
    }

    if let Some(empty) = sizes.iter().position(|&n| n == 0) {
        return Err(PipelineError::InvalidLabeling(format!(
            "segment {empty} has no pixels"
        )));
    }

    let means: Vec<[u8; 3]> = sums
        .iter()
        .zip(&sizes)
        .map(|(sum, &n)| sum.map(|s| rounded_mean(s, n)))
        .collect();

    let mut out = original.clone();
    for (pixel, &id) in out.pixels_mut().zip(labeling.labels()) {
        pixel.0 = means[id as usize];
    }
    Ok(out)
}

/// `round(sum / n)` in integer arithmetic; the result fits a channel
/// because it is a mean of 8-bit values.
#[allow(clippy::cast_possible_truncation)]
const fn rounded_mean(sum: u64, n: u64) -> u8 {
    ((sum + n / 2) / n) as u8
}
