//! Stylization diagnostics: timing and per-stage metrics.
//!
//! [`run_stylization_with_diagnostics`] drives the [`Stylization`] chain
//! and records how long each stage took along with what it produced
//! (segment counts, palette size, edge density, ...). The core never
//! reads the system clock itself; time comes from an injected [`Clock`]
//! so the crate stays free of platform time APIs.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::params::SegmentationParams;
use crate::pipeline::Stylization;
use crate::types::{ColorSpace, Dimensions, PipelineError, RgbImage};

/// Source of monotonic time for stage measurements.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single stylization run.
///
/// Stages that are skipped when their strength is zero have `Option`
/// fields that are `None` when the stage did not run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylizationDiagnostics {
    /// Color-space conversion of the working copy.
    pub convert: StageDiagnostics,
    /// Pre-segmentation blur (only when `sigma > 0`).
    pub pre_blur: Option<StageDiagnostics>,
    /// Superpixel segmentation.
    pub segment: StageDiagnostics,
    /// Per-segment averaging.
    pub average: StageDiagnostics,
    /// Palette quantization.
    pub quantize: StageDiagnostics,
    /// Edge detection and blending (only when `edge_weight > 0`).
    pub edge_blend: Option<StageDiagnostics>,
    /// Edge-preserving smoothing (only when `smoothing_factor > 0`).
    pub smooth: Option<StageDiagnostics>,
    /// Sharpening (only when `edge_enhancement > 0`).
    pub enhance: Option<StageDiagnostics>,
    /// Wall-clock duration of the whole run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: StylizationSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Color-space conversion.
    Convert {
        /// Target color space.
        color_space: ColorSpace,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Pre-segmentation Gaussian blur.
    PreBlur {
        /// Blur sigma.
        sigma: f32,
    },
    /// Superpixel segmentation.
    Segment {
        /// Requested segment count.
        requested: u32,
        /// Compactness used.
        compactness: f32,
        /// Segments actually produced.
        segment_count: u32,
        /// Pixels in the smallest segment.
        min_segment_pixels: u64,
        /// Pixels in the largest segment.
        max_segment_pixels: u64,
    },
    /// Per-segment averaging.
    Average {
        /// Segments averaged.
        segment_count: u32,
    },
    /// Palette quantization.
    Quantize {
        /// Requested palette size.
        n_colors: u32,
        /// Distinct colors in the output.
        output_colors: usize,
    },
    /// Edge detection and blending.
    EdgeBlend {
        /// Blend weight of the original on edge pixels.
        edge_weight: f32,
        /// Pixels marked as edges after dilation.
        edge_pixel_count: usize,
        /// Total pixel count, for edge density.
        total_pixel_count: u64,
    },
    /// Edge-preserving smoothing.
    Smooth {
        /// Requested factor.
        smoothing_factor: f32,
        /// Spatial sigma derived from the factor.
        sigma_spatial: f32,
    },
    /// Sharpening.
    Enhance {
        /// Sharpening strength.
        strength: f32,
    },
}

/// High-level summary for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylizationSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Superpixels produced by segmentation.
    pub segment_count: u32,
    /// Distinct colors in the final image.
    pub output_colors: usize,
}

/// Run the stylization pipeline, timing every stage.
///
/// Produces the same image as [`crate::run_stylization`].
///
/// # Errors
///
/// Same as [`crate::run_stylization`].
pub fn run_stylization_with_diagnostics<C: Clock>(
    image: &RgbImage,
    params: &SegmentationParams,
    clock: &C,
) -> Result<(RgbImage, StylizationDiagnostics), PipelineError> {
    let total_start = clock.now();
    let dimensions = Dimensions::of(image);

    let pending = Stylization::new(image.clone(), params.clone())?;

    let start = clock.now();
    let converted = pending.convert();
    let convert = timed(clock, &start, converted.metrics());

    let start = clock.now();
    let pre_blurred = converted.pre_blur();
    let pre_blur = pre_blurred.metrics().map(|m| timed(clock, &start, m));

    let start = clock.now();
    let segmented = pre_blurred.segment()?;
    let segment = timed(clock, &start, segmented.metrics());

    let start = clock.now();
    let averaged = segmented.average()?;
    let average = timed(clock, &start, averaged.metrics());

    let start = clock.now();
    let quantized = averaged.quantize()?;
    let quantize = timed(clock, &start, quantized.metrics());

    let start = clock.now();
    let blended = quantized.blend_edges()?;
    let edge_blend = blended.metrics().map(|m| timed(clock, &start, m));

    let start = clock.now();
    let smoothed = blended.smooth()?;
    let smooth = smoothed.metrics().map(|m| timed(clock, &start, m));

    let start = clock.now();
    let enhanced = smoothed.enhance()?;
    let enhance = enhanced.metrics().map(|m| timed(clock, &start, m));

    let segment_count = enhanced.segment_count();
    let output = enhanced.into_image();
    let summary = StylizationSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: dimensions.pixel_count(),
        segment_count,
        output_colors: crate::quantize::count_distinct_colors(&output),
    };

    let diagnostics = StylizationDiagnostics {
        convert,
        pre_blur,
        segment,
        average,
        quantize,
        edge_blend,
        smooth,
        enhance,
        total_duration: clock.elapsed(&total_start),
        summary,
    };
    Ok((output, diagnostics))
}

fn timed<C: Clock>(clock: &C, start: &C::Instant, metrics: StageMetrics) -> StageDiagnostics {
    StageDiagnostics {
        duration: clock.elapsed(start),
        metrics,
    }
}

impl StylizationDiagnostics {
    /// Stages that ran, in pipeline order, with their display names.
    #[must_use]
    pub fn stages(&self) -> Vec<(&'static str, &StageDiagnostics)> {
        let mut stages = vec![("Convert", &self.convert)];
        if let Some(ref d) = self.pre_blur {
            stages.push(("Pre-blur", d));
        }
        stages.push(("Segment", &self.segment));
        stages.push(("Average", &self.average));
        stages.push(("Quantize", &self.quantize));
        if let Some(ref d) = self.edge_blend {
            stages.push(("Edge Blend", d));
        }
        if let Some(ref d) = self.smooth {
            stages.push(("Smooth", d));
        }
        if let Some(ref d) = self.enhance {
            stages.push(("Enhance", d));
        }
        stages
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Stylization Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Segments: {}  |  Output colors: {}",
            self.summary.segment_count, self.summary.output_colors,
        ));

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Convert {
            color_space,
            width,
            height,
        } => format!("rgb -> {color_space} {width}x{height}"),
        StageMetrics::PreBlur { sigma } => format!("sigma={sigma:.2}"),
        StageMetrics::Segment {
            requested,
            compactness,
            segment_count,
            min_segment_pixels,
            max_segment_pixels,
        } => format!(
            "{segment_count}/{requested} segments, compactness={compactness:.1}, px min={min_segment_pixels} max={max_segment_pixels}",
        ),
        StageMetrics::Average { segment_count } => format!("{segment_count} segments"),
        StageMetrics::Quantize {
            n_colors,
            output_colors,
        } => format!("k={n_colors} -> {output_colors} colors"),
        StageMetrics::EdgeBlend {
            edge_weight,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("weight={edge_weight:.2} edges={edge_pixel_count} ({density:.1}%)")
        }
        StageMetrics::Smooth {
            smoothing_factor,
            sigma_spatial,
        } => format!("factor={smoothing_factor:.2} sigma_s={sigma_spatial:.0}"),
        StageMetrics::Enhance { strength } => format!("strength={strength:.2}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Clock that advances one millisecond on every reading.
    struct TickClock {
        ticks: Cell<u64>,
    }

    impl TickClock {
        const fn new() -> Self {
            Self {
                ticks: Cell::new(0),
            }
        }
    }

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn photo() -> RgbImage {
        RgbImage::from_fn(20, 16, |x, y| {
            if (x / 5 + y / 4) % 2 == 0 {
                image::Rgb([220, 40 + (x * 3) as u8, 20])
            } else {
                image::Rgb([30, 60, 200 - (y * 2) as u8])
            }
        })
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn output_matches_plain_run() {
        let params = SegmentationParams::cartoon();
        let (image, _) = run_stylization_with_diagnostics(&photo(), &params, &TickClock::new())
            .unwrap();
        assert_eq!(image, crate::run_stylization(&photo(), &params).unwrap());
    }

    #[test]
    fn skipped_stages_are_none() {
        let params = SegmentationParams {
            sigma: 0.0,
            edge_weight: 0.0,
            smoothing_factor: 0.0,
            edge_enhancement: 0.0,
            ..SegmentationParams::default()
        };
        let (_, diag) =
            run_stylization_with_diagnostics(&photo(), &params, &TickClock::new()).unwrap();
        assert!(diag.pre_blur.is_none());
        assert!(diag.edge_blend.is_none());
        assert!(diag.smooth.is_none());
        assert!(diag.enhance.is_none());
        assert_eq!(diag.stages().len(), 4);
    }

    #[test]
    fn all_stages_recorded_for_defaults() {
        let (_, diag) = run_stylization_with_diagnostics(
            &photo(),
            &SegmentationParams::default(),
            &TickClock::new(),
        )
        .unwrap();
        assert_eq!(diag.stages().len(), 8);
        assert_eq!(diag.summary.image_width, 20);
        assert_eq!(diag.summary.image_height, 16);
        assert_eq!(diag.summary.pixel_count, 320);
        assert!(diag.summary.segment_count >= 1);
    }

    #[test]
    fn stage_durations_come_from_clock() {
        let (_, diag) = run_stylization_with_diagnostics(
            &photo(),
            &SegmentationParams::default(),
            &TickClock::new(),
        )
        .unwrap();
        // Each stage reads the clock twice: once at start, once at end.
        for (name, stage) in diag.stages() {
            assert_eq!(stage.duration, Duration::from_millis(1), "stage {name}");
        }
        assert!(diag.total_duration > Duration::from_millis(8));
    }

    #[test]
    fn report_lists_stages() {
        let (_, diag) = run_stylization_with_diagnostics(
            &photo(),
            &SegmentationParams::default(),
            &TickClock::new(),
        )
        .unwrap();
        let report = diag.report();
        for name in ["Convert", "Segment", "Quantize", "Edge Blend", "Enhance"] {
            assert!(report.contains(name), "report is missing {name}:\n{report}");
        }
        assert!(report.contains("20x16"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let (_, diag) = run_stylization_with_diagnostics(
            &photo(),
            &SegmentationParams::default(),
            &TickClock::new(),
        )
        .unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        let secs = json["segment"]["duration"].as_f64().unwrap();
        assert!((secs - 0.001).abs() < 1e-9);
        let back: StylizationDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.segment.duration, Duration::from_millis(1));
    }

    #[test]
    fn empty_image_fails() {
        let result = run_stylization_with_diagnostics(
            &RgbImage::new(0, 0),
            &SegmentationParams::default(),
            &TickClock::new(),
        );
        assert!(matches!(result, Err(PipelineError::NoImageLoaded)));
    }
}
