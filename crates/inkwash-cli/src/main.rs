//! inkwash: command-line front end for the stylization pipeline.
//!
//! Reads an image, runs one operation on it, and writes the result. The
//! output format follows the output file extension (PNG, JPEG, BMP).
//!
//! # Usage
//!
//! ```text
//! inkwash stylize photo.jpg -o out.png --preset cartoon --diagnostics
//! inkwash quantize photo.jpg -o out.png --colors 6
//! inkwash grayscale photo.jpg -o out.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use inkwash_pipeline::diagnostics::{Clock, run_stylization_with_diagnostics};
use inkwash_pipeline::{ColorSpace, Operation, Preset, RgbImage, SegmentationParams};

/// Turn photographs into simplified, cartoon-like renditions.
#[derive(Parser)]
#[command(name = "inkwash", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full stylization pipeline.
    Stylize(StylizeArgs),
    /// Reduce the image to a small k-means palette.
    Quantize {
        #[command(flatten)]
        files: Files,

        /// Palette size.
        #[arg(long, default_value_t = 8, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(
            u64::from(inkwash_pipeline::QUANTIZE_ONLY_MIN_COLORS)..=u64::from(inkwash_pipeline::QUANTIZE_ONLY_MAX_COLORS)
        ))]
        colors: u32,
    },
    /// Convert to grayscale.
    Grayscale {
        #[command(flatten)]
        files: Files,
    },
}

#[derive(Args)]
struct Files {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Path to write the result to (.png, .jpg, .bmp).
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct StylizeArgs {
    #[command(flatten)]
    files: Files,

    /// Starting parameter set; individual flags override it.
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Approximate number of superpixels.
    #[arg(long)]
    n_segments: Option<u32>,

    /// Palette size for quantization.
    #[arg(long)]
    n_colors: Option<u32>,

    /// Color versus spatial weighting (0-100).
    #[arg(long)]
    compactness: Option<f32>,

    /// Pre-blur sigma (0 disables).
    #[arg(long)]
    sigma: Option<f32>,

    /// Edge blend weight (0-1).
    #[arg(long)]
    edge_weight: Option<f32>,

    /// Working color space for segmentation.
    #[arg(long, value_enum)]
    color_space: Option<ColorSpaceArg>,

    /// Edge-preserving smoothing strength (0-1).
    #[arg(long)]
    smoothing_factor: Option<f32>,

    /// Sharpening strength (0-1).
    #[arg(long)]
    edge_enhancement: Option<f32>,

    /// K-means seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Full parameter record as a JSON string.
    ///
    /// When provided, `--preset` and all other parameter flags are
    /// ignored. Missing fields take their default values.
    #[arg(long)]
    config_json: Option<String>,

    /// Print per-stage timing and counts after the run.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// Preset selection.
#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    /// Few segments, few colors, strong edges.
    Cartoon,
    /// Many segments, soft edges, heavy smoothing.
    Painterly,
    /// Very few segments and colors.
    Abstract,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Cartoon => Self::Cartoon,
            PresetArg::Painterly => Self::Painterly,
            PresetArg::Abstract => Self::Abstract,
        }
    }
}

/// Working color space selection.
#[derive(Clone, Copy, ValueEnum)]
enum ColorSpaceArg {
    /// CIE L*a*b*.
    Lab,
    /// Plain RGB.
    Rgb,
    /// Hue, saturation, value.
    Hsv,
}

impl From<ColorSpaceArg> for ColorSpace {
    fn from(arg: ColorSpaceArg) -> Self {
        match arg {
            ColorSpaceArg::Lab => Self::Lab,
            ColorSpaceArg::Rgb => Self::Rgb,
            ColorSpaceArg::Hsv => Self::Hsv,
        }
    }
}

/// Build a [`SegmentationParams`] from CLI arguments.
///
/// `--config-json` wins outright. Otherwise the preset (or the defaults)
/// is the base and each given flag overrides one field.
fn params_from_cli(args: &StylizeArgs) -> Result<SegmentationParams, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut params = args
        .preset
        .and_then(|p| Preset::from(p).params())
        .unwrap_or_default();

    if let Some(v) = args.n_segments {
        params.n_segments = v;
    }
    if let Some(v) = args.n_colors {
        params.n_colors = v;
    }
    if let Some(v) = args.compactness {
        params.compactness = v;
    }
    if let Some(v) = args.sigma {
        params.sigma = v;
    }
    if let Some(v) = args.edge_weight {
        params.edge_weight = v;
    }
    if let Some(v) = args.color_space {
        params.color_space = v.into();
    }
    if let Some(v) = args.smoothing_factor {
        params.smoothing_factor = v;
    }
    if let Some(v) = args.edge_enhancement {
        params.edge_enhancement = v;
    }
    if let Some(v) = args.seed {
        params.seed = v;
    }
    Ok(params)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Stylize(args) => stylize(args),
        Command::Quantize { files, colors } => {
            run_operation(files, &Operation::Quantize { n_colors: *colors })
        }
        Command::Grayscale { files } => run_operation(files, &Operation::Grayscale),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn stylize(args: &StylizeArgs) -> Result<(), String> {
    let params = params_from_cli(args)?;
    let image = load(&args.files.input)?;
    eprintln!("Params: {params:#?}");

    let output = if args.diagnostics || args.json {
        let (output, diagnostics) = run_stylization_with_diagnostics(&image, &params, &StdClock)
            .map_err(|e| format!("Pipeline error: {e}"))?;
        if args.json {
            let json = serde_json::to_string_pretty(&diagnostics)
                .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
            println!("{json}");
        } else {
            println!("{}", diagnostics.report());
        }
        output
    } else {
        Operation::Stylize(params)
            .apply(&image)
            .map_err(|e| format!("Pipeline error: {e}"))?
    };

    save(&output, &args.files.output)
}

fn run_operation(files: &Files, operation: &Operation) -> Result<(), String> {
    let image = load(&files.input)?;
    let start = Instant::now();
    let output = operation
        .apply(&image)
        .map_err(|e| format!("Pipeline error: {e}"))?;
    eprintln!(
        "{}: {:.3}ms",
        operation.name(),
        start.elapsed().as_secs_f64() * 1000.0,
    );
    save(&output, &files.output)
}

fn load(path: &Path) -> Result<RgbImage, String> {
    let image =
        inkwash_io::load(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    eprintln!(
        "Image: {} ({}x{})",
        path.display(),
        image.width(),
        image.height(),
    );
    Ok(image)
}

fn save(image: &RgbImage, path: &Path) -> Result<(), String> {
    inkwash_io::save(image, path).map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    eprintln!("Output written to {}", path.display());
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
