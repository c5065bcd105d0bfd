//! Color-space conversion between RGB, LAB, and HSV.
//!
//! Non-RGB spaces are stored in 8-bit channels so a converted image is
//! still an [`RgbImage`]:
//!
//! | Space | Channel 0          | Channel 1      | Channel 2      |
//! |-------|--------------------|----------------|----------------|
//! | LAB   | `L * 255 / 100`    | `a + 128`      | `b + 128`      |
//! | HSV   | `hue_degrees / 2`  | `sat * 255`    | `value * 255`  |
//!
//! The color math itself is done by the `palette` crate (D65 white
//! point, sRGB transfer function).

use palette::{FromColor, Hsv, Lab, LinSrgb, Srgb};

use crate::types::{ColorSpace, PipelineError, RgbImage};

/// Convert an image between color spaces.
///
/// Returns a copy when `from == to`. Conversions between two non-RGB
/// spaces go through RGB.
#[must_use = "returns the converted image"]
pub fn convert(image: &RgbImage, from: ColorSpace, to: ColorSpace) -> RgbImage {
    if from == to {
        return image.clone();
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let rgb = to_rgb(pixel.0, from);
        pixel.0 = from_rgb(rgb, to);
    }
    out
}

/// Convert an image between color spaces named by their string tags.
///
/// # Errors
///
/// Returns [`PipelineError::UnsupportedColorSpace`] if either tag is
/// not one of `lab`, `rgb`, `hsv`.
pub fn convert_named(image: &RgbImage, from: &str, to: &str) -> Result<RgbImage, PipelineError> {
    let from: ColorSpace = from.parse()?;
    let to: ColorSpace = to.parse()?;
    Ok(convert(image, from, to))
}

fn to_rgb(channels: [u8; 3], space: ColorSpace) -> [u8; 3] {
    match space {
        ColorSpace::Rgb => channels,
        ColorSpace::Lab => lab8_to_rgb(channels),
        ColorSpace::Hsv => hsv8_to_rgb(channels),
    }
}

fn from_rgb(rgb: [u8; 3], space: ColorSpace) -> [u8; 3] {
    match space {
        ColorSpace::Rgb => rgb,
        ColorSpace::Lab => rgb_to_lab8(rgb),
        ColorSpace::Hsv => rgb_to_hsv8(rgb),
    }
}

/// Encode one RGB pixel as 8-bit LAB.
#[must_use]
pub fn rgb_to_lab8(rgb: [u8; 3]) -> [u8; 3] {
    let linear: LinSrgb<f32> = srgb(rgb).into_linear();
    let lab: Lab = Lab::from_color(linear);
    [
        quantize_channel(lab.l * 255.0 / 100.0),
        quantize_channel(lab.a + 128.0),
        quantize_channel(lab.b + 128.0),
    ]
}

/// Decode one 8-bit LAB pixel back to RGB.
#[must_use]
pub fn lab8_to_rgb(lab: [u8; 3]) -> [u8; 3] {
    let lab: Lab = Lab::new(
        f32::from(lab[0]) * 100.0 / 255.0,
        f32::from(lab[1]) - 128.0,
        f32::from(lab[2]) - 128.0,
    );
    let linear: LinSrgb<f32> = LinSrgb::from_color(lab);
    unit_to_rgb8(Srgb::from_linear(linear))
}

/// Encode one RGB pixel as 8-bit HSV.
#[must_use]
pub fn rgb_to_hsv8(rgb: [u8; 3]) -> [u8; 3] {
    let hsv: Hsv = Hsv::from_color(srgb(rgb));
    [
        quantize_channel(hsv.hue.into_positive_degrees() / 2.0).min(179),
        quantize_channel(hsv.saturation * 255.0),
        quantize_channel(hsv.value * 255.0),
    ]
}

/// Decode one 8-bit HSV pixel back to RGB.
#[must_use]
pub fn hsv8_to_rgb(hsv: [u8; 3]) -> [u8; 3] {
    let hsv: Hsv = Hsv::new(
        f32::from(hsv[0]) * 2.0,
        f32::from(hsv[1]) / 255.0,
        f32::from(hsv[2]) / 255.0,
    );
    unit_to_rgb8(Srgb::from_color(hsv))
}

fn srgb(rgb: [u8; 3]) -> Srgb<f32> {
    Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>()
}

fn unit_to_rgb8(color: Srgb<f32>) -> [u8; 3] {
    [
        quantize_channel(color.red * 255.0),
        quantize_channel(color.green * 255.0),
        quantize_channel(color.blue * 255.0),
    ]
}

/// Round and clamp a float to the 8-bit channel range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn quantize_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}
