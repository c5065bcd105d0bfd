//! inkwash-io: image decoding and encoding for the inkwash pipeline.
//!
//! The pipeline crate only sees [`RgbImage`] buffers. This crate turns
//! file bytes into those buffers and back, picking the output format
//! from a file extension.

use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;
use inkwash_pipeline::RgbImage;

/// Errors from decoding, encoding, or file access.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input contained no bytes.
    #[error("input is empty")]
    EmptyInput,

    /// The bytes are not a supported image or are corrupt.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Encoding the output image failed.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The output path has no extension we can write.
    #[error("unsupported output format: {0:?}")]
    UnsupportedFormat(String),

    /// Reading or writing a file failed.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),
}

/// Formats [`encode`] can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG.
    Png,
    /// Baseline JPEG.
    Jpeg,
    /// Uncompressed BMP.
    Bmp,
}

impl OutputFormat {
    /// Pick a format from the extension of `path` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnsupportedFormat`] for a missing or unknown
    /// extension.
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
        }
    }

    const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Decode image bytes (PNG, JPEG, BMP, WebP) into an RGB buffer.
///
/// Alpha, if present, is dropped.
///
/// # Errors
///
/// Returns [`IoError::EmptyInput`] if `bytes` is empty and
/// [`IoError::Decode`] if the format is unrecognized or the data is
/// corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, IoError> {
    if bytes.is_empty() {
        return Err(IoError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Encode `image` in `format`.
///
/// # Errors
///
/// Returns [`IoError::Encode`] if the encoder fails.
pub fn encode(image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, IoError> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, format.image_format())
        .map_err(|e| IoError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Read and decode the image at `path`.
///
/// # Errors
///
/// Returns [`IoError::File`] if the file cannot be read, otherwise the
/// errors of [`decode`].
pub fn load(path: &Path) -> Result<RgbImage, IoError> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Encode `image` in the format implied by `path` and write it there.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] for an unknown extension,
/// [`IoError::Encode`] if encoding fails, and [`IoError::File`] if the
/// file cannot be written.
pub fn save(image: &RgbImage, path: &Path) -> Result<(), IoError> {
    let format = OutputFormat::from_path(path)?;
    let bytes = encode(image, format)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
