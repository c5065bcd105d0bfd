//! Editing session with an original and a working snapshot.
//!
//! The original is never modified once loaded. Operations are applied to
//! the working snapshot, which is replaced only when the operation
//! succeeds, so a failure leaves the session exactly as it was.

use crate::operation::Operation;
use crate::types::{Dimensions, PipelineError, RgbImage};

#[derive(Debug, Clone)]
struct Snapshots {
    original: RgbImage,
    working: RgbImage,
}

/// Two owned image snapshots: the loaded original and the edited result.
#[derive(Debug, Clone, Default)]
pub struct Session {
    images: Option<Snapshots>,
}

impl Session {
    /// An empty session with no image loaded.
    #[must_use]
    pub const fn new() -> Self {
        Self { images: None }
    }

    /// Load `image` as both the original and the working snapshot,
    /// replacing anything loaded before.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoImageLoaded`] if `image` has zero area. The
    /// session is left as it was.
    pub fn load(&mut self, image: RgbImage) -> Result<(), PipelineError> {
        if Dimensions::of(&image).is_empty() {
            return Err(PipelineError::NoImageLoaded);
        }
        self.images = Some(Snapshots {
            working: image.clone(),
            original: image,
        });
        Ok(())
    }

    /// Whether an image is loaded.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.images.is_some()
    }

    /// The image as loaded.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoImageLoaded`] if nothing is loaded.
    pub fn original(&self) -> Result<&RgbImage, PipelineError> {
        self.snapshots().map(|s| &s.original)
    }

    /// The current edited image.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoImageLoaded`] if nothing is loaded.
    pub fn working(&self) -> Result<&RgbImage, PipelineError> {
        self.snapshots().map(|s| &s.working)
    }

    /// Apply `operation` to the working snapshot.
    ///
    /// Edits chain: each operation sees the result of the previous one.
    /// On error the working snapshot is left untouched.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoImageLoaded`] if nothing is loaded, otherwise
    /// whatever the operation returns.
    pub fn apply(&mut self, operation: &Operation) -> Result<&RgbImage, PipelineError> {
        let images = self.images.as_mut().ok_or(PipelineError::NoImageLoaded)?;
        images.working = operation.apply(&images.working)?;
        Ok(&images.working)
    }

    /// Discard all edits: the working snapshot becomes a copy of the
    /// original again.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoImageLoaded`] if nothing is loaded.
    pub fn reset(&mut self) -> Result<(), PipelineError> {
        let images = self.images.as_mut().ok_or(PipelineError::NoImageLoaded)?;
        images.working.clone_from(&images.original);
        Ok(())
    }

    /// Move the working snapshot out, leaving the session empty.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoImageLoaded`] if nothing is loaded.
    pub fn take_working(&mut self) -> Result<RgbImage, PipelineError> {
        self.images
            .take()
            .map(|s| s.working)
            .ok_or(PipelineError::NoImageLoaded)
    }

    fn snapshots(&self) -> Result<&Snapshots, PipelineError> {
        self.images.as_ref().ok_or(PipelineError::NoImageLoaded)
    }
}
