//! Image decoding backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the loader needs from
//! a decoder: decode a file, and resize to exact dimensions.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the mock in this module to hand out in-memory pixel grids.

use super::params::ResizeFilter;
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decoding failed: {0}")]
    Decode(String),
}

/// A decoded image held as an 8-bit RGBA grid.
///
/// Images without an alpha channel are expanded with alpha = 255; the loader
/// never reads it back, so the value does not matter downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pixels: RgbaImage,
}

impl DecodedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Channel values `[r, g, b, a]` at `(x, y)`.
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn pixel_at(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl From<RgbaImage> for DecodedImage {
    fn from(pixels: RgbaImage) -> Self {
        Self::new(pixels)
    }
}

/// Trait for image decoding backends.
pub trait ImageBackend: Sync {
    /// Open and decode the image at `path`.
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError>;

    /// Resize to exactly `width` x `height`, ignoring the aspect ratio.
    fn resize_exact(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
        filter: ResizeFilter,
    ) -> DecodedImage;
}
