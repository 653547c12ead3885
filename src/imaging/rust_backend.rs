//! Pure Rust decoding backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP, GIF) | `image::ImageReader`, format guessed from content |
//! | Expand to RGBA8 | `image::DynamicImage::to_rgba8` |
//! | Resize | `image::imageops::resize` with the requested filter |

use super::backend::{BackendError, DecodedImage, ImageBackend};
use super::params::ResizeFilter;
use image::{ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

const CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
    ("gif", ImageFormat::Gif),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Decoder backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError> {
        let image = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::Decode(format!("Failed to decode {}: {}", path.display(), e))
            })?;
        Ok(DecodedImage::new(image.to_rgba8()))
    }

    fn resize_exact(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
        filter: ResizeFilter,
    ) -> DecodedImage {
        let resized = image::imageops::resize(image.as_rgba(), width, height, filter.into());
        DecodedImage::new(resized)
    }
}
