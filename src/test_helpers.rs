//! Shared test utilities for the imgstage test suite.
//!
//! Provides synthetic pixel grids and writes them to disk as lossless PNG so
//! decoded values can be compared exactly.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("grad.png");
//! write_png(&path, &gradient(4, 3));
//! ```

use image::{Rgba, RgbaImage};
use std::path::Path;

/// Deterministic image whose pixel values encode their coordinates.
///
/// `r = x * 40`, `g = y * 40`, `b = (x + y) * 10`, `a = 255` (all wrapping).
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 40 % 256) as u8,
            (y * 40 % 256) as u8,
            ((x + y) * 10 % 256) as u8,
            255,
        ])
    })
}

/// Write `image` as PNG. Panics on failure.
pub fn write_png(path: &Path, image: &RgbaImage) {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap_or_else(|e| panic!("failed to write fixture {}: {e}", path.display()));
}
