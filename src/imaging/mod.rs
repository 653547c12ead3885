//! Image decoding and pixel-layout conversion.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format guessed from content) |
//! | **Resize** | `image::imageops::resize`, exact dimensions, aspect ignored |
//! | **Convert** | [`layout`] — interleaved RGBA, planar RGB, planar BGR |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and offset math (unit testable)
//! - **Parameters**: Data structures describing a conversion
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Layout**: Per-pixel conversion into a float buffer

pub mod backend;
pub mod calculations;
pub mod layout;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, ImageBackend};
pub use params::{Conversion, MeanRgb, PixelLayout, ResizeFilter, TargetSize};
pub use rust_backend::{RustBackend, supported_input_extensions};
