//! # imgstage
//!
//! Load an image from disk, optionally resize it, and stage its pixels as
//! `f32` values in host/device mapped memory, ready for an inference engine.
//!
//! ```no_run
//! use imgstage::{ImageLoader, MeanRgb, TargetSize};
//!
//! # fn main() -> Result<(), imgstage::LoadError> {
//! let loader = ImageLoader::new();
//! let mean = MeanRgb::new(104.0, 117.0, 123.0);
//! let image = loader.load_bgr("cat.jpg", TargetSize::new(224, 224), mean)?;
//! let device_input = image.buffer().device_ptr();
//! # let _ = device_input;
//! loader.release(image);
//! # Ok(())
//! # }
//! ```
//!
//! # Layouts
//!
//! | Operation | Layout | Values |
//! |---|---|---|
//! | [`ImageLoader::load_rgba`] | interleaved `R,G,B,A` | raw 0–255, alpha fixed at 1.0 |
//! | [`ImageLoader::load_rgb`] | planar R, G, B | `(v - mean) * scale` |
//! | [`ImageLoader::load_bgr`] | planar B, G, R | `(v - mean) * scale` |
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`loader`] | Decode → size check → allocate → resize → convert; the public entry point |
//! | [`imaging`] | Decoder trait + `image`-crate backend, size math, layout conversion |
//! | [`memory`] | Dual-view mapped buffers and the allocator trait |
//! | [`config`] | `imgstage.toml` loading and validation |
//! | [`output`] | CLI summaries of a loaded image |
//!
//! # Design Decisions
//!
//! ## Results, Not Out-Parameters
//!
//! Each load returns a [`LoadedImage`] that owns its [`MappedBuffer`] and
//! carries the final width and height. All three layouts report dimensions the
//! same way.
//!
//! ## Allocation After Decode
//!
//! Memory is requested only once the image has decoded and its final size is
//! known, and before any resampling. A missing or corrupt file never
//! allocates, and an impossible or over-budget size never resizes.
//!
//! ## No Implicit Normalization
//!
//! Planar values stay in the 0–255 range minus the mean unless a `scale` is
//! configured.

pub mod config;
pub mod imaging;
pub mod loader;
pub mod memory;
pub mod output;

pub use imaging::{MeanRgb, PixelLayout, ResizeFilter, TargetSize};
pub use loader::{ImageLoader, LoadError, LoadedImage};
pub use memory::{AllocError, DevicePtr, HostAllocator, MappedAllocator, MappedBuffer};

#[cfg(test)]
pub(crate) mod test_helpers;
