//! Image loader: decode, allocate mapped memory, resize, convert.
//!
//! Every load runs the same steps on the calling thread:
//!
//! ```text
//! 1. Decode     path          →  DecodedImage       (ImageBackend)
//! 2. Size       w*h*channels  →  buffer length      (overflow is InvalidArgument)
//! 3. Allocate   length        →  MappedBuffer       (MappedAllocator)
//! 4. Resize     DecodedImage  →  DecodedImage       (only if both target axes > 0)
//! 5. Convert    DecodedImage  →  host view          (imaging::layout)
//! ```
//!
//! Allocation only happens after a successful decode, so a bad path never
//! leaves a buffer behind. The output size is checked and its memory
//! secured before any resampling, so an impossible or over-budget size
//! fails fast. On success the caller owns the returned
//! [`LoadedImage`] and its buffer; the loader keeps nothing.

use crate::config::LoaderConfig;
use crate::imaging::calculations::{buffer_len, byte_size, output_dimensions};
use crate::imaging::layout::convert_into;
use crate::imaging::{
    BackendError, Conversion, ImageBackend, MeanRgb, PixelLayout, ResizeFilter, RustBackend,
    TargetSize,
};
use crate::memory::{AllocError, HostAllocator, MappedAllocator, MappedBuffer};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to load image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("failed to allocate {bytes} bytes for image {path}: {source}")]
    Allocation {
        path: PathBuf,
        bytes: usize,
        #[source]
        source: AllocError,
    },
}

/// A converted image living in mapped memory.
#[derive(Debug)]
pub struct LoadedImage {
    buffer: MappedBuffer,
    width: u32,
    height: u32,
    layout: PixelLayout,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn buffer(&self) -> &MappedBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut MappedBuffer {
        &mut self.buffer
    }

    /// Give up the image metadata and keep only the buffer.
    pub fn into_buffer(self) -> MappedBuffer {
        self.buffer
    }

    /// Plane `index` of a planar image, in buffer order.
    ///
    /// Returns `None` for interleaved images or an out-of-range index.
    pub fn plane(&self, index: usize) -> Option<&[f32]> {
        if !self.layout.is_planar() || index >= self.layout.channels() {
            return None;
        }
        let len = self.pixel_count();
        self.buffer.host().get(index * len..(index + 1) * len)
    }
}

/// Loads images into mapped float buffers.
///
/// Generic over the decoder and the allocator so either can be swapped, e.g.
/// for a mock in tests or a driver-backed allocator on real hardware.
pub struct ImageLoader<B = RustBackend, A = HostAllocator> {
    backend: B,
    allocator: A,
    filter: ResizeFilter,
    scale: f32,
    mean: MeanRgb,
}

impl ImageLoader {
    /// `image`-crate decoder, unbounded host allocator, nearest-neighbour resize.
    pub fn new() -> Self {
        Self::with_parts(RustBackend::new(), HostAllocator::new())
    }

    /// Budget, filter and scale come from `config`. The configured mean is kept
    /// as [`mean`](ImageLoader::mean) for callers that want a default;
    /// `load_rgb`/`load_bgr` still take their mean per call.
    pub fn from_config(config: &LoaderConfig) -> Self {
        let allocator = match config.memory.max_bytes {
            Some(max) => HostAllocator::with_budget(max),
            None => HostAllocator::new(),
        };
        Self::with_parts(RustBackend::new(), allocator)
            .with_filter(config.resize.filter)
            .with_scale(config.conversion.scale)
            .with_mean(config.conversion.mean)
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ImageBackend, A: MappedAllocator> ImageLoader<B, A> {
    pub fn with_parts(backend: B, allocator: A) -> Self {
        Self {
            backend,
            allocator,
            filter: ResizeFilter::default(),
            scale: 1.0,
            mean: MeanRgb::ZERO,
        }
    }

    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Multiplier applied after mean subtraction for planar layouts.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Default per-plane mean, e.g. from `[conversion] mean`.
    pub fn with_mean(mut self, mean: MeanRgb) -> Self {
        self.mean = mean;
        self
    }

    pub fn mean(&self) -> MeanRgb {
        self.mean
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Interleaved `(R, G, B, 1.0)` per pixel.
    pub fn load_rgba(
        &self,
        path: impl AsRef<Path>,
        size: TargetSize,
    ) -> Result<LoadedImage, LoadError> {
        self.load(path.as_ref(), size, PixelLayout::Rgba, MeanRgb::ZERO)
    }

    /// Planar R, G, B with `mean` subtracted per plane.
    pub fn load_rgb(
        &self,
        path: impl AsRef<Path>,
        size: TargetSize,
        mean: MeanRgb,
    ) -> Result<LoadedImage, LoadError> {
        self.load(path.as_ref(), size, PixelLayout::Rgb, mean)
    }

    /// Planar B, G, R; `mean[0]` is subtracted from blue.
    pub fn load_bgr(
        &self,
        path: impl AsRef<Path>,
        size: TargetSize,
        mean: MeanRgb,
    ) -> Result<LoadedImage, LoadError> {
        self.load(path.as_ref(), size, PixelLayout::Bgr, mean)
    }

    /// Load into any layout. `mean` is ignored for [`PixelLayout::Rgba`].
    pub fn load(
        &self,
        path: &Path,
        size: TargetSize,
        layout: PixelLayout,
        mean: MeanRgb,
    ) -> Result<LoadedImage, LoadError> {
        self.load_inner(path, size, layout, mean)
            .inspect_err(|e| log::error!("{e}"))
    }

    /// Hand a loaded image's buffer back to the allocator.
    pub fn release(&self, image: LoadedImage) {
        self.allocator.release(image.into_buffer());
    }

    fn load_inner(
        &self,
        path: &Path,
        size: TargetSize,
        layout: PixelLayout,
        mean: MeanRgb,
    ) -> Result<LoadedImage, LoadError> {
        if path.as_os_str().is_empty() {
            return Err(LoadError::InvalidArgument("empty image path".into()));
        }
        let conversion = Conversion {
            mean,
            scale: self.scale,
        };
        if !conversion.is_finite() {
            return Err(LoadError::InvalidArgument(format!(
                "mean {:?} and scale {} must be finite",
                mean.0, self.scale
            )));
        }

        let decoded = self
            .backend
            .decode(path)
            .map_err(|source| LoadError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let natural = (decoded.width(), decoded.height());
        let (width, height) = output_dimensions(natural, size.exact());

        let len = buffer_len(width, height, layout.channels()).ok_or_else(|| {
            LoadError::InvalidArgument(format!("{width}x{height} {layout} buffer overflows"))
        })?;
        let bytes = byte_size(len);
        log::info!(
            "loaded image  {}  ({width} x {height})  {bytes} bytes",
            path.display()
        );

        let mut buffer = self
            .allocator
            .allocate(len)
            .map_err(|source| LoadError::Allocation {
                path: path.to_path_buf(),
                bytes,
                source,
            })?;

        let image = if (width, height) != natural {
            log::debug!(
                "resizing {} from {}x{} to {width}x{height} ({:?})",
                path.display(),
                natural.0,
                natural.1,
                self.filter
            );
            self.backend
                .resize_exact(&decoded, width, height, self.filter)
        } else {
            decoded
        };

        convert_into(&image, layout, &conversion, buffer.host_mut());

        Ok(LoadedImage {
            buffer,
            width,
            height,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use image::{Rgba, RgbaImage};

    fn red_green() -> RgbaImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img
    }

    fn mock_loader(path: &str, img: RgbaImage) -> ImageLoader<MockBackend, HostAllocator> {
        ImageLoader::with_parts(MockBackend::with_image(path, img), HostAllocator::new())
    }

    #[test]
    fn rgb_two_pixel_example() {
        let loader = mock_loader("/rg.png", red_green());
        let loaded = loader
            .load_rgb("/rg.png", TargetSize::natural(), MeanRgb::ZERO)
            .unwrap();

        assert_eq!((loaded.width(), loaded.height()), (2, 1));
        assert_eq!(loaded.buffer().host(), &[255.0, 0.0, 0.0, 255.0, 0.0, 0.0]);
    }

    #[test]
    fn bgr_two_pixel_example() {
        let loader = mock_loader("/rg.png", red_green());
        let loaded = loader
            .load_bgr("/rg.png", TargetSize::natural(), MeanRgb::ZERO)
            .unwrap();

        assert_eq!(loaded.layout(), PixelLayout::Bgr);
        assert_eq!(loaded.buffer().host(), &[0.0, 0.0, 0.0, 255.0, 255.0, 0.0]);
        assert_eq!((loaded.width(), loaded.height()), (2, 1));
    }

    #[test]
    fn rgba_two_pixel_example() {
        let loader = mock_loader("/rg.png", red_green());
        let loaded = loader.load_rgba("/rg.png", TargetSize::natural()).unwrap();

        assert_eq!(
            loaded.buffer().host(),
            &[255.0, 0.0, 0.0, 1.0, 0.0, 255.0, 0.0, 1.0]
        );
        assert_eq!(loaded.buffer().byte_len(), 2 * 4 * 4);
    }

    #[test]
    fn resize_only_when_both_axes_requested() {
        let loader = mock_loader("/a.png", RgbaImage::new(8, 6));

        let loaded = loader.load_rgba("/a.png", TargetSize::new(4, 0)).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (8, 6));
        assert!(
            !loader
                .backend()
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Resize { .. }))
        );

        let loaded = loader.load_rgba("/a.png", TargetSize::new(4, 3)).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (4, 3));
        assert_eq!(loaded.buffer().len(), 4 * 3 * 4);
    }

    #[test]
    fn resize_uses_configured_filter() {
        let loader =
            mock_loader("/a.png", RgbaImage::new(8, 6)).with_filter(ResizeFilter::Triangle);
        loader
            .load_rgb("/a.png", TargetSize::new(100, 50), MeanRgb::ZERO)
            .unwrap();

        let ops = loader.backend().get_operations();
        assert_eq!(
            ops.last(),
            Some(&RecordedOp::Resize {
                from: (8, 6),
                to: (100, 50),
                filter: ResizeFilter::Triangle,
            })
        );
    }

    #[test]
    fn requested_size_equal_to_natural_skips_resize() {
        let loader = mock_loader("/a.png", RgbaImage::new(8, 6));
        loader.load_rgba("/a.png", TargetSize::new(8, 6)).unwrap();
        assert_eq!(loader.backend().get_operations().len(), 1);
    }

    #[test]
    fn empty_path_is_invalid_and_does_not_decode() {
        let loader = mock_loader("/a.png", RgbaImage::new(1, 1));
        let err = loader.load_rgba("", TargetSize::natural()).unwrap_err();

        assert!(matches!(err, LoadError::InvalidArgument(_)));
        assert!(loader.backend().get_operations().is_empty());
        assert_eq!(loader.allocator().allocation_count(), 0);
    }

    #[test]
    fn non_finite_mean_is_invalid() {
        let loader = mock_loader("/a.png", RgbaImage::new(1, 1));
        let err = loader
            .load_bgr("/a.png", TargetSize::natural(), MeanRgb::new(0.0, f32::INFINITY, 0.0))
            .unwrap_err();

        assert!(matches!(err, LoadError::InvalidArgument(_)));
        assert_eq!(loader.allocator().allocation_count(), 0);
    }

    #[test]
    fn decode_failure_allocates_nothing() {
        let loader = mock_loader("/a.png", RgbaImage::new(1, 1));
        let err = loader
            .load_rgb("/missing.png", TargetSize::natural(), MeanRgb::ZERO)
            .unwrap_err();

        match err {
            LoadError::Decode { path, .. } => assert_eq!(path, PathBuf::from("/missing.png")),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert_eq!(loader.allocator().allocation_count(), 0);
        assert_eq!(loader.allocator().live_bytes(), 0);
    }

    #[test]
    fn allocation_failure_is_reported_with_size() {
        let loader = ImageLoader::with_parts(
            MockBackend::with_image("/a.png", RgbaImage::new(10, 10)),
            HostAllocator::with_budget(100),
        );
        let err = loader.load_rgba("/a.png", TargetSize::natural()).unwrap_err();

        match err {
            LoadError::Allocation { bytes, source, .. } => {
                assert_eq!(bytes, 10 * 10 * 4 * 4);
                assert!(matches!(source, AllocError::OverBudget { .. }));
            }
            other => panic!("expected allocation error, got {other:?}"),
        }
    }

    #[test]
    fn scale_applies_to_planar_layouts() {
        let loader = mock_loader("/rg.png", red_green()).with_scale(0.5);
        let loaded = loader
            .load_rgb("/rg.png", TargetSize::natural(), MeanRgb::ZERO)
            .unwrap();
        assert_eq!(loaded.plane(0), Some(&[127.5, 0.0][..]));
    }

    #[test]
    fn plane_accessor() {
        let loader = mock_loader("/rg.png", red_green());
        let bgr = loader
            .load_bgr("/rg.png", TargetSize::natural(), MeanRgb::ZERO)
            .unwrap();
        assert_eq!(bgr.plane(2), Some(&[255.0, 0.0][..]));
        assert_eq!(bgr.plane(3), None);

        let rgba = loader.load_rgba("/rg.png", TargetSize::natural()).unwrap();
        assert_eq!(rgba.plane(0), None);
    }

    #[test]
    fn release_returns_bytes_to_allocator() {
        let loader = mock_loader("/rg.png", red_green());
        let loaded = loader.load_rgba("/rg.png", TargetSize::natural()).unwrap();
        assert_eq!(loader.allocator().live_bytes(), 32);

        loader.release(loaded);
        assert_eq!(loader.allocator().live_bytes(), 0);
    }

    fn resized(loader: &ImageLoader<MockBackend, HostAllocator>) -> bool {
        loader
            .backend()
            .get_operations()
            .iter()
            .any(|op| matches!(op, RecordedOp::Resize { .. }))
    }

    #[test]
    fn oversized_request_is_invalid_before_resize() {
        let loader = mock_loader("/a.png", RgbaImage::new(8, 6));
        let err = loader
            .load_rgba("/a.png", TargetSize::new(u32::MAX, u32::MAX))
            .unwrap_err();

        assert!(matches!(err, LoadError::InvalidArgument(_)), "{err}");
        assert_eq!(loader.allocator().allocation_count(), 0);
        assert!(!resized(&loader));
    }

    #[test]
    fn over_budget_request_fails_before_resize() {
        let loader = ImageLoader::with_parts(
            MockBackend::with_image("/a.png", RgbaImage::new(8, 6)),
            HostAllocator::with_budget(64),
        );
        let err = loader
            .load_rgb("/a.png", TargetSize::new(100, 50), MeanRgb::ZERO)
            .unwrap_err();

        assert!(
            matches!(err, LoadError::Allocation { bytes: 60_000, .. }),
            "{err}"
        );
        assert!(!resized(&loader));
        assert_eq!(loader.allocator().live_bytes(), 0);
    }

    #[test]
    fn from_config_keeps_configured_mean() {
        let config =
            LoaderConfig::parse("[conversion]\nmean = [104.0, 117.0, 123.0]\n").unwrap();
        let loader = ImageLoader::from_config(&config);
        assert_eq!(loader.mean(), MeanRgb::new(104.0, 117.0, 123.0));
        assert_eq!(ImageLoader::new().mean(), MeanRgb::ZERO);
    }
}
