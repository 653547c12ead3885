//! Pixel-layout conversion from a decoded 8-bit image into `f32` buffers.
//!
//! Two arrangements are produced:
//!
//! ```text
//! interleaved RGBA   R G B 1 | R G B 1 | R G B 1 ...        (pixel-interleaved)
//! planar RGB / BGR   R R R ... | G G G ... | B B B ...      (band-sequential)
//! ```
//!
//! Pixels are visited row-major (y outer, x inner). Within a plane, or within the
//! interleaved pixel slots, pixel `(x, y)` lives at `y * width + x`.

use super::backend::DecodedImage;
use super::calculations::pixel_index;
use super::params::{Conversion, PixelLayout};

/// Source channel feeding each output plane, indexed into `[r, g, b, a]`.
const RGB_PLANES: [usize; 3] = [0, 1, 2];
const BGR_PLANES: [usize; 3] = [2, 1, 0];

/// Write `image` into `out` using `layout`.
///
/// `out` must hold exactly `width * height * layout.channels()` values.
/// The mean and scale of `conversion` only apply to the planar layouts; RGBA
/// output stores raw channel values with alpha fixed at 1.0.
pub fn convert_into(
    image: &DecodedImage,
    layout: PixelLayout,
    conversion: &Conversion,
    out: &mut [f32],
) {
    match layout {
        PixelLayout::Rgba => write_interleaved_rgba(image, out),
        PixelLayout::Rgb => write_planar(image, RGB_PLANES, conversion, out),
        PixelLayout::Bgr => write_planar(image, BGR_PLANES, conversion, out),
    }
}

/// Interleaved `(R, G, B, 1.0)` per pixel. Source alpha is discarded.
fn write_interleaved_rgba(image: &DecodedImage, out: &mut [f32]) {
    let (width, height) = (image.width(), image.height());
    assert_eq!(
        out.len(),
        width as usize * height as usize * 4,
        "RGBA buffer does not match {width}x{height}"
    );

    for y in 0..height {
        for x in 0..width {
            let [r, g, b, _] = image.pixel_at(x, y);
            let base = pixel_index(x, y, width) * 4;
            out[base..base + 4].copy_from_slice(&[f32::from(r), f32::from(g), f32::from(b), 1.0]);
        }
    }
}

/// Band-sequential planes; `planes[i]` names the source channel of plane `i`.
fn write_planar(
    image: &DecodedImage,
    planes: [usize; 3],
    conversion: &Conversion,
    out: &mut [f32],
) {
    let (width, height) = (image.width(), image.height());
    let plane_len = width as usize * height as usize;
    assert_eq!(
        out.len(),
        plane_len * 3,
        "planar buffer does not match {width}x{height}"
    );

    let (first, rest) = out.split_at_mut(plane_len);
    let (second, third) = rest.split_at_mut(plane_len);
    let mut targets = [first, second, third];
    let Conversion { mean, scale } = *conversion;

    for y in 0..height {
        for x in 0..width {
            let px = image.pixel_at(x, y);
            let idx = pixel_index(x, y, width);
            for (plane, target) in targets.iter_mut().enumerate() {
                let value = f32::from(px[planes[plane]]);
                target[idx] = (value - mean.0[plane]) * scale;
            }
        }
    }
}
