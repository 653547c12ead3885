//! Pure calculation functions for buffer sizes and offsets.
//!
//! All functions here are pure and testable without any I/O or images.

use std::mem::size_of;

/// Final output dimensions for a decoded image.
///
/// # Arguments
/// * `natural` - Decoded image dimensions (width, height)
/// * `requested` - Requested dimensions; `None` keeps the natural size
///
/// # Examples
/// ```
/// # use imgstage::imaging::calculations::output_dimensions;
/// assert_eq!(output_dimensions((640, 480), Some((100, 50))), (100, 50));
/// assert_eq!(output_dimensions((640, 480), None), (640, 480));
/// ```
pub fn output_dimensions(natural: (u32, u32), requested: Option<(u32, u32)>) -> (u32, u32) {
    requested.unwrap_or(natural)
}

/// Number of `f32` values needed for `width` x `height` pixels of `channels`.
///
/// Returns `None` when the product overflows `usize`.
pub fn buffer_len(width: u32, height: u32, channels: usize) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels)
}

/// Byte size of a float buffer of `len` values.
pub fn byte_size(len: usize) -> usize {
    len * size_of::<f32>()
}

/// Index of pixel `(x, y)` inside one plane (or one interleaved pixel slot).
#[inline]
pub fn pixel_index(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Index of pixel `(x, y)` in plane `plane` of a band-sequential buffer.
#[inline]
pub fn planar_index(plane: usize, x: u32, y: u32, width: u32, height: u32) -> usize {
    plane * (width as usize * height as usize) + pixel_index(x, y, width)
}
