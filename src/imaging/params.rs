//! Parameter types for image conversion.
//!
//! These structs describe *what* to produce, not *how*. They are the interface
//! between the [`loader`](crate::loader) (which decides the output shape) and
//! the [`backend`](super::backend) / [`layout`](super::layout) code that does
//! the pixel work.
//!
//! ## Types
//!
//! - [`PixelLayout`] — Output arrangement: interleaved RGBA, planar RGB, planar BGR.
//! - [`TargetSize`] — Requested resize; zero in either axis means natural size.
//! - [`MeanRgb`] — Per-plane mean subtracted before storage.
//! - [`Conversion`] — Mean plus the post-subtraction scale factor.
//! - [`ResizeFilter`] — Resampling filter used for exact resizes.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Float layout of the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// `R,G,B,1.0` per pixel.
    Rgba,
    /// R-plane, G-plane, B-plane.
    Rgb,
    /// B-plane, G-plane, R-plane.
    Bgr,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgba => 4,
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
        }
    }

    pub fn is_planar(self) -> bool {
        !matches!(self, PixelLayout::Rgba)
    }

    /// Channel names in buffer order.
    pub fn channel_names(self) -> &'static [&'static str] {
        match self {
            PixelLayout::Rgba => &["r", "g", "b", "a"],
            PixelLayout::Rgb => &["r", "g", "b"],
            PixelLayout::Bgr => &["b", "g", "r"],
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelLayout::Rgba => "rgba",
            PixelLayout::Rgb => "rgb",
            PixelLayout::Bgr => "bgr",
        };
        f.write_str(name)
    }
}

/// Requested output size.
///
/// The image is resized only when both axes are non-zero; otherwise the
/// decoded size is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Keep the decoded size.
    pub fn natural() -> Self {
        Self::default()
    }

    /// The exact resize target, if one was requested.
    pub fn exact(self) -> Option<(u32, u32)> {
        (self.width != 0 && self.height != 0).then_some((self.width, self.height))
    }
}

impl From<(u32, u32)> for TargetSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Mean subtracted per output plane.
///
/// Components apply by plane position: `[0]` to the first plane, `[1]` to the
/// second, `[2]` to the third. For BGR output that means `[0]` is subtracted
/// from blue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeanRgb(pub [f32; 3]);

impl MeanRgb {
    pub const ZERO: MeanRgb = MeanRgb([0.0; 3]);

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self([x, y, z])
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl FromStr for MeanRgb {
    type Err = String;

    /// Parses `"x,y,z"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected three comma-separated values, got '{s}'"));
        }
        let mut values = [0.0f32; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|e| format!("invalid mean component '{part}': {e}"))?;
        }
        Ok(Self(values))
    }
}

/// Value transform applied to each channel: `(value - mean) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub mean: MeanRgb,
    pub scale: f32,
}

impl Conversion {
    pub fn with_mean(mean: MeanRgb) -> Self {
        Self {
            mean,
            ..Self::default()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.scale.is_finite()
    }
}

impl Default for Conversion {
    /// No mean, no scaling: values stay in the native 0–255 range.
    fn default() -> Self {
        Self {
            mean: MeanRgb::ZERO,
            scale: 1.0,
        }
    }
}

/// Resampling filter for exact resizes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}
