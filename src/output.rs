//! CLI output formatting for loaded images.
//!
//! # Output Format
//!
//! ```text
//! photo.jpg
//!     Layout: bgr (planar, 3 channels)
//!     Size: 224 x 224 (50176 pixels)
//!     Buffer: 602112 bytes at 0x7f3a2c000000
//!     b: min -104.00  max 151.00  mean 12.37
//!     g: min -117.00  max 138.00  mean 3.02
//!     r: min -123.00  max 132.00  mean -1.85
//! ```
//!
//! # Architecture
//!
//! [`summarize`] builds a serializable [`ImageSummary`]; [`format_summary`]
//! renders it as lines (pure, no I/O) and [`print_summary`] writes them to
//! stdout. `--json` output serializes the same summary.

use crate::loader::LoadedImage;
use serde::Serialize;
use std::path::Path;

/// Per-channel value statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStats {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub mean: f64,
}

/// Everything the CLI reports about one load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSummary {
    pub path: String,
    pub layout: String,
    pub planar: bool,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub device_ptr: String,
    pub channels: Vec<ChannelStats>,
}

/// Collect dimensions, buffer info and per-channel stats.
pub fn summarize(path: &Path, image: &LoadedImage) -> ImageSummary {
    let layout = image.layout();
    let host = image.buffer().host();
    let pixels = image.pixel_count();
    let names = layout.channel_names();

    let channels = names
        .iter()
        .enumerate()
        .map(|(channel, &name)| {
            let values: Box<dyn Iterator<Item = f32> + '_> = if layout.is_planar() {
                Box::new(host[channel * pixels..(channel + 1) * pixels].iter().copied())
            } else {
                Box::new(host.iter().skip(channel).step_by(names.len()).copied())
            };
            channel_stats(name, values)
        })
        .collect();

    ImageSummary {
        path: path.display().to_string(),
        layout: layout.to_string(),
        planar: layout.is_planar(),
        width: image.width(),
        height: image.height(),
        bytes: image.buffer().byte_len(),
        device_ptr: image.buffer().device_ptr().to_string(),
        channels,
    }
}

fn channel_stats(name: &'static str, values: impl Iterator<Item = f32>) -> ChannelStats {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += f64::from(v);
        count += 1;
    }
    let mean = if count == 0 { 0.0 } else { sum / count as f64 };
    ChannelStats {
        name,
        min,
        max,
        mean,
    }
}

pub fn format_summary(summary: &ImageSummary) -> Vec<String> {
    let arrangement = if summary.planar {
        "planar"
    } else {
        "interleaved"
    };
    let mut lines = vec![
        summary.path.clone(),
        format!(
            "    Layout: {} ({arrangement}, {} channels)",
            summary.layout,
            summary.channels.len()
        ),
        format!(
            "    Size: {} x {} ({} pixels)",
            summary.width,
            summary.height,
            summary.width as u64 * summary.height as u64
        ),
        format!(
            "    Buffer: {} bytes at {}",
            summary.bytes, summary.device_ptr
        ),
    ];
    for c in &summary.channels {
        lines.push(format!(
            "    {}: min {:.2}  max {:.2}  mean {:.2}",
            c.name, c.min, c.max, c.mean
        ));
    }
    lines
}

pub fn print_summary(summary: &ImageSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
