//! Loader configuration.
//!
//! Handles loading and validating `imgstage.toml`. Every key is optional;
//! stock defaults reproduce plain conversion (nearest-neighbour resize, no
//! mean, no scaling, no allocation budget).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! filter = "nearest"        # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [conversion]
//! mean = [0.0, 0.0, 0.0]    # Subtracted per plane for rgb/bgr layouts
//! scale = 1.0               # Multiplier applied after mean subtraction
//!
//! [memory]
//! max_bytes = 268435456     # Allocation budget (omit for unlimited)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! # Caffe-style BGR mean
//! [conversion]
//! mean = [104.0, 117.0, 123.0]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{MeanRgb, ResizeFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Loader configuration loaded from `imgstage.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Resampling used when an exact size is requested.
    pub resize: ResizeConfig,
    /// Mean and scale for planar layouts.
    pub conversion: ConversionConfig,
    /// Allocation limits.
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResizeFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub mean: MeanRgb,
    pub scale: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mean: MeanRgb::ZERO,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

impl LoaderConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate config text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.conversion.mean.is_finite() {
            return Err(ConfigError::Validation(
                "conversion.mean values must be finite".into(),
            ));
        }
        if !self.conversion.scale.is_finite() || self.conversion.scale == 0.0 {
            return Err(ConfigError::Validation(
                "conversion.scale must be finite and non-zero".into(),
            ));
        }
        if self.memory.max_bytes == Some(0) {
            return Err(ConfigError::Validation(
                "memory.max_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Load the config at `path`, or stock defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<LoaderConfig, ConfigError> {
    match path {
        Some(p) => LoaderConfig::load(p),
        None => Ok(LoaderConfig::default()),
    }
}

/// Documented stock config, suitable for `imgstage gen-config`.
pub fn stock_config_toml() -> &'static str {
    r#"# imgstage configuration
# All options are optional; the values below are the defaults.

[resize]
# Resampling filter for exact resizes:
# nearest | triangle | catmull-rom | gaussian | lanczos3
filter = "nearest"

[conversion]
# Subtracted per output plane for rgb/bgr layouts (first value hits the
# first plane, so it is blue for bgr).
mean = [0.0, 0.0, 0.0]
# Multiplier applied after mean subtraction. 1.0 keeps the 0-255 range;
# use 0.00392156862745098 (1/255) to normalize to 0-1.
scale = 1.0

[memory]
# Upper bound on bytes held by live buffers. Omit for unlimited.
# max_bytes = 268435456
"#
}
