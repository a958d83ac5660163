//! Configuration file support for the benchmark target.
//!
//! Loads and validates target configuration from TOML files.
//! Default location: /etc/benchtarget/benchtarget.toml

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::buffers::{MAX_IMAGE_DIM, MAX_SPECTRUM_LENGTH, MIN_DIM};
use crate::error::{BenchmarkError, Result};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/benchtarget/benchtarget.toml";

/// Initial buffer shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Spectrum length at construction
    #[serde(default = "default_spectrum_length")]
    pub spectrum_length: usize,

    /// Image rows at construction
    #[serde(default = "default_image_dim")]
    pub image_rows: usize,

    /// Image columns at construction
    #[serde(default = "default_image_dim")]
    pub image_cols: usize,
}

/// Writable scalar configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarConfig {
    /// Value returned before the first write
    #[serde(default)]
    pub initial_value: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive passed to the subscriber (e.g. "info", "benchtarget=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON formatted log lines
    #[serde(default)]
    pub json: bool,
}

/// Complete benchmark target configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub buffers: BufferConfig,

    #[serde(default)]
    pub scalar: ScalarConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_spectrum_length() -> usize {
    MAX_SPECTRUM_LENGTH
}

fn default_image_dim() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            spectrum_length: default_spectrum_length(),
            image_rows: default_image_dim(),
            image_cols: default_image_dim(),
        }
    }
}

impl Default for ScalarConfig {
    fn default() -> Self {
        Self { initial_value: 0.0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl TargetConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| {
                BenchmarkError::configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(BenchmarkError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BenchmarkError::configuration(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            BenchmarkError::configuration(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path.as_ref(), content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let b = &self.buffers;
        if !(MIN_DIM..=MAX_SPECTRUM_LENGTH).contains(&b.spectrum_length) {
            return Err(BenchmarkError::configuration(format!(
                "spectrum_length must be {}-{}",
                MIN_DIM, MAX_SPECTRUM_LENGTH
            )));
        }

        if !(MIN_DIM..=MAX_IMAGE_DIM).contains(&b.image_rows)
            || !(MIN_DIM..=MAX_IMAGE_DIM).contains(&b.image_cols)
        {
            return Err(BenchmarkError::configuration(format!(
                "image_rows and image_cols must be {}-{}",
                MIN_DIM, MAX_IMAGE_DIM
            )));
        }

        if !self.scalar.initial_value.is_finite() {
            return Err(BenchmarkError::configuration(
                "scalar initial_value must be finite",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(BenchmarkError::configuration("logging level must not be empty"));
        }

        Ok(())
    }
}
