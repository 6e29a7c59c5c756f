//! Configuration management for Retail Insights.
//!
//! Handles loading configuration from a TOML file with sections for the order
//! store, CSV decoding, segmentation thresholds and synthetic generation.

use crate::error::{InsightsError, Result};
use crate::segment::SegmentThresholds;
use crate::source::{CsvOptions, GeneratorConfig};
use crate::store::StoreLocation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Order store location.
    #[serde(default)]
    pub store: StoreConfig,

    /// CSV decoding options.
    #[serde(default)]
    pub source: CsvOptions,

    /// Customer segmentation thresholds.
    #[serde(default)]
    pub segmentation: SegmentThresholds,

    /// Synthetic data generation parameters.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Order store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file path, or `:memory:`. Absent means the platform default.
    pub path: Option<String>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retail-insights")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| InsightsError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses and validates configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            InsightsError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        self.source.resolve_encoding()?;
        self.source.delimiter_byte()?;
        self.segmentation.validate()?;
        self.generator.validate()
    }

    /// Resolves the configured store location.
    pub fn store_location(&self) -> StoreLocation {
        match self.store.path.as_deref() {
            Some(path) if !path.trim().is_empty() => StoreLocation::parse(path),
            _ => StoreLocation::default_file(),
        }
    }
}
