//! TOML configuration file support.
//!
//! ```toml
//! # mdv2rainbow.toml
//! [export]
//! fields = ["DBZ", "VEL"]
//! compression_level = 9
//! date_subdir = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use mdv2rainbow::convert::ConversionConfig;

/// Root configuration structure for mdv2rainbow.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Settings for writing Rainbow volumes.
#[derive(Debug, Default, Deserialize)]
pub struct ExportConfig {
    /// Subset of the exported fields.
    pub fields: Option<Vec<String>>,

    /// zlib level for blobs (0-9).
    pub compression_level: Option<u32>,

    /// Write into a YYYYMMDD/ subdirectory.
    pub date_subdir: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Resolve the conversion settings; `fields` from the command line wins.
    pub fn resolve(self, fields: Option<Vec<String>>) -> ConversionConfig {
        let defaults = ConversionConfig::default();
        ConversionConfig {
            fields: fields.or(self.export.fields),
            compression_level: self
                .export
                .compression_level
                .unwrap_or(defaults.compression_level),
            date_subdir: self.export.date_subdir.unwrap_or(defaults.date_subdir),
        }
    }
}
