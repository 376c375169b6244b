use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CatalogError, Result};

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory for exported catalog and report files.
    pub output_dir: String,
    /// Optional taxonomy TOML file; the built-in taxonomy is used when unset.
    pub taxonomy_path: Option<String>,
    /// Confidence threshold below which the validator flags a record.
    pub low_confidence_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            taxonomy_path: None,
            low_confidence_threshold: 0.3,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the
    /// defaults; a present but malformed file is an error.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("failed to read config file '{path}': {e}"))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
