//! TOML configuration.
//!
//! Every field has a default, so a missing file or a partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{GraphConfig, HighlightOptions, DEFAULT_HIGH_PATCH_SET_COUNT_THRESHOLD};

pub const CONFIG_DIR_NAME: &str = "reviewstats";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserdataConfig {
    pub high_patch_set_count_threshold: usize,
}

impl Default for UserdataConfig {
    fn default() -> Self {
        Self {
            high_patch_set_count_threshold: DEFAULT_HIGH_PATCH_SET_COUNT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewStatsConfig {
    pub graph: GraphConfig,
    pub userdata: UserdataConfig,
    pub highlighter: HighlightOptions,
}

impl ReviewStatsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.graph.relative_link_value_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "graph.relative_link_value_threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(())
    }
}

/// `<config dir>/reviewstats/config.toml`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Loads and validates the config at `path`; a missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<ReviewStatsConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(ReviewStatsConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let config: ReviewStatsConfig = toml::from_str(&raw)?;
    config.validate()?;
    Ok(normalize_config(config))
}

/// Writes the default config to `path` unless a file is already there.
pub fn ensure_config(path: impl AsRef<Path>) -> Result<ReviewStatsConfig, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = ReviewStatsConfig::default();
    fs::write(path, toml::to_string_pretty(&config)?)?;
    info!("wrote default config to {}", path.display());
    Ok(config)
}

fn normalize_config(mut config: ReviewStatsConfig) -> ReviewStatsConfig {
    config.graph.centered_identifier = config
        .graph
        .centered_identifier
        .take()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty());
    config
}
