//! Application configuration loaded from a TOML file.
//!
//! Looked up at `<config dir>/study-assistant/config.toml` unless a path is
//! given explicitly. A missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Where "now" comes from when scheduling reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// Wall-clock time.
    #[default]
    System,
    /// Date stored in the database, moved forward with `advance_day`.
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    pub clock: ClockMode,
    /// Shuffle due cards at the start of a study session
    pub shuffle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            clock: ClockMode::default(),
            shuffle: true,
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, or from the default location when
    /// `path` is `None`. Only an explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (default_config_path(), false),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() && !required {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&contents)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "database_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("study-assistant").join("config.toml"))
}

/// Falls back to `db.sqlite3` in the working directory when the platform has
/// no data directory.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|base| base.join("study-assistant").join("study.sqlite3"))
        .unwrap_or_else(|| PathBuf::from("db.sqlite3"))
}
