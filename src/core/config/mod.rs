//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$CSTORE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cstore/config.toml`
//! 3. `~/.cstore/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use cstore::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Store: {}", config.store_dir().unwrap().display());
//! println!("Stop batch on error: {}", config.batch_stop_on_error());
//! ```

pub mod schema;

pub use schema::{BatchConfig, SchemaConfig, StoreConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::schema::PatternSchema;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CSTORE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with accessors that apply defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents.
    pub file: StoreConfig,
    /// Path of the file that was loaded, if any.
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. A missing file is not an error.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: StoreConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Config {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Locate the first existing config file.
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("cstore/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".cstore/config.toml"))
            .filter(|path| path.exists())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Store directory.
    ///
    /// Defaults to `<data_dir>/cstore`, falling back to `~/.cstore/store`.
    pub fn store_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.file.store_dir {
            return Ok(PathBuf::from(dir));
        }
        if let Some(data) = dirs::data_dir() {
            return Ok(data.join("cstore"));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".cstore/store"))
    }

    /// Configured tracing filter.
    pub fn log_filter(&self) -> Option<&str> {
        self.file.log_filter.as_deref()
    }

    /// Whether batch processing stops at the first failure.
    ///
    /// Defaults to `false`.
    pub fn batch_stop_on_error(&self) -> bool {
        self.file
            .batch
            .as_ref()
            .and_then(|b| b.stop_on_error)
            .unwrap_or(false)
    }

    /// Build the pattern schema from the `[schema]` section.
    pub fn schema(&self) -> Result<PatternSchema, ConfigError> {
        PatternSchema::from_config(&self.file.schema.clone().unwrap_or_default())
    }

    /// Path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
