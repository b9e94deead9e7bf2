//! Record store configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_GRAB_SIZE, DEFAULT_RECORDS_PER_WINDOW, DEFAULT_WINDOW_COUNT};

/// Errors raised while loading or saving a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this structure.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The values parsed but are out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration shared by every fixed-record store.
///
/// # Example
///
/// ```rust
/// use grove_common::config::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.grab_size, 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of identifiers per free-list batch.
    /// Default: 1024
    #[serde(default = "default_grab_size")]
    pub grab_size: usize,

    /// Window pool settings.
    #[serde(default)]
    pub windows: WindowConfig,

    /// Whether `flush` and `close` fsync the data file.
    /// Default: true
    #[serde(default = "default_sync_on_close")]
    pub sync_on_close: bool,
}

/// Window pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Number of windows in the pool.
    /// Default: 64
    #[serde(default = "default_window_count")]
    pub count: usize,

    /// Number of consecutive records each window covers.
    /// Default: 1024
    #[serde(default = "default_records_per_window")]
    pub records_per_window: usize,
}

fn default_grab_size() -> usize {
    DEFAULT_GRAB_SIZE
}

fn default_sync_on_close() -> bool {
    true
}

fn default_window_count() -> usize {
    DEFAULT_WINDOW_COUNT
}

fn default_records_per_window() -> usize {
    DEFAULT_RECORDS_PER_WINDOW
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            count: default_window_count(),
            records_per_window: default_records_per_window(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            grab_size: default_grab_size(),
            windows: WindowConfig::default(),
            sync_on_close: default_sync_on_close(),
        }
    }
}

impl StoreConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a minimal configuration for testing.
    ///
    /// The pool is small enough that ordinary tests exercise eviction.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            grab_size: 8,
            windows: WindowConfig {
                count: 4,
                records_per_window: 16,
            },
            sync_on_close: false,
        }
    }

    /// Sets the allocator grab size.
    #[must_use]
    pub fn with_grab_size(mut self, grab_size: usize) -> Self {
        self.grab_size = grab_size;
        self
    }

    /// Sets the number of windows.
    #[must_use]
    pub fn with_window_count(mut self, count: usize) -> Self {
        self.windows.count = count;
        self
    }

    /// Sets the number of records per window.
    #[must_use]
    pub fn with_records_per_window(mut self, records: usize) -> Self {
        self.windows.records_per_window = records;
        self
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.grab_size == 0 {
            return Err("grab_size must be > 0".to_string());
        }
        if self.windows.count == 0 {
            return Err("windows.count must be > 0".to_string());
        }
        if self.windows.records_per_window == 0 {
            return Err("windows.records_per_window must be > 0".to_string());
        }
        Ok(())
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
