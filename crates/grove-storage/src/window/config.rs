//! Window pool configuration.

use grove_common::config::StoreConfig;
use grove_common::constants::{DEFAULT_RECORDS_PER_WINDOW, DEFAULT_WINDOW_COUNT};

/// Configuration for a window pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPoolConfig {
    /// Number of windows in the pool.
    pub window_count: usize,
    /// Number of consecutive records covered by one window.
    pub records_per_window: usize,
    /// Size of one record in bytes.
    pub record_size: usize,
}

impl WindowPoolConfig {
    /// Creates a default configuration for records of `record_size` bytes.
    pub fn new(record_size: usize) -> Self {
        Self {
            window_count: DEFAULT_WINDOW_COUNT,
            records_per_window: DEFAULT_RECORDS_PER_WINDOW,
            record_size,
        }
    }

    /// Derives the pool settings of a store.
    pub fn from_store_config(config: &StoreConfig, record_size: usize) -> Self {
        Self {
            window_count: config.windows.count,
            records_per_window: config.windows.records_per_window,
            record_size,
        }
    }

    /// Sets the number of windows.
    pub fn with_window_count(mut self, window_count: usize) -> Self {
        self.window_count = window_count;
        self
    }

    /// Sets the number of records per window.
    pub fn with_records_per_window(mut self, records_per_window: usize) -> Self {
        self.records_per_window = records_per_window;
        self
    }

    /// Returns the size of one window in bytes.
    pub fn window_bytes(&self) -> usize {
        self.records_per_window * self.record_size
    }

    /// Returns the total memory used by the pool.
    pub fn memory_usage(&self) -> usize {
        self.window_count * self.window_bytes()
    }

    /// Returns the first record of the window covering `record`.
    #[inline]
    pub fn window_start(&self, record: u64) -> u64 {
        let per_window = self.records_per_window as u64;
        record / per_window * per_window
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.window_count == 0 {
            return Err("window_count must be > 0");
        }
        if self.records_per_window == 0 {
            return Err("records_per_window must be > 0");
        }
        if self.record_size == 0 {
            return Err("record_size must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = WindowPoolConfig::new(9);
        assert_eq!(config.window_count, DEFAULT_WINDOW_COUNT);
        assert_eq!(config.window_bytes(), DEFAULT_RECORDS_PER_WINDOW * 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_store_config() {
        let store = StoreConfig::for_testing();
        let config = WindowPoolConfig::from_store_config(&store, 33);
        assert_eq!(config.window_count, 4);
        assert_eq!(config.records_per_window, 16);
        assert_eq!(config.memory_usage(), 4 * 16 * 33);
    }

    #[test]
    fn test_window_start() {
        let config = WindowPoolConfig::new(9).with_records_per_window(16);
        assert_eq!(config.window_start(0), 0);
        assert_eq!(config.window_start(15), 0);
        assert_eq!(config.window_start(16), 16);
        assert_eq!(config.window_start(40), 32);
    }

    #[test]
    fn test_validation() {
        assert!(WindowPoolConfig::new(0).validate().is_err());
        assert!(WindowPoolConfig::new(9)
            .with_window_count(0)
            .validate()
            .is_err());
        assert!(WindowPoolConfig::new(9)
            .with_records_per_window(0)
            .validate()
            .is_err());
    }
}
