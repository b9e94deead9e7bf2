//! Buffered window pool for fixed-record stores.
//!
//! A store reads and writes records through windows: in-memory copies of
//! `records_per_window` consecutive records, aligned to multiples of that
//! count. The pool holds a fixed number of windows and provides:
//!
//! - **Windowed caching**: keep recently used record runs in memory
//! - **Pinning**: a window held by a guard is never evicted
//! - **Dirty tracking**: modified windows are written back on eviction
//!   and on flush
//! - **LRU eviction**: the least recently acquired unpinned window goes
//! - **Direct transfer**: records outside every window can be read or
//!   written straight through the file
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        WindowPool                               │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │          PoolState (one mutex)                            │  │
//! │  │   index: HashMap<first_record, slot>                      │  │
//! │  │   meta:  [first_record, pins, last_access] per slot       │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                              │                                  │
//! │                              ▼                                  │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐     ┌──────────┐  │  │
//! │  │  │ Window 0 │ │ Window 1 │ │ Window 2 │ ... │ Window N │  │  │
//! │  │  │ Mutex<   │ │ Mutex<   │ │ Mutex<   │     │ Mutex<   │  │  │
//! │  │  │  bytes>  │ │  bytes>  │ │  bytes>  │     │  bytes>  │  │  │
//! │  │  │ dirty    │ │ dirty    │ │ dirty    │     │ dirty    │  │  │
//! │  │  └──────────┘ └──────────┘ └──────────┘     └──────────┘  │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                              │                                  │
//! │                              ▼                                  │
//! │                 LruReplacer (victim selection)                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use grove_storage::file::{OpenMode, StandardFile};
//! use grove_storage::window::{WindowPool, WindowPoolConfig};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = Arc::new(StandardFile::open("nodes.db", OpenMode::CreateNew)?);
//!     let pool = WindowPool::new(WindowPoolConfig::new(9), file)?;
//!
//!     let mut window = pool.acquire(42)?;
//!     window.record_bytes_mut(42)[0] = 1;
//!     drop(window); // unpinned here
//!
//!     pool.flush_all()?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod eviction;
mod guard;
mod pool;
mod window;

use serde::{Deserialize, Serialize};

pub use config::WindowPoolConfig;
pub use error::{WindowError, WindowResult};
pub use eviction::LruReplacer;
pub use guard::WindowGuard;
pub use pool::WindowPool;

/// Statistics for window pool monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPoolStats {
    /// Total number of window acquisitions.
    pub acquisitions: u64,
    /// Number of acquisitions served by a resident window.
    pub hits: u64,
    /// Number of acquisitions that loaded a window.
    pub misses: u64,
    /// Number of windows evicted.
    pub evictions: u64,
    /// Number of dirty windows written back.
    pub flushes: u64,
    /// Number of direct record transfers.
    pub transfers: u64,
    /// Current number of pinned windows.
    pub pinned_windows: usize,
    /// Current number of dirty windows.
    pub dirty_windows: usize,
}

impl WindowPoolStats {
    /// Returns the window hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        if self.acquisitions == 0 {
            0.0
        } else {
            self.hits as f64 / self.acquisitions as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_hit_ratio() {
        let mut stats = WindowPoolStats::default();
        assert_eq!(stats.hit_ratio(), 0.0);

        stats.acquisitions = 4;
        stats.hits = 3;
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = WindowPoolStats {
            acquisitions: 2,
            hits: 1,
            misses: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"acquisitions\":2"));
    }
}
