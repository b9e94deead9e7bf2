//! Store snapshots for the management layer.

use serde::{Deserialize, Serialize};

use super::kind::StoreKind;
use crate::window::WindowPoolStats;

/// Operating mode of an open store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Regular operation: freeing a record releases its id.
    #[default]
    NormalOperation,
    /// Log replay after a crash: freeing a record keeps its id, and writes
    /// past the high id raise it.
    RecoveryReplay,
}

/// Lifecycle state of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    /// The store accepts operations.
    Open,
    /// The store has been closed.
    Closed,
}

/// Point-in-time statistics of an open store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Store kind.
    pub kind: StoreKind,
    /// Record size in bytes.
    pub record_size: usize,
    /// One past the greatest id ever allocated.
    pub high_id: u64,
    /// Ids currently in use.
    pub ids_in_use: u64,
    /// Ids currently free.
    pub free_ids: u64,
    /// Current mode.
    pub mode: StoreMode,
    /// Window pool statistics.
    pub windows: WindowPoolStats,
}

impl StoreStats {
    /// Returns the size of the record area in bytes.
    pub fn data_bytes(&self) -> u64 {
        self.high_id * self.record_size as u64
    }
}
