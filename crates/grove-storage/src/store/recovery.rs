//! Allocator rebuild after an unclean shutdown.
//!
//! When a store crashes its allocator file stays sticky and its data file
//! has no trailer. [`FixedRecordStore::rebuild_id_allocator`] scans the
//! data file and writes a clean allocator whose free list holds exactly
//! the unused slots below the last record in use.
//!
//! The usual sequence after a crash:
//!
//! ```text
//! rebuild_id_allocator ─► open ─► set_mode(RecoveryReplay)
//!     ─► replay update_record ... ─► set_mode(NormalOperation)
//! ```
//!
//! Replay may bring back records whose ids the rebuild put on the free
//! list, or delete records without freeing them. Leaving replay (or
//! closing during it) scans the records again and replaces the open
//! allocator's free list, so normal operation never hands out a live id.

use std::path::Path;

use grove_common::types::RecordId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{StoreError, StoreResult};
use super::fixed::{check_path, id_file_path, read_trailer, FixedRecordStore};
use super::kind::StoreKind;
use super::record::{encoded_in_use, Record};
use crate::file::{FileHandle, OpenMode, StandardFile};
use crate::id::IdAllocator;

/// Records read per step while scanning a data file.
const SCAN_BATCH: usize = 4096;

/// Outcome of an allocator rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Store kind.
    pub kind: StoreKind,
    /// New high id.
    pub high_id: u64,
    /// Number of ids put on the free list.
    pub free_ids: u64,
    /// Number of record slots scanned.
    pub records_scanned: u64,
    /// Whether the reserved record at id 0 had to be rewritten.
    pub sentinel_restored: bool,
}

impl<R: Record> FixedRecordStore<R> {
    /// Recreates the allocator file of a store from its data file.
    ///
    /// The store must not be open. A matching trailer is stripped; without
    /// one the file is cut to whole records. The high id becomes one past
    /// the last record in use (at least 1), every free slot below it goes
    /// on the free list, and the trailer is rewritten.
    pub fn rebuild_id_allocator(path: impl AsRef<Path>) -> StoreResult<RebuildReport> {
        let path = path.as_ref();
        check_path(path)?;

        let file = StandardFile::open(path, OpenMode::ReadWrite)
            .map_err(|e| StoreError::from_open(e, path))?;
        let len = file.size()?;
        let record_size = R::SIZE as u64;

        let data_len = match read_trailer(&file, len)? {
            Some(kind) if kind == R::KIND => len - R::KIND.descriptor().len() as u64,
            Some(kind) => {
                return Err(StoreError::corrupt(
                    path,
                    format!("file holds a {kind} store, expected {}", R::KIND),
                ));
            }
            None => len - len % record_size,
        };
        let records = data_len / record_size;

        let RecordScan {
            mut free,
            last_in_use,
            sentinel_in_use,
        } = scan_records::<R>(&file, records)?;

        let high_id = last_in_use.map_or(1, |last| last + 1);
        free.retain(|&id| id < high_id);

        if !sentinel_in_use {
            warn!(kind = %R::KIND, path = %path.display(), "restoring reserved record 0");
            let mut sentinel = vec![0u8; R::SIZE];
            R::reserved(RecordId::FIRST).encode(&mut sentinel);
            file.write_all_at(&sentinel, 0)?;
        }

        IdAllocator::write_fresh(id_file_path(path), high_id, &free)?;

        let offset = high_id * record_size;
        let descriptor = R::KIND.descriptor().as_bytes();
        file.write_all_at(descriptor, offset)?;
        file.set_len(offset + descriptor.len() as u64)?;
        file.sync()?;

        let report = RebuildReport {
            kind: R::KIND,
            high_id,
            free_ids: free.len() as u64,
            records_scanned: records,
            sentinel_restored: !sentinel_in_use,
        };
        info!(
            kind = %R::KIND,
            path = %path.display(),
            high_id,
            free_ids = report.free_ids,
            records_scanned = records,
            "rebuilt id allocator"
        );
        Ok(report)
    }
}

/// In-use summary of the first records of a data file.
#[derive(Debug, Default)]
pub(super) struct RecordScan {
    /// Ids above 0 whose slot is not in use, ascending.
    pub(super) free: Vec<u64>,
    /// Greatest id in use.
    pub(super) last_in_use: Option<u64>,
    /// Whether the reserved record 0 is in use.
    pub(super) sentinel_in_use: bool,
}

/// Scans records `[0, records)`; slots past the end of the file read as
/// not in use.
pub(super) fn scan_records<R: Record>(
    file: &StandardFile,
    records: u64,
) -> StoreResult<RecordScan> {
    let mut scan = RecordScan::default();
    let mut buf = vec![0u8; SCAN_BATCH * R::SIZE];
    let mut first = 0u64;

    while first < records {
        let count = (records - first).min(SCAN_BATCH as u64) as usize;
        let chunk = &mut buf[..count * R::SIZE];
        file.read_up_to_at(chunk, first * R::SIZE as u64)?;

        for (i, record) in chunk.chunks_exact(R::SIZE).enumerate() {
            let id = first + i as u64;
            if encoded_in_use(record) {
                scan.last_in_use = Some(id);
                scan.sentinel_in_use |= id == 0;
            } else if id != 0 {
                scan.free.push(id);
            }
        }
        first += count as u64;
    }
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NodeRecord, NodeStore, RelationshipStore};
    use grove_common::config::StoreConfig;
    use grove_common::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_rebuild_clean_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.db");
        NodeStore::create(&path).unwrap();

        let report = NodeStore::rebuild_id_allocator(&path).unwrap();
        assert_eq!(report.high_id, 1);
        assert_eq!(report.free_ids, 0);
        assert_eq!(report.records_scanned, 1);
        assert!(!report.sentinel_restored);

        let store = NodeStore::open(&path, &StoreConfig::for_testing()).unwrap();
        assert_eq!(store.next_id().unwrap(), RecordId::new(1));
        store.close().unwrap();
    }

    #[test]
    fn test_rebuild_after_crash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.db");
        NodeStore::create(&path).unwrap();

        {
            let store = NodeStore::open(&path, &StoreConfig::for_testing()).unwrap();
            for _ in 0..5 {
                let id = store.next_id().unwrap();
                store.update_record(&NodeRecord::new(id)).unwrap();
            }
            let mut node = store.get_record(RecordId::new(2)).unwrap();
            node.in_use = false;
            store.update_record(&node).unwrap();
            store.flush().unwrap();
            // crash: no close
        }

        let err = NodeStore::open(&path, &StoreConfig::for_testing()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sticky);

        let report = NodeStore::rebuild_id_allocator(&path).unwrap();
        assert_eq!(report.high_id, 6);
        assert_eq!(report.free_ids, 1);

        let store = NodeStore::open(&path, &StoreConfig::for_testing()).unwrap();
        assert_eq!(store.next_id().unwrap(), RecordId::new(2));
        assert_eq!(store.next_id().unwrap(), RecordId::new(6));
        assert!(store.get_record(RecordId::new(5)).unwrap().in_use);
        store.close().unwrap();
    }

    #[test]
    fn test_rebuild_restores_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.db");
        std::fs::write(&path, [0u8; 9 * 3]).unwrap();

        let report = NodeStore::rebuild_id_allocator(&path).unwrap();
        assert!(report.sentinel_restored);
        assert_eq!(report.high_id, 1);
        assert_eq!(report.records_scanned, 3);

        let store = NodeStore::open(&path, &StoreConfig::for_testing()).unwrap();
        assert!(store.get_record(RecordId::FIRST).unwrap().in_use);
        store.close().unwrap();
    }

    #[test]
    fn test_rebuild_rejects_other_kind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rels.db");
        RelationshipStore::create(&path).unwrap();

        let err = NodeStore::rebuild_id_allocator(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);

        let err = NodeStore::rebuild_id_allocator(dir.path().join("none.db")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
