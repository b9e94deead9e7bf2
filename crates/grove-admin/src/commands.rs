//! Subcommand implementations.
//!
//! Each command dispatches on the store kind to the matching
//! [`FixedRecordStore`] instantiation.

use std::path::Path;

use anyhow::{Context, Result};
use grove_common::config::StoreConfig;
use grove_storage::id::{IdAllocator, IdFileHeader};
use grove_storage::store::{
    FixedRecordStore, NodeRecord, NodeStore, RebuildReport, Record, RelationshipRecord,
    RelationshipStore, StoreKind, StoreStats,
};
use tracing::{info, warn};

/// Loads a store configuration file, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<StoreConfig> {
    match path {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(StoreConfig::default()),
    }
}

/// Creates an empty store.
pub fn create(kind: StoreKind, path: &Path) -> Result<()> {
    match kind {
        StoreKind::Node => NodeStore::create(path)?,
        StoreKind::Relationship => RelationshipStore::create(path)?,
    }
    Ok(())
}

/// Opens a store, snapshots its statistics and closes it again.
pub fn stats(kind: StoreKind, path: &Path, config: &StoreConfig) -> Result<StoreStats> {
    match kind {
        StoreKind::Node => stats_of::<NodeRecord>(path, config),
        StoreKind::Relationship => stats_of::<RelationshipRecord>(path, config),
    }
}

/// Rebuilds the id file of a store that is not open.
pub fn rebuild(kind: StoreKind, path: &Path) -> Result<RebuildReport> {
    let report = match kind {
        StoreKind::Node => NodeStore::rebuild_id_allocator(path)?,
        StoreKind::Relationship => RelationshipStore::rebuild_id_allocator(path)?,
    };
    if report.sentinel_restored {
        warn!(path = %path.display(), "reserved record 0 was missing and has been rewritten");
    }
    Ok(report)
}

/// Reads an id file header.
pub fn ids(path: &Path) -> Result<IdFileHeader> {
    let header = IdAllocator::read_header(path)?;
    if header.sticky {
        warn!(
            path = %path.display(),
            "id file is sticky; its owner is running or crashed"
        );
    }
    Ok(header)
}

// -------------------------------------------------------------------------
// Private helpers
// -------------------------------------------------------------------------

fn stats_of<R: Record>(path: &Path, config: &StoreConfig) -> Result<StoreStats> {
    let store = FixedRecordStore::<R>::open(path, config)
        .with_context(|| format!("opening {} store {}", R::KIND, path.display()))?;
    let stats = store.stats();
    store.close()?;
    info!(kind = %R::KIND, path = %path.display(), "read store statistics");
    Ok(stats?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_common::ErrorKind;
    use grove_storage::store::{id_file_path, StoreError};
    use tempfile::tempdir;

    #[test]
    fn test_create_then_stats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rels.db");

        create(StoreKind::Relationship, &path).unwrap();
        assert!(id_file_path(&path).exists());

        let snapshot = stats(StoreKind::Relationship, &path, &StoreConfig::for_testing()).unwrap();
        assert_eq!(snapshot.kind, StoreKind::Relationship);
        assert_eq!(snapshot.high_id, 1);
        assert_eq!(snapshot.ids_in_use, 1);
        assert_eq!(snapshot.free_ids, 0);

        // stats closed the store, so it opens again
        stats(StoreKind::Relationship, &path, &StoreConfig::for_testing()).unwrap();
    }

    #[test]
    fn test_stats_on_wrong_kind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.db");
        create(StoreKind::Node, &path).unwrap();

        let err = stats(StoreKind::Relationship, &path, &StoreConfig::default()).unwrap_err();
        let store_err = err.downcast_ref::<StoreError>().unwrap();
        assert_eq!(store_err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn test_rebuild_and_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.db");
        create(StoreKind::Node, &path).unwrap();

        let report = rebuild(StoreKind::Node, &path).unwrap();
        assert_eq!(report.high_id, 1);

        let header = ids(&id_file_path(&path)).unwrap();
        assert!(!header.sticky);
        assert_eq!(header.high_id, 1);
        assert_eq!(header.free_ids, 0);
    }

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, "grab_size = 32\n").unwrap();

        assert_eq!(load_config(Some(&path)).unwrap().grab_size, 32);
        assert_eq!(load_config(None).unwrap(), StoreConfig::default());
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
