//! Integration tests for the identifier allocator.
//!
//! These run whole allocator sessions against a real file: batches that
//! span close and reopen, changes of grab size between sessions, the top
//! of the id space, and crash detection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use grove_common::types::RecordId;
use grove_common::{ErrorKind, MAX_HIGH_ID};
use grove_storage::id::{IdAllocator, IdError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.id");
    IdAllocator::create(&path).unwrap();
    (dir, path)
}

fn next(ids: &IdAllocator) -> u64 {
    ids.allocate().unwrap().as_u64()
}

fn free(ids: &IdAllocator, id: u64) {
    ids.release(RecordId::new(id)).unwrap();
}

fn reopen(path: &Path, grab_size: usize) -> IdAllocator {
    IdAllocator::open(path, grab_size).unwrap()
}

#[test]
fn test_created_file_is_clean_header_only() {
    let (_dir, path) = setup();

    let ids = reopen(&path, 10);
    ids.close().unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; 9]);
}

#[test]
fn test_reuse_only_after_reopen() {
    let (_dir, path) = setup();

    let ids = reopen(&path, 3);
    for expected in 0..7 {
        assert_eq!(next(&ids), expected);
    }
    free(&ids, 1);
    free(&ids, 3);
    free(&ids, 5);
    assert_eq!(next(&ids), 7);
    free(&ids, 6);
    ids.close().unwrap();

    let ids = reopen(&path, 5);
    free(&ids, 2);
    free(&ids, 4);
    assert_eq!(next(&ids), 1);
    free(&ids, 1);
    assert_eq!(next(&ids), 3);
    free(&ids, 3);
    assert_eq!(next(&ids), 5);
    free(&ids, 5);
    assert_eq!(next(&ids), 6);
    free(&ids, 6);
    assert_eq!(next(&ids), 8);
    free(&ids, 8);
    assert_eq!(next(&ids), 9);
    free(&ids, 9);
    ids.close().unwrap();

    let ids = reopen(&path, 3);
    for expected in [2, 4, 1, 3, 5, 6, 8, 9, 10, 11] {
        assert_eq!(next(&ids), expected);
    }
    ids.close().unwrap();
}

#[test]
fn test_free_all_then_reuse_across_sessions() {
    let (_dir, path) = setup();

    let ids = reopen(&path, 3);
    for expected in 0..7 {
        assert_eq!(next(&ids), expected);
    }
    let err = ids.release(RecordId::new(7)).unwrap_err();
    assert!(matches!(err, IdError::NotAllocated { id: 7, high_id: 7 }));
    for id in 0..7 {
        free(&ids, id);
    }
    ids.close().unwrap();

    let ids = reopen(&path, 2);
    assert_eq!(next(&ids), 0);
    assert_eq!(next(&ids), 1);
    assert_eq!(next(&ids), 2);
    ids.close().unwrap();

    let ids = reopen(&path, 2);
    assert_eq!(next(&ids), 4);
    assert_eq!(next(&ids), 5);
    assert_eq!(next(&ids), 6);
    assert_eq!(next(&ids), 3);
    assert_eq!(ids.free_count(), 0);
    assert_eq!(next(&ids), 7);
    ids.close().unwrap();
}

#[test]
fn test_top_of_id_space() {
    let (_dir, path) = setup();
    let top = MAX_HIGH_ID - 1;

    let ids = reopen(&path, 1);
    ids.set_high_id(top).unwrap();
    assert_eq!(next(&ids), top);
    free(&ids, top);

    let err = ids.allocate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    assert!(err.is_fatal());
    ids.close().unwrap();

    let ids = reopen(&path, 1);
    assert_eq!(ids.high_id(), MAX_HIGH_ID);
    assert_eq!(next(&ids), top);
    assert_eq!(ids.allocate().unwrap_err().kind(), ErrorKind::CapacityExceeded);
    ids.close().unwrap();
}

#[test]
fn test_sticky_while_open() {
    let (_dir, path) = setup();

    let first = reopen(&path, 4);
    let err = IdAllocator::open(&path, 4).unwrap_err();
    assert!(matches!(err, IdError::Sticky { .. }));
    assert_eq!(err.kind(), ErrorKind::Sticky);

    first.close().unwrap();
    reopen(&path, 4).close().unwrap();
}

#[test]
fn test_crash_leaves_file_sticky() {
    let (_dir, path) = setup();

    {
        let ids = reopen(&path, 4);
        next(&ids);
        // dropped without close
    }

    assert!(IdAllocator::read_header(&path).unwrap().sticky);
    assert_eq!(
        IdAllocator::open(&path, 4).unwrap_err().kind(),
        ErrorKind::Sticky
    );
}

#[test]
fn test_odd_and_even_worst_case() {
    let capacity = 1024 * 8 + 1;

    for start in [1u64, 0] {
        let (_dir, path) = setup();

        let ids = reopen(&path, 128);
        for _ in 0..capacity {
            next(&ids);
        }
        let mut freed = HashSet::new();
        for id in (start..capacity).step_by(2) {
            free(&ids, id);
            freed.insert(id);
        }
        ids.close().unwrap();

        let ids = reopen(&path, 2000);
        assert_eq!(ids.free_count(), freed.len() as u64);
        for _ in 0..freed.len() {
            let id = next(&ids);
            assert!(freed.remove(&id), "id {id} was not free");
        }
        assert!(freed.is_empty());
        assert_eq!(next(&ids), capacity);
        ids.close().unwrap();
    }
}

#[test]
fn test_random_sessions_never_hand_out_live_ids() {
    let (_dir, path) = setup();
    let mut rng = StdRng::seed_from_u64(42);
    let mut live: HashSet<u64> = HashSet::new();
    let mut high_id = 0u64;

    for session in 0..20 {
        let grab_size = rng.gen_range(1..64);
        let ids = reopen(&path, grab_size);
        assert_eq!(ids.high_id(), high_id, "session {session}");
        assert_eq!(ids.ids_in_use(), live.len() as u64, "session {session}");

        for _ in 0..500 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let id = next(&ids);
                assert!(live.insert(id), "id {id} handed out twice");
                assert!(id < ids.high_id());
            } else {
                let index = rng.gen_range(0..live.len());
                let id = *live.iter().nth(index).unwrap();
                live.remove(&id);
                free(&ids, id);
            }
        }

        high_id = ids.high_id();
        ids.close().unwrap();
    }

    let ids = reopen(&path, 7);
    let free_ids = ids.free_count();
    assert_eq!(free_ids + live.len() as u64, high_id);
    for _ in 0..free_ids {
        let id = next(&ids);
        assert!(id < high_id);
        assert!(live.insert(id), "id {id} handed out twice");
    }
    assert_eq!(live.len() as u64, high_id);
    assert_eq!(next(&ids), high_id);
    ids.close().unwrap();
}

#[test]
fn test_file_shrinks_as_free_list_drains() {
    let (_dir, path) = setup();

    let ids = reopen(&path, 4);
    for _ in 0..100 {
        next(&ids);
    }
    for id in 0..100 {
        free(&ids, id);
    }
    ids.close().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 9 + 100 * 8);

    let ids = reopen(&path, 4);
    for _ in 0..60 {
        next(&ids);
    }
    ids.close().unwrap();

    let header = IdAllocator::read_header(&path).unwrap();
    assert!(!header.sticky);
    assert_eq!(header.high_id, 100);
    assert_eq!(header.free_ids, 40);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 9 + 40 * 8);
}
