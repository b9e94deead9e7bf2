//! Persistent identifier allocator.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use grove_common::constants::{ID_CLEAN, ID_ENTRY_SIZE, ID_HEADER_SIZE, ID_STICKY};
use grove_common::types::{RecordId, MAX_HIGH_ID};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::{IdError, IdResult};
use super::header::{self, IdFileHeader};
use crate::file::{FileHandle, OpenMode, StandardFile};

/// Bytes moved per step when compacting the free list on close.
const COMPACT_CHUNK: usize = 64 * 1024;

/// Hands out dense record identifiers and recycles released ones.
///
/// Released identifiers are collected in batches of `grab_size` and
/// appended to the allocator file. They become reusable on the next open,
/// in the order they were written. The file header carries a sticky flag
/// that stays set while the allocator is open, so an unclean shutdown is
/// detected by the next `open`.
///
/// All state sits behind one mutex, which is the single ordering point
/// for `allocate`, `release`, `set_high_id` and `close`.
///
/// # Example
///
/// ```rust,no_run
/// use grove_storage::id::IdAllocator;
///
/// fn example() -> grove_storage::id::IdResult<()> {
///     IdAllocator::create("nodes.db.id")?;
///     let ids = IdAllocator::open("nodes.db.id", 1024)?;
///
///     let id = ids.allocate()?;
///     ids.release(id)?;
///
///     ids.close()?;
///     Ok(())
/// }
/// ```
pub struct IdAllocator {
    /// Path of the allocator file.
    path: PathBuf,
    /// Free-list batch size.
    grab_size: usize,
    /// Mutable state.
    state: Mutex<AllocatorState>,
}

struct AllocatorState {
    /// Open file, `None` once closed.
    file: Option<StandardFile>,
    /// One past the greatest identifier ever allocated.
    high_id: u64,
    /// Ids released since the last flush.
    release_batch: Vec<u64>,
    /// Ids read from the file but not yet handed out.
    reuse_batch: VecDeque<u64>,
    /// Next unread byte of the free list.
    read_position: u64,
    /// File length at open; entries beyond it were written this session.
    max_read_position: u64,
    /// Number of currently free ids, on disk and in both batches.
    free_count: u64,
}

impl IdAllocator {
    /// Creates an empty allocator file with a clean header and high id 0.
    pub fn create(path: impl AsRef<Path>) -> IdResult<()> {
        let path = path.as_ref();
        check_path(path)?;

        let file = StandardFile::open(path, OpenMode::CreateNew)
            .map_err(|e| IdError::from_open(e, path))?;
        file.write_all_at(&header::encode(ID_CLEAN, 0), 0)?;
        file.sync()?;

        debug!(path = %path.display(), "created id allocator file");
        Ok(())
    }

    /// Opens an existing allocator file and marks it sticky.
    pub fn open(path: impl AsRef<Path>, grab_size: usize) -> IdResult<Self> {
        let path = path.as_ref();
        check_path(path)?;
        if grab_size == 0 {
            return Err(IdError::InvalidGrabSize { grab_size });
        }

        let file = StandardFile::open(path, OpenMode::ReadWrite)
            .map_err(|e| IdError::from_open(e, path))?;
        let len = file.size()?;
        let free_count = header::entry_count(path, len)?;

        let mut buf = [0u8; ID_HEADER_SIZE];
        file.read_exact_at(&mut buf, 0)?;
        let (sticky, high_id) = header::decode(&buf);
        if sticky {
            warn!(path = %path.display(), "id allocator was not closed cleanly");
            return Err(IdError::Sticky {
                path: path.to_path_buf(),
            });
        }
        if high_id > MAX_HIGH_ID {
            return Err(IdError::corrupt(
                path,
                format!("high id {high_id} exceeds the id space"),
            ));
        }

        file.write_all_at(&[ID_STICKY], 0)?;
        file.sync()?;

        info!(
            path = %path.display(),
            high_id,
            free_ids = free_count,
            grab_size,
            "opened id allocator"
        );

        Ok(Self {
            path: path.to_path_buf(),
            grab_size,
            state: Mutex::new(AllocatorState {
                file: Some(file),
                high_id,
                release_batch: Vec::with_capacity(grab_size),
                reuse_batch: VecDeque::with_capacity(grab_size),
                read_position: ID_HEADER_SIZE as u64,
                max_read_position: len,
                free_count,
            }),
        })
    }

    /// Reads the header of an allocator file without opening it.
    ///
    /// The sticky flag is reported, not enforced.
    pub fn read_header(path: impl AsRef<Path>) -> IdResult<IdFileHeader> {
        let path = path.as_ref();
        check_path(path)?;

        let file = StandardFile::open(path, OpenMode::Read)
            .map_err(|e| IdError::from_open(e, path))?;
        let free_ids = header::entry_count(path, file.size()?)?;

        let mut buf = [0u8; ID_HEADER_SIZE];
        file.read_exact_at(&mut buf, 0)?;
        let (sticky, high_id) = header::decode(&buf);

        Ok(IdFileHeader {
            sticky,
            high_id,
            free_ids,
        })
    }

    /// Replaces an allocator file with a clean one holding `free_ids`.
    ///
    /// Any existing file at `path` is overwritten, sticky or not.
    pub fn write_fresh(path: impl AsRef<Path>, high_id: u64, free_ids: &[u64]) -> IdResult<()> {
        let path = path.as_ref();
        check_path(path)?;
        if high_id > MAX_HIGH_ID {
            return Err(IdError::CapacityExceeded { high_id });
        }
        if let Some(&id) = free_ids.iter().find(|&&id| id >= high_id) {
            return Err(IdError::FreeIdOutOfRange { id, high_id });
        }

        let mut buf = Vec::with_capacity(ID_HEADER_SIZE + free_ids.len() * ID_ENTRY_SIZE);
        buf.extend_from_slice(&header::encode(ID_CLEAN, high_id));
        for id in free_ids {
            buf.extend_from_slice(&id.to_be_bytes());
        }

        let file = StandardFile::open(path, OpenMode::Replace)?;
        file.write_all_at(&buf, 0)?;
        file.set_len(buf.len() as u64)?;
        file.sync()?;

        info!(
            path = %path.display(),
            high_id,
            free_ids = free_ids.len(),
            "wrote fresh id allocator file"
        );
        Ok(())
    }

    /// Returns a free identifier, preferring reusable ones.
    pub fn allocate(&self) -> IdResult<RecordId> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        loop {
            if let Some(id) = state.reuse_batch.pop_front() {
                state.free_count -= 1;
                return Ok(RecordId::new(id));
            }
            if state.read_position < state.max_read_position {
                state.read_batch(self.grab_size)?;
            } else {
                break;
            }
        }

        if state.high_id >= MAX_HIGH_ID {
            warn!(
                path = %self.path.display(),
                high_id = state.high_id,
                "id space exhausted"
            );
            return Err(IdError::CapacityExceeded {
                high_id: state.high_id,
            });
        }

        let id = state.high_id;
        state.high_id += 1;
        Ok(RecordId::new(id))
    }

    /// Marks an identifier as free.
    ///
    /// The id becomes reusable after the allocator is closed and reopened.
    pub fn release(&self, id: RecordId) -> IdResult<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let id = id.as_u64();
        if id >= state.high_id {
            return Err(IdError::NotAllocated {
                id,
                high_id: state.high_id,
            });
        }

        state.release_batch.push(id);
        state.free_count += 1;
        if state.release_batch.len() >= self.grab_size {
            state.flush_release_batch()?;
        }
        Ok(())
    }

    /// Raises the high id.
    pub fn set_high_id(&self, high_id: u64) -> IdResult<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        if high_id > MAX_HIGH_ID {
            return Err(IdError::CapacityExceeded { high_id });
        }
        if high_id < state.high_id {
            return Err(IdError::HighIdBackward {
                current: state.high_id,
                requested: high_id,
            });
        }

        state.high_id = high_id;
        Ok(())
    }

    /// Replaces the free list of an open allocator with `free_ids`.
    ///
    /// Pending batches are dropped and the new ids are reusable at once,
    /// in the given order. The high id is unchanged and the file stays
    /// sticky until `close`.
    pub fn replace_free_list(&self, free_ids: &[u64]) -> IdResult<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let high_id = state.high_id;
        if let Some(&id) = free_ids.iter().find(|&&id| id >= high_id) {
            return Err(IdError::FreeIdOutOfRange { id, high_id });
        }

        let header = ID_HEADER_SIZE as u64;
        let file = state.file()?;
        file.set_len(header)?;
        append_ids(file, free_ids)?;
        let len = file.size()?;

        state.release_batch.clear();
        state.reuse_batch.clear();
        state.read_position = header;
        state.max_read_position = len;
        state.free_count = free_ids.len() as u64;

        info!(
            path = %self.path.display(),
            high_id,
            free_ids = free_ids.len(),
            "replaced id free list"
        );
        Ok(())
    }

    /// Writes out pending batches, marks the file clean and releases it.
    ///
    /// Unread free-list entries are moved to directly after the header.
    /// Calling `close` on a closed allocator does nothing.
    pub fn close(&self) -> IdResult<()> {
        let mut state = self.state.lock();
        if state.file.is_none() {
            return Ok(());
        }

        state.flush_release_batch()?;
        state.flush_reuse_batch()?;

        let high_id = state.high_id;
        let read_position = state.read_position;
        let file = state.file()?;
        file.write_all_at(&header::encode(ID_CLEAN, high_id), 0)?;
        compact(file, read_position)?;
        file.sync()?;

        state.file = None;
        info!(
            path = %self.path.display(),
            high_id = state.high_id,
            free_ids = state.free_count,
            "closed id allocator"
        );
        Ok(())
    }

    /// Returns the allocator file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the free-list batch size.
    pub fn grab_size(&self) -> usize {
        self.grab_size
    }

    /// Returns one past the greatest identifier ever allocated.
    pub fn high_id(&self) -> u64 {
        self.state.lock().high_id
    }

    /// Returns the number of currently free identifiers.
    pub fn free_count(&self) -> u64 {
        self.state.lock().free_count
    }

    /// Returns the number of identifiers currently in use.
    pub fn ids_in_use(&self) -> u64 {
        let state = self.state.lock();
        state.high_id - state.free_count
    }

    /// Returns true once `close` has completed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().file.is_none()
    }
}

impl AllocatorState {
    fn ensure_open(&self) -> IdResult<()> {
        if self.file.is_some() {
            Ok(())
        } else {
            Err(IdError::Closed)
        }
    }

    fn file(&self) -> IdResult<&StandardFile> {
        self.file.as_ref().ok_or(IdError::Closed)
    }

    /// Reads up to `grab_size` unread entries into the reuse batch.
    fn read_batch(&mut self, grab_size: usize) -> IdResult<()> {
        let remaining = (self.max_read_position - self.read_position) / ID_ENTRY_SIZE as u64;
        let count = remaining.min(grab_size as u64) as usize;

        let mut buf = vec![0u8; count * ID_ENTRY_SIZE];
        self.file()?.read_exact_at(&mut buf, self.read_position)?;
        self.read_position += buf.len() as u64;

        self.reuse_batch.extend(buf.chunks_exact(ID_ENTRY_SIZE).map(|chunk| {
            let mut raw = [0u8; ID_ENTRY_SIZE];
            raw.copy_from_slice(chunk);
            u64::from_be_bytes(raw)
        }));
        Ok(())
    }

    fn flush_release_batch(&mut self) -> IdResult<()> {
        if self.release_batch.is_empty() {
            return Ok(());
        }
        append_ids(self.file()?, &self.release_batch)?;
        self.release_batch.clear();
        Ok(())
    }

    fn flush_reuse_batch(&mut self) -> IdResult<()> {
        if self.reuse_batch.is_empty() {
            return Ok(());
        }
        let ids: Vec<u64> = self.reuse_batch.drain(..).collect();
        append_ids(self.file()?, &ids)
    }
}

impl Drop for IdAllocator {
    fn drop(&mut self) {
        if self.state.get_mut().file.is_some() {
            warn!(
                path = %self.path.display(),
                "id allocator dropped without close, sticky flag left set"
            );
        }
    }
}

impl std::fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("IdAllocator")
            .field("path", &self.path)
            .field("grab_size", &self.grab_size)
            .field("high_id", &state.high_id)
            .field("free_count", &state.free_count)
            .field("closed", &state.file.is_none())
            .finish()
    }
}

fn check_path(path: &Path) -> IdResult<()> {
    if path.as_os_str().is_empty() {
        Err(IdError::EmptyPath)
    } else {
        Ok(())
    }
}

/// Appends ids at the end of the file.
fn append_ids(file: &StandardFile, ids: &[u64]) -> IdResult<()> {
    let mut buf = Vec::with_capacity(ids.len() * ID_ENTRY_SIZE);
    for id in ids {
        buf.extend_from_slice(&id.to_be_bytes());
    }
    let end = file.size()?;
    file.write_all_at(&buf, end)?;
    Ok(())
}

/// Moves `[read_position, EOF)` to directly after the header and truncates.
fn compact(file: &StandardFile, read_position: u64) -> IdResult<()> {
    let end = file.size()?;
    let header = ID_HEADER_SIZE as u64;
    let live = end.saturating_sub(read_position);

    if read_position > header {
        let mut buf = vec![0u8; COMPACT_CHUNK];
        let mut moved = 0u64;
        while moved < live {
            let n = (live - moved).min(COMPACT_CHUNK as u64) as usize;
            file.read_exact_at(&mut buf[..n], read_position + moved)?;
            file.write_all_at(&buf[..n], header + moved)?;
            moved += n as u64;
        }
    }

    file.set_len(header + live)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_common::ErrorKind;
    use tempfile::tempdir;

    fn new_allocator(dir: &Path, grab_size: usize) -> (PathBuf, IdAllocator) {
        let path = dir.join("test.id");
        IdAllocator::create(&path).unwrap();
        let ids = IdAllocator::open(&path, grab_size).unwrap();
        (path, ids)
    }

    #[test]
    fn test_create_writes_clean_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.id");
        IdAllocator::create(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; ID_HEADER_SIZE]);

        let ids = IdAllocator::open(&path, 4).unwrap();
        ids.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; ID_HEADER_SIZE]);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.id");
        IdAllocator::create(&path).unwrap();

        let err = IdAllocator::create(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_open_argument_checks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("args.id");
        IdAllocator::create(&path).unwrap();

        assert!(matches!(
            IdAllocator::open(&path, 0),
            Err(IdError::InvalidGrabSize { grab_size: 0 })
        ));
        assert!(matches!(IdAllocator::open("", 4), Err(IdError::EmptyPath)));
        assert!(matches!(
            IdAllocator::open(dir.path().join("missing.id"), 4),
            Err(IdError::NotFound { .. })
        ));
    }

    #[test]
    fn test_open_sets_sticky_flag() {
        let dir = tempdir().unwrap();
        let (path, ids) = new_allocator(dir.path(), 4);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes[0], ID_STICKY);
        assert!(IdAllocator::read_header(&path).unwrap().sticky);

        ids.close().unwrap();
        assert!(!IdAllocator::read_header(&path).unwrap().sticky);
    }

    #[test]
    fn test_sequential_allocation() {
        let dir = tempdir().unwrap();
        let (_, ids) = new_allocator(dir.path(), 4);

        for expected in 0..10 {
            assert_eq!(ids.allocate().unwrap(), RecordId::new(expected));
        }
        assert_eq!(ids.high_id(), 10);
        assert_eq!(ids.free_count(), 0);
        assert_eq!(ids.ids_in_use(), 10);
        ids.close().unwrap();
    }

    #[test]
    fn test_release_counts() {
        let dir = tempdir().unwrap();
        let (_, ids) = new_allocator(dir.path(), 4);

        for _ in 0..5 {
            ids.allocate().unwrap();
        }
        ids.release(RecordId::new(2)).unwrap();
        ids.release(RecordId::new(4)).unwrap();
        assert_eq!(ids.free_count(), 2);
        assert_eq!(ids.ids_in_use(), 3);

        let err = ids.release(RecordId::new(5)).unwrap_err();
        assert!(matches!(err, IdError::NotAllocated { id: 5, high_id: 5 }));
        ids.close().unwrap();
    }

    #[test]
    fn test_set_high_id() {
        let dir = tempdir().unwrap();
        let (_, ids) = new_allocator(dir.path(), 4);

        ids.set_high_id(10).unwrap();
        assert_eq!(ids.allocate().unwrap(), RecordId::new(10));
        ids.set_high_id(11).unwrap();

        assert!(matches!(
            ids.set_high_id(3),
            Err(IdError::HighIdBackward {
                current: 11,
                requested: 3
            })
        ));
        assert!(matches!(
            ids.set_high_id(MAX_HIGH_ID + 1),
            Err(IdError::CapacityExceeded { .. })
        ));
        ids.set_high_id(MAX_HIGH_ID).unwrap();
        assert!(ids.allocate().is_err());
        ids.close().unwrap();
    }

    #[test]
    fn test_operations_after_close() {
        let dir = tempdir().unwrap();
        let (_, ids) = new_allocator(dir.path(), 4);
        ids.allocate().unwrap();
        ids.close().unwrap();

        assert!(ids.is_closed());
        assert!(matches!(ids.allocate(), Err(IdError::Closed)));
        assert!(matches!(ids.release(RecordId::new(0)), Err(IdError::Closed)));
        // closed is reported before the range check
        assert!(matches!(
            ids.release(RecordId::new(99)),
            Err(IdError::Closed)
        ));
        assert!(matches!(ids.set_high_id(5), Err(IdError::Closed)));

        // close is idempotent
        ids.close().unwrap();
    }

    #[test]
    fn test_close_compacts_body() {
        let dir = tempdir().unwrap();
        let (path, ids) = new_allocator(dir.path(), 2);
        for _ in 0..6 {
            ids.allocate().unwrap();
        }
        for id in [0, 1, 2, 3] {
            ids.release(RecordId::new(id)).unwrap();
        }
        ids.close().unwrap();

        let ids = IdAllocator::open(&path, 2).unwrap();
        assert_eq!(ids.allocate().unwrap(), RecordId::new(0));
        ids.close().unwrap();

        // 1 was read ahead and goes to the back, 2 and 3 were never read
        let header = IdAllocator::read_header(&path).unwrap();
        assert_eq!(header.free_ids, 3);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), ID_HEADER_SIZE + 3 * ID_ENTRY_SIZE);

        let ids = IdAllocator::open(&path, 8).unwrap();
        let order: Vec<u64> = (0..3).map(|_| ids.allocate().unwrap().as_u64()).collect();
        assert_eq!(order, vec![2, 3, 1]);
        ids.close().unwrap();
    }

    #[test]
    fn test_write_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.id");
        IdAllocator::write_fresh(&path, 6, &[4, 1]).unwrap();

        let header = IdAllocator::read_header(&path).unwrap();
        assert_eq!(
            header,
            IdFileHeader {
                sticky: false,
                high_id: 6,
                free_ids: 2
            }
        );

        let ids = IdAllocator::open(&path, 4).unwrap();
        assert_eq!(ids.allocate().unwrap(), RecordId::new(4));
        assert_eq!(ids.allocate().unwrap(), RecordId::new(1));
        assert_eq!(ids.allocate().unwrap(), RecordId::new(6));
        ids.close().unwrap();

        assert!(matches!(
            IdAllocator::write_fresh(&path, 3, &[3]),
            Err(IdError::FreeIdOutOfRange { id: 3, high_id: 3 })
        ));
    }

    #[test]
    fn test_replace_free_list() {
        let dir = tempdir().unwrap();
        let (path, ids) = new_allocator(dir.path(), 2);
        for _ in 0..6 {
            ids.allocate().unwrap();
        }
        ids.release(RecordId::new(1)).unwrap();

        ids.replace_free_list(&[5, 2, 3]).unwrap();
        assert_eq!(ids.free_count(), 3);
        assert_eq!(ids.ids_in_use(), 3);

        let reused: Vec<u64> = (0..4).map(|_| ids.allocate().unwrap().as_u64()).collect();
        assert_eq!(reused, vec![5, 2, 3, 6]);

        assert!(matches!(
            ids.replace_free_list(&[7]),
            Err(IdError::FreeIdOutOfRange { id: 7, high_id: 7 })
        ));
        ids.close().unwrap();

        let header = IdAllocator::read_header(&path).unwrap();
        assert_eq!(header.high_id, 7);
        assert_eq!(header.free_ids, 0);
        assert!(matches!(ids.replace_free_list(&[]), Err(IdError::Closed)));
    }

    #[test]
    fn test_drop_without_close_leaves_sticky() {
        let dir = tempdir().unwrap();
        let (path, ids) = new_allocator(dir.path(), 4);
        ids.allocate().unwrap();
        drop(ids);

        assert!(IdAllocator::read_header(&path).unwrap().sticky);
        assert!(matches!(
            IdAllocator::open(&path, 4),
            Err(IdError::Sticky { .. })
        ));
    }
}
