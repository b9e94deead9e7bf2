//! Fixed-record store implementation.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grove_common::config::StoreConfig;
use grove_common::constants::ID_FILE_EXTENSION;
use grove_common::types::RecordId;
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::kind::StoreKind;
use super::record::{encoded_in_use, Record};
use super::recovery::scan_records;
use super::scratch::ScratchBuffer;
use super::stats::{StoreMode, StoreState, StoreStats};
use crate::file::{FileHandle, OpenMode, StandardFile};
use crate::id::{IdAllocator, IdError};
use crate::window::{WindowPool, WindowPoolConfig};

/// A file of fixed-width records addressed by id.
///
/// Records live at `id * R::SIZE`. Ids come from an [`IdAllocator`] kept
/// in `<path>.id`; record access goes through a [`WindowPool`], or
/// through direct positional transfers for the `*_direct` operations.
/// A cleanly closed data file ends with the kind's descriptor trailer.
///
/// # Example
///
/// ```rust,no_run
/// use grove_common::config::StoreConfig;
/// use grove_storage::store::{NodeRecord, NodeStore};
///
/// fn example() -> grove_storage::store::StoreResult<()> {
///     NodeStore::create("nodes.db")?;
///     let store = NodeStore::open("nodes.db", &StoreConfig::default())?;
///
///     let id = store.next_id()?;
///     store.update_record(&NodeRecord::new(id))?;
///     assert!(store.get_record(id)?.in_use);
///
///     store.close()?;
///     Ok(())
/// }
/// ```
pub struct FixedRecordStore<R: Record> {
    /// Data file path.
    path: PathBuf,
    /// Configuration the store was opened with.
    config: StoreConfig,
    /// Data file, shared with the window pool.
    file: Arc<StandardFile>,
    /// Identifier allocator.
    ids: IdAllocator,
    /// Record windows.
    windows: WindowPool,
    /// Lifecycle state; operations hold it shared, `close` exclusively.
    state: RwLock<StoreState>,
    /// Operating mode.
    mode: RwLock<StoreMode>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> FixedRecordStore<R> {
    /// Creates an empty store with the reserved record at id 0.
    ///
    /// Fails if the data file or its allocator file already exists.
    pub fn create(path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        check_path(path)?;

        let id_path = id_file_path(path);
        if id_path.exists() {
            return Err(StoreError::AlreadyExists { path: id_path });
        }

        {
            let file = StandardFile::open(path, OpenMode::CreateNew)
                .map_err(|e| StoreError::from_open(e, path))?;
            file.write_all_at(R::KIND.descriptor().as_bytes(), 0)?;
            file.sync()?;
        }
        IdAllocator::create(&id_path)?;

        let store = Self::open(path, &StoreConfig::default().with_window_count(1))?;
        let written = store
            .next_id()
            .and_then(|sentinel| store.update_record(&R::reserved(sentinel)));
        store.close()?;
        written?;

        info!(kind = %R::KIND, path = %path.display(), "created store");
        Ok(())
    }

    /// Opens an existing store.
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        check_path(path)?;
        config
            .validate()
            .map_err(|message| StoreError::InvalidConfig { message })?;

        let file = StandardFile::open(path, OpenMode::ReadWrite)
            .map_err(|e| StoreError::from_open(e, path))?;
        let len = file.size()?;
        let id_path = id_file_path(path);

        let data_len = match read_trailer(&file, len)? {
            Some(kind) if kind == R::KIND => len - R::KIND.descriptor().len() as u64,
            Some(kind) => {
                return Err(StoreError::corrupt(
                    path,
                    format!("file holds a {kind} store, expected {}", R::KIND),
                ));
            }
            None => return Err(missing_trailer(path, &id_path)),
        };
        if data_len % R::SIZE as u64 != 0 {
            return Err(StoreError::corrupt(
                path,
                format!(
                    "{data_len} record bytes is not a multiple of the {}-byte record",
                    R::SIZE
                ),
            ));
        }

        let file = Arc::new(file);
        let windows = WindowPool::new(
            WindowPoolConfig::from_store_config(config, R::SIZE),
            Arc::clone(&file),
        )?;

        let ids = IdAllocator::open(&id_path, config.grab_size)?;
        if let Err(err) = file.set_len(data_len) {
            ids.close()?;
            return Err(err.into());
        }

        info!(
            kind = %R::KIND,
            path = %path.display(),
            high_id = ids.high_id(),
            free_ids = ids.free_count(),
            "opened store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            config: config.clone(),
            file,
            ids,
            windows,
            state: RwLock::new(StoreState::Open),
            mode: RwLock::new(StoreMode::NormalOperation),
            _record: PhantomData,
        })
    }

    /// Allocates an id for a new record.
    pub fn next_id(&self) -> StoreResult<RecordId> {
        let _open = self.open_state()?;
        let _mode = self.mode.read();
        Ok(self.ids.allocate()?)
    }

    /// Reads an in-use record through the window pool.
    pub fn get_record(&self, id: RecordId) -> StoreResult<R> {
        let _open = self.open_state()?;
        check_addressable::<R>(id)?;
        in_use_or_err(self.read_windowed(id)?)
    }

    /// Reads an in-use record, transferring it directly into `scratch`
    /// when no window covers it.
    pub fn get_record_direct(&self, id: RecordId, scratch: &mut ScratchBuffer) -> StoreResult<R> {
        let _open = self.open_state()?;
        check_addressable::<R>(id)?;
        in_use_or_err(self.read_direct(id, scratch)?)
    }

    /// Reads a record, returning `None` if it is not in use.
    pub fn load_light_record(&self, id: RecordId) -> StoreResult<Option<R>> {
        let _open = self.open_state()?;
        check_addressable::<R>(id)?;
        let record = self.read_windowed(id)?;
        Ok(record.in_use().then_some(record))
    }

    /// Like [`load_light_record`](Self::load_light_record), using the
    /// direct transfer path when no window covers the record.
    pub fn load_light_record_direct(
        &self,
        id: RecordId,
        scratch: &mut ScratchBuffer,
    ) -> StoreResult<Option<R>> {
        let _open = self.open_state()?;
        check_addressable::<R>(id)?;
        let record = self.read_direct(id, scratch)?;
        Ok(record.in_use().then_some(record))
    }

    /// Writes a record through the window pool.
    ///
    /// Overwriting an in-use record with one that is not in use frees its
    /// id, except in [`StoreMode::RecoveryReplay`].
    pub fn update_record(&self, record: &R) -> StoreResult<()> {
        let _open = self.open_state()?;
        let id = record.id();
        check_addressable::<R>(id)?;
        let mode = self.mode.read();
        self.ensure_allocated(id, *mode)?;

        let was_in_use = {
            let mut window = self.windows.acquire(id.as_u64())?;
            let slot = window.record_bytes_mut(id.as_u64());
            let was_in_use = encoded_in_use(slot);
            record.encode(slot);
            was_in_use
        };

        self.release_if_freed(record, was_in_use, *mode)
    }

    /// Writes a record, transferring it directly from `scratch` when no
    /// window covers it.
    pub fn update_record_direct(&self, record: &R, scratch: &mut ScratchBuffer) -> StoreResult<()> {
        let _open = self.open_state()?;
        let id = record.id();
        check_addressable::<R>(id)?;
        let mode = self.mode.read();
        self.ensure_allocated(id, *mode)?;

        let (new, old) = scratch.slice(2 * R::SIZE).split_at_mut(R::SIZE);
        record.encode(new);
        // only a delete needs the previous flag
        let transferred = if record.in_use() {
            self.windows.transfer_write(id.as_u64(), new)?
        } else {
            self.windows.transfer_replace(id.as_u64(), new, old)?
        };

        let was_in_use = if transferred {
            encoded_in_use(old)
        } else {
            let mut window = self.windows.acquire(id.as_u64())?;
            let slot = window.record_bytes_mut(id.as_u64());
            let was_in_use = encoded_in_use(slot);
            slot.copy_from_slice(new);
            was_in_use
        };

        self.release_if_freed(record, was_in_use, *mode)
    }

    /// Switches between normal operation and recovery replay.
    ///
    /// Leaving [`StoreMode::RecoveryReplay`] rebuilds the allocator's free
    /// list from the records as replay left them.
    pub fn set_mode(&self, mode: StoreMode) -> StoreResult<()> {
        let _open = self.open_state()?;
        let mut current = self.mode.write();
        if *current == mode {
            return Ok(());
        }
        if *current == StoreMode::RecoveryReplay {
            self.reconcile_ids()?;
        }
        *current = mode;
        info!(kind = %R::KIND, path = %self.path.display(), ?mode, "store mode changed");
        Ok(())
    }

    /// Returns the current mode.
    pub fn mode(&self) -> StoreResult<StoreMode> {
        let _open = self.open_state()?;
        Ok(*self.mode.read())
    }

    /// Returns one past the greatest id ever allocated.
    pub fn high_id(&self) -> StoreResult<u64> {
        let _open = self.open_state()?;
        Ok(self.ids.high_id())
    }

    /// Writes all dirty windows to the data file.
    pub fn flush(&self) -> StoreResult<()> {
        let _open = self.open_state()?;
        let flushed = self.windows.flush_all()?;
        if self.config.sync_on_close {
            self.file.sync()?;
        }
        debug!(kind = %R::KIND, flushed, "flushed store");
        Ok(())
    }

    /// Returns a statistics snapshot.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let _open = self.open_state()?;
        Ok(StoreStats {
            kind: R::KIND,
            record_size: R::SIZE,
            high_id: self.ids.high_id(),
            ids_in_use: self.ids.ids_in_use(),
            free_ids: self.ids.free_count(),
            mode: *self.mode.read(),
            windows: self.windows.stats(),
        })
    }

    /// Flushes the windows, closes the allocator and writes the trailer.
    ///
    /// A store still in recovery replay leaves it first. Calling `close`
    /// on a closed store does nothing.
    pub fn close(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        if *state == StoreState::Closed {
            return Ok(());
        }

        let mut mode = self.mode.write();
        if *mode == StoreMode::RecoveryReplay {
            self.reconcile_ids()?;
            *mode = StoreMode::NormalOperation;
        }
        drop(mode);

        self.windows.shutdown()?;
        self.ids.close()?;

        let high_id = self.ids.high_id();
        let offset = high_id * R::SIZE as u64;
        let descriptor = R::KIND.descriptor().as_bytes();
        self.file.write_all_at(descriptor, offset)?;
        self.file.set_len(offset + descriptor.len() as u64)?;
        if self.config.sync_on_close {
            self.file.sync()?;
        }

        *state = StoreState::Closed;
        info!(kind = %R::KIND, path = %self.path.display(), high_id, "closed store");
        Ok(())
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> StoreState {
        *self.state.read()
    }

    /// Returns the store kind.
    pub fn kind(&self) -> StoreKind {
        R::KIND
    }

    /// Returns the data file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    fn open_state(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        let state = self.state.read();
        match *state {
            StoreState::Open => Ok(state),
            StoreState::Closed => Err(StoreError::Closed),
        }
    }

    fn read_windowed(&self, id: RecordId) -> StoreResult<R> {
        let window = self.windows.acquire(id.as_u64())?;
        Ok(R::decode(id, window.record_bytes(id.as_u64())))
    }

    fn read_direct(&self, id: RecordId, scratch: &mut ScratchBuffer) -> StoreResult<R> {
        let buf = scratch.slice(R::SIZE);
        if self.windows.transfer_read(id.as_u64(), buf)? {
            Ok(R::decode(id, buf))
        } else {
            self.read_windowed(id)
        }
    }

    /// Rejects writes past the high id, or raises it during replay.
    fn ensure_allocated(&self, id: RecordId, mode: StoreMode) -> StoreResult<()> {
        let high_id = self.ids.high_id();
        if id.as_u64() < high_id {
            return Ok(());
        }
        match mode {
            StoreMode::NormalOperation => Err(StoreError::IdOutOfRange {
                kind: R::KIND,
                id,
                high_id,
            }),
            StoreMode::RecoveryReplay => match self.ids.set_high_id(id.as_u64() + 1) {
                // another replaying writer already raised it further
                Ok(()) | Err(IdError::HighIdBackward { .. }) => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }

    fn release_if_freed(&self, record: &R, was_in_use: bool, mode: StoreMode) -> StoreResult<()> {
        if was_in_use && !record.in_use() && mode == StoreMode::NormalOperation {
            self.ids.release(record.id())?;
        }
        Ok(())
    }

    /// Replaces the free list with every unused slot below the high id.
    ///
    /// Callers hold the mode lock exclusively, so no write is in flight.
    fn reconcile_ids(&self) -> StoreResult<()> {
        self.windows.flush_all()?;
        let high_id = self.ids.high_id();
        let scan = scan_records::<R>(&self.file, high_id)?;
        self.ids.replace_free_list(&scan.free)?;

        info!(
            kind = %R::KIND,
            path = %self.path.display(),
            high_id,
            free_ids = scan.free.len(),
            "reconciled id allocator after recovery replay"
        );
        Ok(())
    }
}

impl<R: Record> Drop for FixedRecordStore<R> {
    fn drop(&mut self) {
        if *self.state.get_mut() == StoreState::Open {
            warn!(
                kind = %R::KIND,
                path = %self.path.display(),
                "store dropped without close"
            );
        }
    }
}

impl<R: Record> std::fmt::Debug for FixedRecordStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedRecordStore")
            .field("kind", &R::KIND)
            .field("path", &self.path)
            .field("state", &self.state())
            .field("ids", &self.ids)
            .finish()
    }
}

/// Returns the allocator file path of a data file (`<path>.id`).
pub fn id_file_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_owned();
    name.push(".");
    name.push(ID_FILE_EXTENSION);
    PathBuf::from(name)
}

pub(super) fn check_path(path: &Path) -> StoreResult<()> {
    if path.as_os_str().is_empty() {
        Err(StoreError::EmptyPath)
    } else {
        Ok(())
    }
}

/// Returns the kind named by the file's trailer, if it has one.
pub(super) fn read_trailer(file: &StandardFile, len: u64) -> StoreResult<Option<StoreKind>> {
    let tail_len = len.min(StoreKind::max_descriptor_len() as u64);
    let mut tail = vec![0u8; tail_len as usize];
    file.read_exact_at(&mut tail, len - tail_len)?;
    Ok(StoreKind::from_trailer(&tail))
}

/// A data file without a trailer was not closed cleanly; report the
/// allocator's sticky flag when it confirms that.
fn missing_trailer(path: &Path, id_path: &Path) -> StoreError {
    match IdAllocator::read_header(id_path) {
        Ok(header) if header.sticky => IdError::Sticky {
            path: id_path.to_path_buf(),
        }
        .into(),
        _ => StoreError::corrupt(path, "missing store trailer"),
    }
}

fn check_addressable<R: Record>(id: RecordId) -> StoreResult<()> {
    if id.is_addressable() {
        Ok(())
    } else {
        Err(StoreError::IdNotAddressable { kind: R::KIND, id })
    }
}

fn in_use_or_err<R: Record>(record: R) -> StoreResult<R> {
    if record.in_use() {
        Ok(record)
    } else {
        Err(StoreError::NotInUse {
            key: R::KIND.entity_key(record.id()),
        })
    }
}
