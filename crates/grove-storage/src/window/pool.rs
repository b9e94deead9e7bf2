//! Window pool implementation.
//!
//! The window pool keeps a fixed number of record windows in memory,
//! handling window loading, LRU eviction, write-back and direct
//! transfers for records no window covers.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

use super::config::WindowPoolConfig;
use super::error::{WindowError, WindowResult};
use super::eviction::LruReplacer;
use super::guard::WindowGuard;
use super::window::{SlotMeta, Window, WindowData};
use super::WindowPoolStats;
use crate::file::{FileHandle, StandardFile};

/// State guarded by the pool-state lock.
struct PoolState {
    /// Maps a window's first record to its slot.
    index: HashMap<u64, usize>,
    /// Per-slot bookkeeping.
    meta: Vec<SlotMeta>,
    /// Acquisition counter used as the LRU clock.
    tick: u64,
    /// Window regions with a direct transfer in flight.
    transferring: HashSet<u64>,
}

impl PoolState {
    fn pin(&mut self, slot: usize) {
        self.tick += 1;
        let meta = &mut self.meta[slot];
        meta.pins += 1;
        meta.last_access = self.tick;
    }
}

/// A fixed pool of record windows over one data file.
///
/// It provides:
/// - Windowed caching of consecutive records with LRU eviction
/// - Per-window mutual exclusion through [`WindowGuard`]
/// - Dirty tracking and write-back on eviction and flush
/// - Direct positional transfers for records outside every window
pub struct WindowPool {
    /// Configuration.
    config: WindowPoolConfig,
    /// Data file shared with the owning store.
    file: Arc<StandardFile>,
    /// Window slots.
    windows: Vec<Window>,
    /// Index, pins and LRU clock.
    state: Mutex<PoolState>,
    /// Signalled when a slot is unpinned, a load settles or a transfer ends.
    changed: Condvar,
    /// Replacement policy.
    replacer: LruReplacer,
    /// Acquisition counter for statistics.
    acquisition_count: AtomicU64,
    /// Hit counter for statistics.
    hit_count: AtomicU64,
    /// Miss counter for statistics.
    miss_count: AtomicU64,
    /// Eviction counter for statistics.
    eviction_count: AtomicU64,
    /// Flush counter for statistics.
    flush_count: AtomicU64,
    /// Direct transfer counter for statistics.
    transfer_count: AtomicU64,
    /// Shutdown flag.
    shutdown: AtomicBool,
}

impl WindowPool {
    /// Creates a pool over `file` with the given configuration.
    pub fn new(config: WindowPoolConfig, file: Arc<StandardFile>) -> WindowResult<Self> {
        config.validate().map_err(WindowError::config)?;

        let window_bytes = config.window_bytes();
        let windows = (0..config.window_count)
            .map(|slot| Window::new(slot, window_bytes))
            .collect();

        Ok(Self {
            state: Mutex::new(PoolState {
                index: HashMap::with_capacity(config.window_count),
                meta: vec![SlotMeta::default(); config.window_count],
                tick: 0,
                transferring: HashSet::new(),
            }),
            replacer: LruReplacer::new(config.window_count),
            config,
            file,
            windows,
            changed: Condvar::new(),
            acquisition_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            transfer_count: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Pins and locks the window covering `record`, loading it if needed.
    ///
    /// Blocks while every window is pinned. A miss writes back and reloads
    /// its slot without holding the pool-state lock, so acquisitions of
    /// other windows and direct transfers proceed meanwhile.
    pub fn acquire(&self, record: u64) -> WindowResult<WindowGuard<'_>> {
        self.check_shutdown()?;
        self.acquisition_count.fetch_add(1, Ordering::Relaxed);

        let first = self.config.window_start(record);
        let mut state = self.state.lock();

        let (slot, evicted) = loop {
            self.check_shutdown()?;

            if let Some(&slot) = state.index.get(&first) {
                if state.meta[slot].loading {
                    self.changed.wait(&mut state);
                    continue;
                }
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                state.pin(slot);
                drop(state);
                let window = &self.windows[slot];
                return Ok(self.guard(window, window.lock(), first));
            }

            // a direct transfer into this region must land before it is read
            if state.transferring.contains(&first) {
                self.changed.wait(&mut state);
                continue;
            }

            let Some(slot) = self.replacer.find_victim(&state.meta) else {
                self.changed.wait(&mut state);
                continue;
            };

            // The evicted window stays indexed until its write-back is done.
            let evicted = state.meta[slot].first_record;
            state.index.insert(first, slot);
            state.meta[slot].loading = true;
            state.pin(slot);
            break (slot, evicted);
        };
        drop(state);

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let window = &self.windows[slot];
        let mut data = window.lock();

        if let Err(err) = self.write_back(window, &data) {
            drop(data);
            self.abandon_load(slot, first, false);
            return Err(err);
        }
        if let Err(err) = self.load(&mut data, first) {
            data.first_record = None;
            drop(data);
            self.abandon_load(slot, first, true);
            return Err(err);
        }

        let mut state = self.state.lock();
        if let Some(old) = evicted {
            state.index.remove(&old);
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
            debug!(slot, evicted = old, loaded = first, "evicted window");
        }
        let meta = &mut state.meta[slot];
        meta.first_record = Some(first);
        meta.loading = false;
        drop(state);
        self.changed.notify_all();

        Ok(self.guard(window, data, first))
    }

    /// Reads `record` straight from the file into `buf` when no window
    /// covers it.
    ///
    /// Returns `false` without touching `buf` when a window covers the
    /// record; the caller must then use [`acquire`](Self::acquire).
    pub fn transfer_read(&self, record: u64, buf: &mut [u8]) -> WindowResult<bool> {
        let Some(_transfer) = self.begin_transfer(record)? else {
            return Ok(false);
        };
        self.file.read_up_to_at(buf, self.offset_of(record))?;
        self.transfer_count.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Writes `buf` straight to the file at `record` when no window
    /// covers it.
    ///
    /// Returns `false` without writing when a window covers the record.
    pub fn transfer_write(&self, record: u64, buf: &[u8]) -> WindowResult<bool> {
        let Some(_transfer) = self.begin_transfer(record)? else {
            return Ok(false);
        };
        self.file.write_all_at(buf, self.offset_of(record))?;
        self.transfer_count.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Reads the current bytes of `record` into `old`, then writes `new`
    /// in their place, when no window covers the record.
    ///
    /// No other transfer or window load touches the record's region in
    /// between. Returns `false` without touching the file when a window
    /// covers the record.
    pub fn transfer_replace(
        &self,
        record: u64,
        new: &[u8],
        old: &mut [u8],
    ) -> WindowResult<bool> {
        let Some(_transfer) = self.begin_transfer(record)? else {
            return Ok(false);
        };
        let offset = self.offset_of(record);
        self.file.read_up_to_at(old, offset)?;
        self.file.write_all_at(new, offset)?;
        self.transfer_count.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Returns true if a window currently covers `record`.
    pub fn covers(&self, record: u64) -> bool {
        self.state
            .lock()
            .index
            .contains_key(&self.config.window_start(record))
    }

    /// Writes every dirty window back to the file.
    ///
    /// Returns the number of windows written. Does not sync the file.
    pub fn flush_all(&self) -> WindowResult<usize> {
        let mut flushed = 0;
        for window in &self.windows {
            let data = window.lock();
            if window.is_dirty() {
                self.write_back(window, &data)?;
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Flushes all windows and rejects further acquisitions.
    pub fn shutdown(&self) -> WindowResult<()> {
        {
            let _state = self.state.lock();
            self.shutdown.store(true, Ordering::Release);
            self.changed.notify_all();
        }
        let flushed = self.flush_all()?;
        debug!(flushed, "window pool shut down");
        Ok(())
    }

    /// Returns true once the pool has been shut down.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Returns statistics about the window pool.
    pub fn stats(&self) -> WindowPoolStats {
        let pinned = self
            .state
            .lock()
            .meta
            .iter()
            .filter(|meta| !meta.is_unpinned())
            .count();
        let dirty = self.windows.iter().filter(|w| w.is_dirty()).count();

        WindowPoolStats {
            acquisitions: self.acquisition_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            transfers: self.transfer_count.load(Ordering::Relaxed),
            pinned_windows: pinned,
            dirty_windows: dirty,
        }
    }

    /// Returns the pool configuration.
    pub fn config(&self) -> &WindowPoolConfig {
        &self.config
    }

    /// Returns the number of windows in the pool.
    pub fn window_count(&self) -> usize {
        self.config.window_count
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Checks if the pool has been shut down.
    fn check_shutdown(&self) -> WindowResult<()> {
        if self.is_shut_down() {
            Err(WindowError::ShutDown)
        } else {
            Ok(())
        }
    }

    fn guard<'a>(
        &'a self,
        window: &'a Window,
        data: MutexGuard<'a, WindowData>,
        first: u64,
    ) -> WindowGuard<'a> {
        WindowGuard::new(self, window, data, first, self.config.record_size)
    }

    /// Waits until no load or transfer is in flight for `record`'s region,
    /// then claims it for a direct transfer.
    ///
    /// Returns `None` when a window covers the region.
    fn begin_transfer(&self, record: u64) -> WindowResult<Option<TransferClaim<'_>>> {
        let first = self.config.window_start(record);
        let mut state = self.state.lock();
        loop {
            self.check_shutdown()?;
            if let Some(&slot) = state.index.get(&first) {
                if !state.meta[slot].loading {
                    return Ok(None);
                }
            } else if state.transferring.insert(first) {
                return Ok(Some(TransferClaim { pool: self, first }));
            }
            self.changed.wait(&mut state);
        }
    }

    fn end_transfer(&self, first: u64) {
        self.state.lock().transferring.remove(&first);
        self.changed.notify_all();
    }

    /// Undoes the bookkeeping of a miss whose write-back or load failed.
    ///
    /// When `cleared` is set the evicted window is gone from the slot too.
    fn abandon_load(&self, slot: usize, first: u64, cleared: bool) {
        let mut state = self.state.lock();
        state.index.remove(&first);
        let meta = &mut state.meta[slot];
        meta.loading = false;
        meta.pins = meta.pins.saturating_sub(1);
        let evicted = if cleared { meta.first_record.take() } else { None };
        if let Some(old) = evicted {
            state.index.remove(&old);
        }
        drop(state);
        self.changed.notify_all();
    }

    /// Releases one pin on `slot`.
    pub(crate) fn unpin(&self, slot: usize) {
        let mut state = self.state.lock();
        let meta = &mut state.meta[slot];
        meta.pins = meta.pins.saturating_sub(1);
        if meta.is_unpinned() {
            self.changed.notify_all();
        }
    }

    fn offset_of(&self, record: u64) -> u64 {
        record * self.config.record_size as u64
    }

    /// Reads a window's region, zero-filling past EOF.
    fn load(&self, data: &mut WindowData, first: u64) -> WindowResult<()> {
        self.file.read_up_to_at(&mut data.bytes, self.offset_of(first))?;
        data.first_record = Some(first);
        Ok(())
    }

    /// Writes a window back if it is dirty.
    fn write_back(&self, window: &Window, data: &WindowData) -> WindowResult<()> {
        let Some(first) = data.first_record else {
            return Ok(());
        };
        if !window.take_dirty() {
            return Ok(());
        }
        if let Err(err) = self.file.write_all_at(&data.bytes, self.offset_of(first)) {
            window.mark_dirty();
            return Err(err.into());
        }
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// A claimed region for one direct transfer, released on drop.
struct TransferClaim<'a> {
    pool: &'a WindowPool,
    first: u64,
}

impl Drop for TransferClaim<'_> {
    fn drop(&mut self) {
        self.pool.end_transfer(self.first);
    }
}

impl std::fmt::Debug for WindowPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowPool")
            .field("window_count", &self.config.window_count)
            .field("records_per_window", &self.config.records_per_window)
            .field("record_size", &self.config.record_size)
            .field("stats", &self.stats())
            .finish()
    }
}
