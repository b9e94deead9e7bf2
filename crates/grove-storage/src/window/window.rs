//! Window - a pooled in-memory copy of a run of records.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};

/// Contents of a window.
#[derive(Debug)]
pub(crate) struct WindowData {
    /// First record covered, `None` while the slot is empty.
    pub(crate) first_record: Option<u64>,
    /// Record bytes, `records_per_window * record_size` long.
    pub(crate) bytes: Vec<u8>,
}

/// A slot in the window pool.
///
/// The contents sit behind a per-window mutex, which gives callers mutual
/// exclusion on one window while disjoint windows proceed in parallel.
/// The dirty flag is atomic so statistics can be taken without waiting
/// for a window that is in use.
pub(crate) struct Window {
    /// Index in the pool's slot array.
    slot: usize,
    /// Window contents.
    data: Mutex<WindowData>,
    /// Whether the contents differ from the file.
    dirty: AtomicBool,
}

impl Window {
    /// Creates an empty window of `window_bytes` bytes.
    pub(crate) fn new(slot: usize, window_bytes: usize) -> Self {
        Self {
            slot,
            data: Mutex::new(WindowData {
                first_record: None,
                bytes: vec![0u8; window_bytes],
            }),
            dirty: AtomicBool::new(false),
        }
    }

    /// Returns the slot index.
    #[inline]
    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    /// Locks the window contents.
    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, WindowData> {
        self.data.lock()
    }

    /// Returns true if the window holds unwritten changes.
    #[inline]
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Marks the window dirty.
    #[inline]
    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clears the dirty flag, returning its previous value.
    #[inline]
    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("slot", &self.slot)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// Bookkeeping for one slot, guarded by the pool-state lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SlotMeta {
    /// First record covered, `None` while the slot is empty.
    pub(crate) first_record: Option<u64>,
    /// Number of live guards.
    pub(crate) pins: u32,
    /// Tick of the most recent acquisition.
    pub(crate) last_access: u64,
    /// Set while the slot's contents are written back and reloaded
    /// outside the pool-state lock.
    pub(crate) loading: bool,
}

impl SlotMeta {
    /// Returns true if no guard holds this slot.
    #[inline]
    pub(crate) fn is_unpinned(&self) -> bool {
        self.pins == 0
    }

    /// Returns true if the slot holds no window.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.first_record.is_none()
    }
}
