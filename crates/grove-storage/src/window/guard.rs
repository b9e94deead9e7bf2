//! Window guards for safe concurrent record access.
//!
//! A [`WindowGuard`] holds its window's content lock and a pin on the
//! slot. Dropping it releases the lock first and then the pin, on every
//! exit path.

use parking_lot::MutexGuard;

use super::pool::WindowPool;
use super::window::{Window, WindowData};

/// Pin on a pool slot, released on drop.
struct SlotPin<'a> {
    pool: &'a WindowPool,
    slot: usize,
}

impl Drop for SlotPin<'_> {
    fn drop(&mut self) {
        self.pool.unpin(self.slot);
    }
}

/// Exclusive access to one pinned window.
///
/// This guard:
/// - Provides read and write access to the window's records
/// - Keeps the window pinned (never evicted) while held
/// - Marks the window dirty when a record is borrowed mutably
pub struct WindowGuard<'a> {
    // Field order matters: the content lock is released before the pin.
    data: MutexGuard<'a, WindowData>,
    window: &'a Window,
    record_size: usize,
    first_record: u64,
    _pin: SlotPin<'a>,
}

impl<'a> WindowGuard<'a> {
    /// Wraps the locked contents of an already pinned window.
    pub(crate) fn new(
        pool: &'a WindowPool,
        window: &'a Window,
        data: MutexGuard<'a, WindowData>,
        first_record: u64,
        record_size: usize,
    ) -> Self {
        let pin = SlotPin {
            pool,
            slot: window.slot(),
        };
        Self {
            data,
            window,
            record_size,
            first_record,
            _pin: pin,
        }
    }

    /// Returns the first record covered by the window.
    #[inline]
    pub fn first_record(&self) -> u64 {
        self.first_record
    }

    /// Returns the number of records the window covers.
    #[inline]
    pub fn record_count(&self) -> usize {
        self.data.bytes.len() / self.record_size
    }

    /// Returns true if the window covers `record`.
    #[inline]
    pub fn covers(&self, record: u64) -> bool {
        record >= self.first_record && record - self.first_record < self.record_count() as u64
    }

    /// Returns the bytes of `record`.
    ///
    /// # Panics
    ///
    /// Panics if the window does not cover `record`.
    pub fn record_bytes(&self, record: u64) -> &[u8] {
        let start = self.offset_of(record);
        &self.data.bytes[start..start + self.record_size]
    }

    /// Returns the bytes of `record` for writing and marks the window dirty.
    ///
    /// # Panics
    ///
    /// Panics if the window does not cover `record`.
    pub fn record_bytes_mut(&mut self, record: u64) -> &mut [u8] {
        let start = self.offset_of(record);
        self.window.mark_dirty();
        &mut self.data.bytes[start..start + self.record_size]
    }

    /// Returns true if the window holds unwritten changes.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.window.is_dirty()
    }

    fn offset_of(&self, record: u64) -> usize {
        assert!(
            self.covers(record),
            "record {record} is outside window starting at {}",
            self.first_record
        );
        (record - self.first_record) as usize * self.record_size
    }
}

impl std::fmt::Debug for WindowGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowGuard")
            .field("slot", &self.window.slot())
            .field("first_record", &self.first_record)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
