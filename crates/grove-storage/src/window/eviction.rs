//! Least-recently-used window replacement.
//!
//! Every acquisition stamps the slot with a monotonically increasing tick.
//! The victim is the first empty slot if there is one, otherwise the
//! unpinned slot with the oldest tick. Pinned slots are never chosen.

use super::window::SlotMeta;

/// LRU replacement policy for the window pool.
#[derive(Debug)]
pub struct LruReplacer {
    /// Number of slots in the pool.
    num_slots: usize,
}

impl LruReplacer {
    /// Creates a replacer for `num_slots` slots.
    pub fn new(num_slots: usize) -> Self {
        Self { num_slots }
    }

    /// Returns the number of slots.
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Picks the slot to (re)use, or `None` if every slot is pinned.
    pub(crate) fn find_victim(&self, slots: &[SlotMeta]) -> Option<usize> {
        let slots = &slots[..self.num_slots.min(slots.len())];

        if let Some(free) = slots
            .iter()
            .position(|meta| meta.is_empty() && meta.is_unpinned())
        {
            return Some(free);
        }

        slots
            .iter()
            .enumerate()
            .filter(|(_, meta)| meta.is_unpinned())
            .min_by_key(|(_, meta)| meta.last_access)
            .map(|(slot, _)| slot)
    }
}
