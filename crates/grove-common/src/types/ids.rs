//! Record identifier type.
//!
//! A record's identifier is its slot index in a fixed-record store file.
//! Identifiers are dense: every value below a store's high id is either in
//! use or free.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest legal high id (`2^32 - 2`).
///
/// Because the high id is one past the greatest allocated identifier, the
/// largest identifier that can ever be handed out is `MAX_HIGH_ID - 1`.
pub const MAX_HIGH_ID: u64 = (1 << 32) - 2;

/// Record identifier - the slot index of a fixed-width record.
///
/// # Example
///
/// ```rust
/// use grove_common::types::RecordId;
///
/// let id = RecordId::new(42);
/// assert_eq!(id.as_u64(), 42);
/// assert!(!id.is_none());
/// assert!(RecordId::NONE.is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// "No such record" sentinel (`2^32 - 1`), stored in link fields.
    pub const NONE: Self = Self(u32::MAX as u64);

    /// Slot 0, reserved for the sentinel record of every store.
    pub const FIRST: Self = Self(0);

    /// Creates a new `RecordId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the `NONE` sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// Returns true if this identifier can address a record slot.
    #[inline]
    #[must_use]
    pub const fn is_addressable(self) -> bool {
        self.0 < MAX_HIGH_ID
    }

    /// Returns the next record ID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Decodes a 4-byte on-disk link field.
    #[inline]
    #[must_use]
    pub const fn from_field(raw: u32) -> Self {
        Self(raw as u64)
    }

    /// Encodes into a 4-byte on-disk link field.
    ///
    /// Identifiers never exceed 32 bits, so the truncation is lossless for
    /// every value a store can produce, `NONE` included.
    #[inline]
    #[must_use]
    pub const fn to_field(self) -> u32 {
        self.0 as u32
    }

    /// Creates a RecordId from bytes (big-endian).
    #[inline]
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Converts to bytes (big-endian).
    #[inline]
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "RecordId(NONE)")
        } else {
            write!(f, "RecordId({})", self.0)
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<RecordId> for u64 {
    #[inline]
    fn from(id: RecordId) -> Self {
        id.0
    }
}
