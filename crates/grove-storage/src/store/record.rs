//! Fixed-width record encoding.
//!
//! ```text
//! offset 0       1              5              9
//!        ┌───────┬──────────────┬──────────────┬─────
//!        │in_use │ field (u32)  │ field (u32)  │ ...
//!        └───────┴──────────────┴──────────────┴─────
//! ```
//!
//! The first byte is the in-use flag; every other field is a 4-byte
//! big-endian integer. Link fields hold [`RecordId::NONE`] when unset.

use std::fmt;

use grove_common::constants::{RECORD_IN_USE, RECORD_NOT_IN_USE};
use grove_common::types::RecordId;

use super::kind::StoreKind;

/// A record stored in a [`FixedRecordStore`](super::FixedRecordStore).
pub trait Record: Clone + fmt::Debug + Send + Sync {
    /// The store kind holding this record type.
    const KIND: StoreKind;

    /// Encoded size in bytes.
    const SIZE: usize = Self::KIND.record_size();

    /// Returns the record id.
    fn id(&self) -> RecordId;

    /// Returns true if the record is in use.
    fn in_use(&self) -> bool;

    /// Sets the in-use flag.
    fn set_in_use(&mut self, in_use: bool);

    /// Encodes into `buf`, which is exactly [`Self::SIZE`] bytes.
    fn encode(&self, buf: &mut [u8]);

    /// Decodes from `buf`, which is exactly [`Self::SIZE`] bytes.
    fn decode(id: RecordId, buf: &[u8]) -> Self;

    /// Returns the sentinel record stored at a reserved id.
    fn reserved(id: RecordId) -> Self;
}

/// Returns true if the encoded record in `buf` is in use.
#[inline]
pub(crate) fn encoded_in_use(buf: &[u8]) -> bool {
    buf[0] == RECORD_IN_USE
}

/// Field cursor over an encoded record.
pub(crate) struct FieldWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> FieldWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8], in_use: bool) -> Self {
        buf[0] = if in_use { RECORD_IN_USE } else { RECORD_NOT_IN_USE };
        Self { buf, pos: 1 }
    }

    pub(crate) fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&value.to_be_bytes());
        self.pos += 4;
        self
    }

    pub(crate) fn put_link(&mut self, id: RecordId) -> &mut Self {
        self.put_u32(id.to_field())
    }
}

/// Field cursor over a record being decoded.
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 1 }
    }

    pub(crate) fn in_use(&self) -> bool {
        encoded_in_use(self.buf)
    }

    pub(crate) fn u32(&mut self) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        u32::from_be_bytes(raw)
    }

    pub(crate) fn link(&mut self) -> RecordId {
        RecordId::from_field(self.u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_cursors() {
        let mut buf = [0u8; 9];
        FieldWriter::new(&mut buf, true)
            .put_u32(0x0102_0304)
            .put_link(RecordId::NONE);
        assert_eq!(buf, [1, 1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF]);

        let mut reader = FieldReader::new(&buf);
        assert!(reader.in_use());
        assert_eq!(reader.u32(), 0x0102_0304);
        assert!(reader.link().is_none());
    }

    #[test]
    fn test_only_flag_one_is_in_use() {
        assert!(!FieldReader::new(&[0u8, 0, 0, 0, 0]).in_use());
        assert!(!FieldReader::new(&[2u8, 0, 0, 0, 0]).in_use());
    }
}
