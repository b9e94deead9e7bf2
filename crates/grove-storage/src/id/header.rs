//! Allocator file header.
//!
//! ```text
//! offset 0      1                       9
//!        ┌──────┬───────────────────────┬──────────────────────────┐
//!        │sticky│ high id (u64, BE)     │ free ids (u64 BE each) … │
//!        └──────┴───────────────────────┴──────────────────────────┘
//! ```

use std::path::Path;

use grove_common::constants::{ID_CLEAN, ID_ENTRY_SIZE, ID_HEADER_SIZE};
use serde::{Deserialize, Serialize};

use super::error::{IdError, IdResult};

/// Summary of an allocator file, read without opening it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdFileHeader {
    /// True if the file is still marked open (or its owner crashed).
    pub sticky: bool,
    /// One past the greatest identifier ever allocated.
    pub high_id: u64,
    /// Number of free-list entries in the body.
    pub free_ids: u64,
}

/// Encodes a header.
pub(crate) fn encode(sticky_byte: u8, high_id: u64) -> [u8; ID_HEADER_SIZE] {
    let mut buf = [0u8; ID_HEADER_SIZE];
    buf[0] = sticky_byte;
    buf[1..].copy_from_slice(&high_id.to_be_bytes());
    buf
}

/// Decodes a header into `(sticky, high_id)`.
pub(crate) fn decode(buf: &[u8; ID_HEADER_SIZE]) -> (bool, u64) {
    let mut high = [0u8; 8];
    high.copy_from_slice(&buf[1..]);
    (buf[0] != ID_CLEAN, u64::from_be_bytes(high))
}

/// Validates an allocator file length and returns its entry count.
pub(crate) fn entry_count(path: &Path, len: u64) -> IdResult<u64> {
    let header = ID_HEADER_SIZE as u64;
    let entry = ID_ENTRY_SIZE as u64;
    if len < header {
        return Err(IdError::corrupt(
            path,
            format!("file is {len} bytes, shorter than the {header}-byte header"),
        ));
    }
    if (len - header) % entry != 0 {
        return Err(IdError::corrupt(
            path,
            format!("body of {} bytes is not a whole number of ids", len - header),
        ));
    }
    Ok((len - header) / entry)
}
