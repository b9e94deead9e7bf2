//! Caller-owned buffers for direct record transfers.

/// A reusable byte buffer for the `*_direct` store operations.
///
/// Direct transfers bypass the window pool; the scratch buffer lets a
/// caller reuse one allocation across many such calls instead of
/// allocating per record.
#[derive(Debug, Default, Clone)]
pub struct ScratchBuffer {
    bytes: Vec<u8>,
}

impl ScratchBuffer {
    /// Creates an empty scratch buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scratch buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Returns a zeroed slice of exactly `len` bytes.
    pub fn slice(&mut self, len: usize) -> &mut [u8] {
        self.bytes.clear();
        self.bytes.resize(len, 0);
        &mut self.bytes
    }

    /// Returns the current capacity.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}
