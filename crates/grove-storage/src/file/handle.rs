//! File handle trait.

use std::path::Path;

use super::error::{IoError, IoResult};

/// Positional access to one store file.
///
/// The allocator, the window pool and the record stores only see this
/// trait. Every call names its offset, so no cursor is shared.
pub trait FileHandle: Send + Sync {
    /// Returns the file path.
    fn path(&self) -> &Path;

    /// Returns the current length in bytes.
    fn size(&self) -> IoResult<u64>;

    /// Reads into `buf` at `offset`, returning the bytes read (0 at EOF).
    fn read_at(&self, buf: &mut [u8], offset: u64) -> IoResult<usize>;

    /// Writes `buf` at `offset`, returning the bytes written.
    fn write_at(&self, buf: &[u8], offset: u64) -> IoResult<usize>;

    /// Flushes data and metadata to stable storage.
    fn sync(&self) -> IoResult<()>;

    /// Truncates or extends the file.
    fn set_len(&self, size: u64) -> IoResult<()>;

    /// Fills `buf` from `offset`; running into EOF is an error.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
        let read = self.read_up_to_at(buf, offset)?;
        if read < buf.len() {
            return Err(IoError::short_read(offset, buf.len(), read));
        }
        Ok(())
    }

    /// Fills `buf` from `offset`, zeroing whatever lies past EOF.
    ///
    /// Returns the number of bytes that came from the file. Record slots
    /// beyond the end of a data file read as free records this way.
    fn read_up_to_at(&self, buf: &mut [u8], offset: u64) -> IoResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_at(&mut buf[filled..], offset + filled as u64)? {
                0 => break,
                n => filled += n,
            }
        }
        buf[filled..].fill(0);
        Ok(filled)
    }

    /// Writes all of `buf` at `offset`.
    fn write_all_at(&self, buf: &[u8], offset: u64) -> IoResult<()> {
        let mut written = 0;
        while written < buf.len() {
            match self.write_at(&buf[written..], offset + written as u64)? {
                0 => return Err(IoError::short_write(offset, buf.len(), written)),
                n => written += n,
            }
        }
        Ok(())
    }
}
