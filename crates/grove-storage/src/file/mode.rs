//! File access modes.

use std::fs;

/// How a store file is opened.
///
/// Each variant matches one step in the life of an allocator or data
/// file: inspection, normal use, first creation, and wholesale
/// replacement during a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Existing file, read only.
    Read,
    /// Existing file, read and write.
    ReadWrite,
    /// New file; fails if the path exists.
    CreateNew,
    /// New or existing file, truncated to zero length.
    Replace,
}

impl OpenMode {
    /// Returns true if the mode allows writes.
    #[inline]
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Read)
    }

    /// Builds the matching `std::fs::OpenOptions`.
    pub fn to_std(self) -> fs::OpenOptions {
        let mut opts = fs::OpenOptions::new();
        opts.read(true).write(self.is_writable());
        match self {
            Self::Read | Self::ReadWrite => {}
            Self::CreateNew => {
                opts.create_new(true);
            }
            Self::Replace => {
                opts.create(true).truncate(true);
            }
        }
        opts
    }
}
