//! I/O error types for the file module.

use std::io;
use std::path::PathBuf;

use grove_common::ErrorKind;
use thiserror::Error;

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors raised by positional file access.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum IoError {
    /// The operating system call failed.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// The file to open does not exist.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// The file to create already exists.
    #[error("file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The file ended (or stopped accepting bytes) inside a transfer.
    #[error("short {operation} at offset {offset}: {actual} of {expected} bytes")]
    ShortIo {
        operation: &'static str,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// A write was attempted through a read-only handle.
    #[error("{operation} on read-only file {path}")]
    ReadOnly {
        operation: &'static str,
        path: PathBuf,
    },
}

impl IoError {
    /// Creates a ShortIo error for a read starting at `offset`.
    pub fn short_read(offset: u64, expected: usize, actual: usize) -> Self {
        Self::ShortIo {
            operation: "read",
            offset,
            expected,
            actual,
        }
    }

    /// Creates a ShortIo error for a write starting at `offset`.
    pub fn short_write(offset: u64, expected: usize, actual: usize) -> Self {
        Self::ShortIo {
            operation: "write",
            offset,
            expected,
            actual,
        }
    }

    /// Maps an open failure, keeping the path for the cases callers
    /// report by name.
    pub fn on_open(err: io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path: path.into() },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists { path: path.into() },
            _ => Self::Io { source: err },
        }
    }

    /// Returns the stable error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::ReadOnly { .. } => ErrorKind::IllegalState,
            Self::Io { .. } | Self::ShortIo { .. } => ErrorKind::Io,
        }
    }

    /// Returns true for interrupted calls that may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { source } if matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            )
        )
    }
}
