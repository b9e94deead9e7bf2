//! Identifier allocator errors.

use std::path::PathBuf;

use grove_common::ErrorKind;
use thiserror::Error;

use crate::file::IoError;

/// Result type for identifier allocator operations.
pub type IdResult<T> = Result<T, IdError>;

/// Errors that can occur while creating, opening or using an allocator.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum IdError {
    /// The allocator path is empty.
    #[error("allocator path must not be empty")]
    EmptyPath,

    /// Grab size must be positive.
    #[error("invalid grab size: {grab_size}")]
    InvalidGrabSize { grab_size: usize },

    /// The identifier was never handed out.
    #[error("id {id} is not below high id {high_id}")]
    NotAllocated { id: u64, high_id: u64 },

    /// `set_high_id` would move the high id backward.
    #[error("cannot lower high id from {current} to {requested}")]
    HighIdBackward { current: u64, requested: u64 },

    /// A free-list entry outside the identifier space.
    #[error("free id {id} is not below high id {high_id}")]
    FreeIdOutOfRange { id: u64, high_id: u64 },

    /// The file to create already exists.
    #[error("allocator file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The file to open does not exist.
    #[error("allocator file not found: {path}")]
    NotFound { path: PathBuf },

    /// The file is not a well-formed allocator file.
    #[error("allocator file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The file was not closed cleanly by its previous owner.
    #[error("allocator file {path} is sticky (not closed cleanly)")]
    Sticky { path: PathBuf },

    /// The identifier space is exhausted.
    #[error("id capacity exceeded: high id {high_id}")]
    CapacityExceeded { high_id: u64 },

    /// The allocator has been closed.
    #[error("allocator is closed")]
    Closed,

    /// File I/O error.
    #[error("file I/O error: {0}")]
    File(#[from] IoError),
}

impl IdError {
    /// Creates a corruption error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Maps a file-open failure onto the allocator's path errors.
    pub(crate) fn from_open(err: IoError, path: impl Into<PathBuf>) -> Self {
        match err {
            IoError::NotFound { .. } => Self::NotFound { path: path.into() },
            IoError::AlreadyExists { .. } => Self::AlreadyExists { path: path.into() },
            other => Self::File(other),
        }
    }

    /// Returns the stable error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPath
            | Self::InvalidGrabSize { .. }
            | Self::NotAllocated { .. }
            | Self::HighIdBackward { .. }
            | Self::FreeIdOutOfRange { .. } => ErrorKind::InvalidArgument,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Corrupt { .. } => ErrorKind::Corrupt,
            Self::Sticky { .. } => ErrorKind::Sticky,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::Closed => ErrorKind::IllegalState,
            Self::File(err) => err.kind(),
        }
    }

    /// Returns true if this is a transient error that can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::File(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a fatal error.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}
