//! Record store errors.

use std::path::PathBuf;

use grove_common::types::{EntityKey, RecordId};
use grove_common::ErrorKind;
use thiserror::Error;

use super::kind::StoreKind;
use crate::file::IoError;
use crate::id::IdError;
use crate::window::WindowError;

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum StoreError {
    /// The store path is empty.
    #[error("store path must not be empty")]
    EmptyPath,

    /// Invalid store configuration.
    #[error("invalid store configuration: {message}")]
    InvalidConfig { message: String },

    /// Write to an id the allocator never handed out.
    #[error("{kind} id {id} is not below high id {high_id}")]
    IdOutOfRange {
        kind: StoreKind,
        id: RecordId,
        high_id: u64,
    },

    /// An id outside the addressable record space.
    #[error("{kind} id {id} is not addressable")]
    IdNotAddressable { kind: StoreKind, id: RecordId },

    /// The store files already exist.
    #[error("store file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The store file does not exist.
    #[error("store file not found: {path}")]
    NotFound { path: PathBuf },

    /// Malformed data file.
    #[error("store file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Strict access to a record that is not in use.
    #[error("{key} is not in use")]
    NotInUse { key: EntityKey },

    /// The store has been closed.
    #[error("store is closed")]
    Closed,

    /// Identifier allocator error.
    #[error("id allocator error: {0}")]
    Id(#[from] IdError),

    /// Window pool error.
    #[error("window pool error: {0}")]
    Window(#[from] WindowError),

    /// File I/O error.
    #[error("file I/O error: {0}")]
    File(#[from] IoError),
}

impl StoreError {
    /// Creates a corruption error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Maps a file-open failure onto the store's path errors.
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
            | Self::InvalidConfig { .. }
            | Self::IdOutOfRange { .. }
            | Self::IdNotAddressable { .. } => ErrorKind::InvalidArgument,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Corrupt { .. } => ErrorKind::Corrupt,
            Self::NotInUse { .. } => ErrorKind::NotInUse,
            Self::Closed => ErrorKind::IllegalState,
            Self::Id(err) => err.kind(),
            Self::Window(err) => err.kind(),
            Self::File(err) => err.kind(),
        }
    }

    /// Returns true if this is a transient error that can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Id(err) => err.is_retryable(),
            Self::Window(err) => err.is_retryable(),
            Self::File(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a fatal error.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = StoreError::NotInUse {
            key: StoreKind::Node.entity_key(RecordId::new(3)),
        };
        assert_eq!(err.kind(), ErrorKind::NotInUse);
        assert_eq!(err.to_string(), "node[3] is not in use");

        assert_eq!(StoreError::Closed.kind(), ErrorKind::IllegalState);
        assert_eq!(StoreError::EmptyPath.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_nested_kind_delegates() {
        let err: StoreError = IdError::Sticky {
            path: "nodes.db.id".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Sticky);
        assert!(err.is_fatal());

        let err: StoreError = WindowError::ShutDown.into();
        assert_eq!(err.kind(), ErrorKind::IllegalState);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_open() {
        let err = StoreError::from_open(IoError::NotFound { path: "nodes.db".into() }, "nodes.db");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
