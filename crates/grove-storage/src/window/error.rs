//! Window pool errors.

use grove_common::ErrorKind;
use thiserror::Error;

/// Result type for window pool operations.
pub type WindowResult<T> = Result<T, WindowError>;

/// Errors that can occur during window pool operations.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum WindowError {
    /// The pool has been shut down.
    #[error("window pool is shut down")]
    ShutDown,

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// File I/O error.
    #[error("file I/O error: {0}")]
    File(#[from] crate::file::IoError),
}

impl WindowError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns the stable error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ShutDown => ErrorKind::IllegalState,
            Self::Config { .. } => ErrorKind::InvalidArgument,
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
