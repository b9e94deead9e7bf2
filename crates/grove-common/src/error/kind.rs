//! Error kinds.

use std::fmt;

/// Error kinds for categorizing errors.
///
/// These kinds are stable across versions and can be used for programmatic
/// error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorKind {
    // Argument errors (0x00xx)
    /// Bad identifier, bad grab size, empty path, invalid configuration.
    InvalidArgument = 0x0001,

    // Path errors (0x01xx)
    /// The file to create already exists.
    AlreadyExists = 0x0101,
    /// The file to open does not exist.
    NotFound = 0x0102,

    // Integrity errors (0x02xx)
    /// The previous session did not close cleanly.
    Sticky = 0x0201,
    /// Malformed on-disk header or trailer.
    Corrupt = 0x0202,
    /// Strict record access on a slot that is not in use.
    NotInUse = 0x0203,
    /// The identifier space is exhausted.
    CapacityExceeded = 0x0204,

    // State errors (0x03xx)
    /// Operation on a closed allocator, pool, or store.
    IllegalState = 0x0301,

    // I/O errors (0x04xx)
    /// Underlying file I/O failed.
    Io = 0x0401,
}

impl ErrorKind {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(self) -> &'static str {
        match (self as u16) >> 8 {
            0x00 => "argument",
            0x01 => "path",
            0x02 => "integrity",
            0x03 => "state",
            _ => "io",
        }
    }

    /// Returns true for kinds that must never be retried.
    ///
    /// Structural corruption, a detected crash, and identifier exhaustion
    /// are surfaced to the caller, who decides whether to abort or run
    /// recovery tooling.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Sticky | Self::Corrupt | Self::CapacityExceeded)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
