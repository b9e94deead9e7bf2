//! Error classification shared by every Grove component.
//!
//! Each module defines its own `thiserror` enum with the context it needs;
//! all of them map onto the stable [`ErrorKind`] classification so callers
//! can decide between aborting, running recovery, or fixing their input
//! without matching on module-specific variants.

mod kind;

pub use kind::ErrorKind;
