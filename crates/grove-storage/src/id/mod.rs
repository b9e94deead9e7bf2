//! Identifier allocation for fixed-record stores.
//!
//! Every store owns one allocator file next to its data file
//! (`<data path>.id`). The allocator hands out dense identifiers starting
//! at 0 and recycles released ones in batch order across sessions.
//!
//! # Lifecycle
//!
//! ```text
//!   create ──► open (sticky=1) ──► allocate / release ... ──► close (sticky=0)
//!                    ▲                                          │
//!                    └──────────────────────────────────────────┘
//! ```
//!
//! A crash between `open` and `close` leaves the sticky flag set and the
//! next `open` fails with [`IdError::Sticky`]. The store recovery tooling
//! rebuilds the file from the data file in that case.

mod allocator;
mod error;
mod header;

pub use allocator::IdAllocator;
pub use error::{IdError, IdResult};
pub use header::IdFileHeader;
