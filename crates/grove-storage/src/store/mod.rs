//! Fixed-record stores.
//!
//! A store keeps records of one [`StoreKind`] in a single data file, one
//! fixed-width slot per id, with identifiers managed by an
//! [`IdAllocator`](crate::id::IdAllocator) in `<path>.id`.
//!
//! # File Layout
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬─────┬──────────────┬──────────────────┐
//! │ record 0 │ record 1 │ record 2 │ ... │ record hi-1  │ descriptor       │
//! │ reserved │          │          │     │              │ (clean close)    │
//! └──────────┴──────────┴──────────┴─────┴──────────────┴──────────────────┘
//! ```
//!
//! Record 0 is a reserved sentinel, marked in use by `create`. The
//! descriptor trailer (for example `NodeStore v0.9.1`) is stripped on open
//! and rewritten at `high_id * record_size` on close; its absence marks a
//! store that was not closed cleanly.
//!
//! # Modes
//!
//! In [`StoreMode::NormalOperation`] overwriting an in-use record with one
//! that is not in use frees its id; deleting a free slot again frees
//! nothing. In [`StoreMode::RecoveryReplay`] deletes free nothing and
//! writes past the high id raise it instead of failing. Leaving replay,
//! or closing during it, rebuilds the free list from the records.

mod error;
mod fixed;
mod kind;
mod node;
mod record;
mod recovery;
mod relationship;
mod scratch;
mod stats;

pub use error::{StoreError, StoreResult};
pub use fixed::{id_file_path, FixedRecordStore};
pub use kind::StoreKind;
pub use node::NodeRecord;
pub use record::Record;
pub use recovery::RebuildReport;
pub use relationship::RelationshipRecord;
pub use scratch::ScratchBuffer;
pub use stats::{StoreMode, StoreState, StoreStats};

/// Store of [`NodeRecord`]s.
pub type NodeStore = FixedRecordStore<NodeRecord>;

/// Store of [`RelationshipRecord`]s.
pub type RelationshipStore = FixedRecordStore<RelationshipRecord>;
