//! # grove-storage
//!
//! Record storage core for Grove.
//!
//! This crate implements the bottom layer of the graph store:
//! - **file**: synchronous positional file I/O
//! - **id**: a persistent identifier allocator with batched free-list
//!   reuse and crash detection
//! - **window**: a pool of in-memory record windows with LRU eviction
//! - **store**: fixed-record stores for nodes and relationships, plus
//!   allocator rebuild after a crash
//!
//! ## Example
//!
//! ```rust,no_run
//! use grove_common::config::StoreConfig;
//! use grove_storage::store::{NodeRecord, NodeStore};
//!
//! fn example() -> grove_storage::store::StoreResult<()> {
//!     NodeStore::create("graph/nodes.db")?;
//!     let nodes = NodeStore::open("graph/nodes.db", &StoreConfig::default())?;
//!
//!     let id = nodes.next_id()?;
//!     nodes.update_record(&NodeRecord::new(id))?;
//!
//!     nodes.close()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// File management and I/O
pub mod file;

/// Identifier allocation
pub mod id;

/// Record store implementations
pub mod store;

/// Buffered record windows
pub mod window;
