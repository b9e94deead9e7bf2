//! # grove-common
//!
//! Common types, errors, and configuration for Grove record stores.
//!
//! This crate provides the foundational types shared by the storage engine
//! and the admin tooling:
//!
//! - **Types**: Record identifiers (`RecordId`) and entity keys (`EntityKey`)
//! - **Errors**: The stable `ErrorKind` taxonomy every layer maps into
//! - **Config**: Store and window pool configuration
//! - **Constants**: On-disk layout constants and defaults
//!
//! ## Example
//!
//! ```rust
//! use grove_common::config::StoreConfig;
//! use grove_common::types::{EntityKey, RecordId};
//!
//! let config = StoreConfig::for_testing();
//! assert!(config.validate().is_ok());
//!
//! let key = EntityKey::Node(RecordId::new(3));
//! assert_eq!(key.to_string(), "node[3]");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::{StoreConfig, WindowConfig};
pub use constants::*;
pub use error::ErrorKind;
pub use types::{EntityKey, RecordId, MAX_HIGH_ID};
