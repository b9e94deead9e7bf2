//! Configuration for Grove record stores.

mod store;

pub use store::{ConfigError, StoreConfig, WindowConfig};
