//! Type definitions shared by every Grove store.

mod ids;
mod keys;

pub use ids::{RecordId, MAX_HIGH_ID};
pub use keys::EntityKey;
