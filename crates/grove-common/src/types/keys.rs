//! Entity keys.
//!
//! An `EntityKey` names a graph entity by kind and record id. It carries no
//! behavior and is meant to be used as a key in lock tables and maps by the
//! layers above the record stores.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RecordId;

/// A tagged identifier for a graph entity.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use grove_common::types::{EntityKey, RecordId};
///
/// let mut locked = HashSet::new();
/// locked.insert(EntityKey::Node(RecordId::new(3)));
/// assert!(locked.contains(&EntityKey::Node(RecordId::new(3))));
/// assert!(!locked.contains(&EntityKey::Relationship(RecordId::new(3))));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKey {
    /// A node record.
    Node(RecordId),
    /// A relationship record.
    Relationship(RecordId),
}

impl EntityKey {
    /// Returns the record id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> RecordId {
        match self {
            Self::Node(id) | Self::Relationship(id) => id,
        }
    }

    /// Returns the entity kind as a lowercase name.
    #[must_use]
    pub const fn kind_name(self) -> &'static str {
        match self {
            Self::Node(_) => "node",
            Self::Relationship(_) => "relationship",
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind_name(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_key_identity() {
        let a = EntityKey::Node(RecordId::new(1));
        let b = EntityKey::Relationship(RecordId::new(1));
        assert_ne!(a, b);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.kind_name(), "node");
        assert_eq!(b.kind_name(), "relationship");
    }

    #[test]
    fn test_key_as_map_key() {
        let mut owners: HashMap<EntityKey, u32> = HashMap::new();
        owners.insert(EntityKey::Node(RecordId::new(5)), 1);
        owners.insert(EntityKey::Relationship(RecordId::new(5)), 2);
        assert_eq!(owners.len(), 2);
        assert_eq!(owners[&EntityKey::Node(RecordId::new(5))], 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityKey::Node(RecordId::new(9)).to_string(), "node[9]");
    }
}
