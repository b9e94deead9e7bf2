//! Static registry of record store kinds.
//!
//! Each kind fixes a record size and the descriptor trailer written at the
//! end of a cleanly closed data file.

use std::fmt;
use std::str::FromStr;

use grove_common::types::{EntityKey, RecordId};
use serde::{Deserialize, Serialize};

/// The kinds of fixed-record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Node records.
    Node,
    /// Relationship records.
    Relationship,
}

impl StoreKind {
    /// All store kinds.
    pub const ALL: [StoreKind; 2] = [StoreKind::Node, StoreKind::Relationship];

    /// Returns the lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Relationship => "relationship",
        }
    }

    /// Returns the descriptor trailer of a cleanly closed data file.
    pub const fn descriptor(self) -> &'static str {
        match self {
            Self::Node => "NodeStore v0.9.1",
            Self::Relationship => "RelationshipStore v0.9.1",
        }
    }

    /// Returns the size of one record in bytes.
    pub const fn record_size(self) -> usize {
        match self {
            Self::Node => 9,
            Self::Relationship => 33,
        }
    }

    /// Looks a kind up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Looks a kind up by its descriptor bytes.
    pub fn from_descriptor(bytes: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.descriptor().as_bytes() == bytes)
    }

    /// Returns the kind whose descriptor ends `tail`, if any.
    pub(crate) fn from_trailer(tail: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| tail.ends_with(kind.descriptor().as_bytes()))
    }

    /// Length of the longest descriptor.
    pub(crate) fn max_descriptor_len() -> usize {
        Self::ALL
            .iter()
            .map(|kind| kind.descriptor().len())
            .max()
            .unwrap_or(0)
    }

    /// Tags a record id with this kind.
    pub const fn entity_key(self, id: RecordId) -> EntityKey {
        match self {
            Self::Node => EntityKey::Node(id),
            Self::Relationship => EntityKey::Relationship(id),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(&s.to_ascii_lowercase()).ok_or_else(|| {
            format!("unknown store kind '{s}', expected one of: node, relationship")
        })
    }
}
