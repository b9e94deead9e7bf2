//! Node records.

use grove_common::types::RecordId;
use serde::{Deserialize, Serialize};

use super::kind::StoreKind;
use super::record::{FieldReader, FieldWriter, Record};

/// A node: the head of its relationship chain and property chain.
///
/// Layout: `in_use (1) | next_rel (4) | next_prop (4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Record id.
    pub id: RecordId,
    /// Whether the record is in use.
    pub in_use: bool,
    /// First relationship of this node.
    pub next_rel: RecordId,
    /// First property of this node.
    pub next_prop: RecordId,
}

impl NodeRecord {
    /// Creates an in-use node with no relationships or properties.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            in_use: true,
            next_rel: RecordId::NONE,
            next_prop: RecordId::NONE,
        }
    }

    /// Sets the first relationship.
    #[must_use]
    pub fn with_next_rel(mut self, next_rel: RecordId) -> Self {
        self.next_rel = next_rel;
        self
    }

    /// Sets the first property.
    #[must_use]
    pub fn with_next_prop(mut self, next_prop: RecordId) -> Self {
        self.next_prop = next_prop;
        self
    }
}

impl Record for NodeRecord {
    const KIND: StoreKind = StoreKind::Node;

    fn id(&self) -> RecordId {
        self.id
    }

    fn in_use(&self) -> bool {
        self.in_use
    }

    fn set_in_use(&mut self, in_use: bool) {
        self.in_use = in_use;
    }

    fn encode(&self, buf: &mut [u8]) {
        FieldWriter::new(buf, self.in_use)
            .put_link(self.next_rel)
            .put_link(self.next_prop);
    }

    fn decode(id: RecordId, buf: &[u8]) -> Self {
        let mut reader = FieldReader::new(buf);
        Self {
            id,
            in_use: reader.in_use(),
            next_rel: reader.link(),
            next_prop: reader.link(),
        }
    }

    fn reserved(id: RecordId) -> Self {
        Self::new(id)
    }
}
