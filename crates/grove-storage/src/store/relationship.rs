//! Relationship records.

use grove_common::types::RecordId;
use serde::{Deserialize, Serialize};

use super::kind::StoreKind;
use super::record::{FieldReader, FieldWriter, Record};

/// A relationship between two nodes.
///
/// Each relationship sits in two doubly linked chains, one per endpoint.
///
/// Layout: `in_use (1) | first_node | second_node | rel_type |
/// first_prev_rel | first_next_rel | second_prev_rel | second_next_rel |
/// next_prop` with every field 4 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Record id.
    pub id: RecordId,
    /// Whether the record is in use.
    pub in_use: bool,
    /// Start node.
    pub first_node: RecordId,
    /// End node.
    pub second_node: RecordId,
    /// Relationship type id.
    pub rel_type: u32,
    /// Previous relationship in the start node's chain.
    pub first_prev_rel: RecordId,
    /// Next relationship in the start node's chain.
    pub first_next_rel: RecordId,
    /// Previous relationship in the end node's chain.
    pub second_prev_rel: RecordId,
    /// Next relationship in the end node's chain.
    pub second_next_rel: RecordId,
    /// First property of this relationship.
    pub next_prop: RecordId,
}

impl RelationshipRecord {
    /// Creates an in-use, unlinked relationship.
    pub fn new(id: RecordId, first_node: RecordId, second_node: RecordId, rel_type: u32) -> Self {
        Self {
            id,
            in_use: true,
            first_node,
            second_node,
            rel_type,
            first_prev_rel: RecordId::NONE,
            first_next_rel: RecordId::NONE,
            second_prev_rel: RecordId::NONE,
            second_next_rel: RecordId::NONE,
            next_prop: RecordId::NONE,
        }
    }
}

impl Record for RelationshipRecord {
    const KIND: StoreKind = StoreKind::Relationship;

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
            .put_link(self.first_node)
            .put_link(self.second_node)
            .put_u32(self.rel_type)
            .put_link(self.first_prev_rel)
            .put_link(self.first_next_rel)
            .put_link(self.second_prev_rel)
            .put_link(self.second_next_rel)
            .put_link(self.next_prop);
    }

    fn decode(id: RecordId, buf: &[u8]) -> Self {
        let mut reader = FieldReader::new(buf);
        Self {
            id,
            in_use: reader.in_use(),
            first_node: reader.link(),
            second_node: reader.link(),
            rel_type: reader.u32(),
            first_prev_rel: reader.link(),
            first_next_rel: reader.link(),
            second_prev_rel: reader.link(),
            second_next_rel: reader.link(),
            next_prop: reader.link(),
        }
    }

    fn reserved(id: RecordId) -> Self {
        Self::new(id, RecordId::NONE, RecordId::NONE, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_layout() {
        let mut rel = RelationshipRecord::new(RecordId::new(2), RecordId::new(1), RecordId::new(4), 3);
        rel.first_next_rel = RecordId::new(9);

        let mut buf = [0u8; RelationshipRecord::SIZE];
        rel.encode(&mut buf);
        assert_eq!(buf.len(), 33);
        assert_eq!(buf[0], 1);
        assert_eq!(&buf[1..5], &[0, 0, 0, 1]);
        assert_eq!(&buf[5..9], &[0, 0, 0, 4]);
        assert_eq!(&buf[9..13], &[0, 0, 0, 3]);
        assert_eq!(&buf[13..17], &[0xFF; 4]);
        assert_eq!(&buf[17..21], &[0, 0, 0, 9]);
        assert_eq!(&buf[29..33], &[0xFF; 4]);

        assert_eq!(RelationshipRecord::decode(rel.id, &buf), rel);
    }

    #[test]
    fn test_reserved() {
        let sentinel = RelationshipRecord::reserved(RecordId::FIRST);
        assert!(sentinel.in_use());
        assert!(sentinel.first_node.is_none());
        assert_eq!(sentinel.rel_type, 0);
    }
}
