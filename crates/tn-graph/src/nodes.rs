//! Node metadata table keyed by dense index.

use tn_core::{GeoPoint, NodeIdx};

use crate::{GraphError, GraphResult};

/// One row of the node table.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// GraphML node id.
    pub node_id:    String,
    pub idx:        NodeIdx,
    pub pos:        GeoPoint,
    pub osmid:      i64,
    /// Set for nodes removed by pruning.  Retained tables never contain a
    /// row with this flag set; the column is kept for auditing.
    pub is_invalid: bool,
}

/// Node metadata ordered by dense index: `records[i].idx == NodeIdx(i)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTable {
    records: Vec<NodeRecord>,
}

impl NodeTable {
    /// Wrap records that are already known to be contiguous.
    pub(crate) fn from_ordered(records: Vec<NodeRecord>) -> Self {
        debug_assert!(records.iter().enumerate().all(|(i, r)| r.idx.index() == i));
        Self { records }
    }

    /// Build a table from rows read back from disk, checking that indices
    /// enumerate `0..N` in order.
    pub fn from_records(records: Vec<NodeRecord>) -> GraphResult<Self> {
        if let Some((position, r)) = records
            .iter()
            .enumerate()
            .find(|(i, r)| r.idx.index() != *i)
        {
            return Err(GraphError::NonContiguousIndex { position, idx: r.idx.0 });
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: NodeIdx) -> Option<&NodeRecord> {
        self.records.get(idx.index())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a NodeTable {
    type Item = &'a NodeRecord;
    type IntoIter = std::slice::Iter<'a, NodeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
