//! Street network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeIdx n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`, `edge_weight_s`)
//! are sorted by source node.  Iteration over a node's outgoing edges is a
//! contiguous memory scan, which is what Dijkstra's inner loop wants when it
//! runs once per node for the all-pairs matrix.
//!
//! # Node identity
//!
//! Each node has three identities:
//!
//! - the **external id** from the GraphML `<node id="…">` attribute,
//! - its **OSM id** (`osmid` data attribute),
//! - its **dense index** (`NodeIdx`), assigned in insertion order.
//!
//! The dense index is the only key used by the matrix.  `lookup` maps an
//! external id back to it.

use rustc_hash::FxHashMap;

use tn_core::config::DEFAULT_SPEED_MPS;
use tn_core::{GeoPoint, NodeIdx};

use crate::nodes::{NodeRecord, NodeTable};
use crate::{GraphError, GraphResult};

// ── StreetNetwork ─────────────────────────────────────────────────────────────

/// Directed street graph in CSR format.
///
/// All fields except the id index are `pub` for direct indexed access on hot
/// paths.  Do not construct directly; use [`StreetNetworkBuilder`].
#[derive(Debug)]
pub struct StreetNetwork {
    // ── Node data (indexed by NodeIdx) ────────────────────────────────────
    pub node_ext_id: Vec<String>,
    pub node_pos:    Vec<GeoPoint>,
    pub node_osmid:  Vec<i64>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by position in sorted order) ───────────────────
    pub edge_from: Vec<NodeIdx>,
    pub edge_to:   Vec<NodeIdx>,

    /// Physical length of each edge in metres.
    pub edge_length_m: Vec<f64>,

    /// Travel time in seconds.  Used as the Dijkstra edge cost.
    pub edge_weight_s: Vec<f64>,

    ext_index: FxHashMap<String, NodeIdx>,
}

impl StreetNetwork {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Range of edge positions for all outgoing edges of `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeIdx) -> std::ops::Range<usize> {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        start..end
    }

    #[inline]
    pub fn out_degree(&self, node: NodeIdx) -> usize {
        self.out_edges(node).len()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// Dense index of the node with GraphML id `ext_id`.
    pub fn lookup(&self, ext_id: &str) -> Option<NodeIdx> {
        self.ext_index.get(ext_id).copied()
    }

    // ── Weights ───────────────────────────────────────────────────────────

    /// Recompute every edge weight as `length / speed_mps` seconds.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidSpeed`] if `speed_mps` is not positive and finite.
    pub fn assign_weights(&mut self, speed_mps: f64) -> GraphResult<()> {
        if !(speed_mps.is_finite() && speed_mps > 0.0) {
            return Err(GraphError::InvalidSpeed(speed_mps));
        }
        for (w, &len) in self.edge_weight_s.iter_mut().zip(&self.edge_length_m) {
            *w = len / speed_mps;
        }
        Ok(())
    }

    /// Snapshot the node metadata as a [`NodeTable`] ordered by dense index.
    pub fn node_table(&self) -> NodeTable {
        let records = (0..self.node_count())
            .map(|i| NodeRecord {
                node_id:    self.node_ext_id[i].clone(),
                idx:        NodeIdx(i as u32),
                pos:        self.node_pos[i],
                osmid:      self.node_osmid[i],
                is_invalid: false,
            })
            .collect();
        NodeTable::from_ordered(records)
    }
}

// ── StreetNetworkBuilder ──────────────────────────────────────────────────────

/// Construct a [`StreetNetwork`] incrementally, then call [`build`](Self::build).
///
/// Nodes receive sequential dense indices in the order they are added.  Edges
/// may be added in any order; `build()` sorts them by source node (stable, so
/// parallel edges keep their relative order) and lays out the CSR arrays.
///
/// # Example
///
/// ```
/// use tn_core::GeoPoint;
/// use tn_graph::StreetNetworkBuilder;
///
/// let mut b = StreetNetworkBuilder::new();
/// let a = b.add_node("a", GeoPoint::new(-73.99, 40.75), 1).unwrap();
/// let c = b.add_node("c", GeoPoint::new(-73.98, 40.76), 2).unwrap();
/// b.add_road(a, c, 90.0);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// assert_eq!(net.edge_weight_s[0], 10.0); // 90 m at 9 m/s
/// ```
pub struct StreetNetworkBuilder {
    ext_ids:   Vec<String>,
    positions: Vec<GeoPoint>,
    osmids:    Vec<i64>,
    ext_index: FxHashMap<String, NodeIdx>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:     NodeIdx,
    to:       NodeIdx,
    length_m: f64,
}

impl StreetNetworkBuilder {
    pub fn new() -> Self {
        Self {
            ext_ids:   Vec::new(),
            positions: Vec::new(),
            osmids:    Vec::new(),
            ext_index: FxHashMap::default(),
            raw_edges: Vec::new(),
        }
    }

    /// Add a node and return its dense index (sequential from 0).
    ///
    /// # Errors
    ///
    /// [`GraphError::DuplicateNode`] if `ext_id` was already added.
    pub fn add_node(
        &mut self,
        ext_id: impl Into<String>,
        pos:    GeoPoint,
        osmid:  i64,
    ) -> GraphResult<NodeIdx> {
        let ext_id = ext_id.into();
        if self.ext_index.contains_key(&ext_id) {
            return Err(GraphError::DuplicateNode(ext_id));
        }
        let idx = NodeIdx(self.ext_ids.len() as u32);
        self.ext_index.insert(ext_id.clone(), idx);
        self.ext_ids.push(ext_id);
        self.positions.push(pos);
        self.osmids.push(osmid);
        Ok(idx)
    }

    /// Dense index of a node added earlier.
    pub fn lookup(&self, ext_id: &str) -> Option<NodeIdx> {
        self.ext_index.get(ext_id).copied()
    }

    /// Add a **directed** edge of `length_m` metres from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeIdx, to: NodeIdx, length_m: f64) {
        self.raw_edges.push(RawEdge { from, to, length_m });
    }

    /// Add edges in **both directions** (undirected GraphML input).
    pub fn add_road(&mut self, a: NodeIdx, b: NodeIdx, length_m: f64) {
        self.add_directed_edge(a, b, length_m);
        self.add_directed_edge(b, a, length_m);
    }

    pub fn node_count(&self) -> usize { self.ext_ids.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`StreetNetwork`] weighted at
    /// [`DEFAULT_SPEED_MPS`].  Call [`StreetNetwork::assign_weights`] to use
    /// another speed.
    pub fn build(self) -> StreetNetwork {
        let node_count = self.ext_ids.len();
        let edge_count = self.raw_edges.len();

        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:     Vec<NodeIdx> = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeIdx> = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f64>     = raw.iter().map(|e| e.length_m).collect();
        let edge_weight_s: Vec<f64>     =
            edge_length_m.iter().map(|len| len / DEFAULT_SPEED_MPS).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        StreetNetwork {
            node_ext_id: self.ext_ids,
            node_pos:    self.positions,
            node_osmid:  self.osmids,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_weight_s,
            ext_index: self.ext_index,
        }
    }
}

impl Default for StreetNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
