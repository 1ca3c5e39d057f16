//! Routing trait, default Dijkstra implementation, and the all-pairs driver.
//!
//! # Pluggability
//!
//! [`all_pairs`] and [`verify_pruned`](crate::verify_pruned) call routing via
//! the [`Router`] trait, so a contraction hierarchy or a bidirectional search
//! can replace the default [`DijkstraRouter`] without touching the pipeline.
//!
//! # Cost units
//!
//! Costs are `edge_weight_s` values: seconds as `f64`.  Weights derive from
//! physical lengths and are never negative, so Dijkstra is exact.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tn_core::NodeIdx;

use crate::matrix::DistanceMatrix;
use crate::network::StreetNetwork;

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-travel-time engine.
///
/// Implementations must be `Send + Sync` so one instance can be shared by all
/// Rayon workers while matrix rows are computed in parallel.
pub trait Router: Send + Sync {
    /// Write the travel time from `source` to every reachable node into
    /// `row` (indexed by `NodeIdx`).  `row` arrives filled with
    /// `f64::INFINITY`; cells of unreachable nodes must be left untouched.
    fn one_to_all(&self, network: &StreetNetwork, source: NodeIdx, row: &mut [f64]);

    /// Travel time from `from` to `to`, or `None` if no path exists.
    fn one_to_one(&self, network: &StreetNetwork, from: NodeIdx, to: NodeIdx) -> Option<f64>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Binary-heap Dijkstra over the CSR street graph.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn one_to_all(&self, network: &StreetNetwork, source: NodeIdx, row: &mut [f64]) {
        debug_assert_eq!(row.len(), network.node_count());
        dijkstra(network, source, None, row);
    }

    fn one_to_one(&self, network: &StreetNetwork, from: NodeIdx, to: NodeIdx) -> Option<f64> {
        let mut dist = vec![f64::INFINITY; network.node_count()];
        dijkstra(network, from, Some(to), &mut dist)
    }
}

// ── All-pairs driver ──────────────────────────────────────────────────────────

/// Run `router.one_to_all` from every node and collect an N×N matrix.
///
/// Each source writes only its own row, so with the `parallel` feature the
/// rows are filled on Rayon's pool without any locking.
pub fn all_pairs<R: Router>(network: &StreetNetwork, router: &R) -> DistanceMatrix {
    let n = network.node_count();
    let mut matrix = DistanceMatrix::unreachable(n);
    if n == 0 {
        return matrix;
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (src, row) in matrix.as_mut_slice().chunks_mut(n).enumerate() {
            router.one_to_all(network, NodeIdx(src as u32), row);
        }
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        matrix
            .as_mut_slice()
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(src, row)| router.one_to_all(network, NodeIdx(src as u32), row));
    }

    matrix
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq)]
struct HeapEntry {
    cost: f64,
    node: NodeIdx,
}

impl Eq for HeapEntry {}

// Min-heap by cost (reversed from the standard max-heap); node index breaks
// ties so pop order is deterministic.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Label-setting search from `from`, relaxing into `dist`.
///
/// With `target = Some(t)` the search stops as soon as `t` is settled and
/// returns its cost; otherwise it settles every reachable node and returns
/// `None`.
fn dijkstra(
    network: &StreetNetwork,
    from:    NodeIdx,
    target:  Option<NodeIdx>,
    dist:    &mut [f64],
) -> Option<f64> {
    dist[from.index()] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry { cost: 0.0, node: from });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if target == Some(node) {
            return Some(cost);
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for e in network.out_edges(node) {
            let neighbor = network.edge_to[e];
            let next = cost + network.edge_weight_s[e];
            if next < dist[neighbor.index()] {
                dist[neighbor.index()] = next;
                heap.push(HeapEntry { cost: next, node: neighbor });
            }
        }
    }

    None
}
