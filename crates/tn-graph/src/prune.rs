//! Reachability pruning and post-pruning consistency checks.
//!
//! A node is dropped when more than `threshold` of its row (destinations it
//! cannot reach) or of its column (sources that cannot reach it) is `+inf`.
//! Typical culprits are dangling one-way stubs at the edge of the extract and
//! tiny islands separated from the main component.
//!
//! Survivors are renumbered `0..N'` in ascending original-index order, and the
//! matrix loses the corresponding rows and columns in the same step, so the
//! node table and the matrix can never disagree about what an index means.

use log::{debug, info};

use tn_core::{NodeIdx, StageRng, VerifyMode};

use crate::matrix::DistanceMatrix;
use crate::network::StreetNetwork;
use crate::nodes::{NodeRecord, NodeTable};
use crate::router::Router;
use crate::{GraphError, GraphResult};

/// Relative tolerance when comparing recomputed travel times to the matrix.
const VERIFY_TOLERANCE: f64 = 1e-9;

/// Output of [`prune`].
#[derive(Debug, Clone)]
pub struct PrunedGraph {
    /// N'×N' matrix over the surviving nodes.
    pub matrix:   DistanceMatrix,
    /// Re-indexed node table: `nodes.get(NodeIdx(i))` describes matrix row `i`.
    pub nodes:    NodeTable,
    /// Pre-pruning index of every survivor; `original[i]` for new index `i`.
    pub original: Vec<NodeIdx>,
    /// Pre-pruning indices of the removed nodes, ascending.
    pub removed:  Vec<NodeIdx>,
}

/// Flag every node whose unreachable row or column fraction exceeds
/// `threshold`.  Indexed by `NodeIdx`.
pub fn invalid_nodes(matrix: &DistanceMatrix, threshold: f64) -> Vec<bool> {
    let n = matrix.dim();
    (0..n)
        .map(|i| {
            let out_frac = matrix.unreachable_in_row(i) as f64 / n as f64;
            let in_frac  = matrix.unreachable_in_col(i) as f64 / n as f64;
            out_frac > threshold || in_frac > threshold
        })
        .collect()
}

/// Remove poorly connected nodes from both the matrix and the node table.
///
/// # Errors
///
/// [`GraphError::DimensionMismatch`] if `nodes` does not describe the matrix.
pub fn prune(
    matrix:    &DistanceMatrix,
    nodes:     &NodeTable,
    threshold: f64,
) -> GraphResult<PrunedGraph> {
    if nodes.len() != matrix.dim() {
        return Err(GraphError::DimensionMismatch { matrix: matrix.dim(), nodes: nodes.len() });
    }

    let invalid = invalid_nodes(matrix, threshold);

    let mut keep     = Vec::new();
    let mut original = Vec::new();
    let mut removed  = Vec::new();
    let mut records  = Vec::new();

    for (record, &is_invalid) in nodes.iter().zip(&invalid) {
        if is_invalid {
            debug!("pruning node {} ({})", record.node_id, record.idx);
            removed.push(record.idx);
            continue;
        }
        let new_idx = NodeIdx(records.len() as u32);
        keep.push(record.idx.index());
        original.push(record.idx);
        records.push(NodeRecord { idx: new_idx, is_invalid: false, ..record.clone() });
    }

    info!(
        "pruning: kept {} of {} nodes ({} removed, threshold {:.0}%)",
        records.len(),
        nodes.len(),
        removed.len(),
        threshold * 100.0,
    );

    Ok(PrunedGraph {
        matrix: matrix.select(&keep),
        nodes: NodeTable::from_ordered(records),
        original,
        removed,
    })
}

/// Recompute travel times directly on `network` (looking nodes up by their
/// external id) and compare them against the pruned matrix.
///
/// Returns the number of pairs checked.
///
/// # Errors
///
/// - [`GraphError::MatrixMismatch`] on the first disagreeing pair: the
///   matrix rows or columns are attached to the wrong nodes.
/// - [`GraphError::NodeNotFound`] if a retained node is absent from `network`.
pub fn verify_pruned<R: Router>(
    network: &StreetNetwork,
    pruned:  &PrunedGraph,
    router:  &R,
    mode:    VerifyMode,
    rng:     &mut StageRng,
) -> GraphResult<usize> {
    let n = pruned.nodes.len();
    if n == 0 {
        return Ok(0);
    }

    // Resolve through external ids rather than `pruned.original` so that an
    // error in the bookkeeping cannot hide itself.
    let resolved: Vec<NodeIdx> = pruned
        .nodes
        .iter()
        .map(|r| {
            network
                .lookup(&r.node_id)
                .ok_or_else(|| GraphError::NodeNotFound(r.node_id.clone()))
        })
        .collect::<GraphResult<_>>()?;

    let mut checked = 0usize;
    match mode {
        VerifyMode::Exhaustive => {
            let mut row = vec![f64::INFINITY; network.node_count()];
            for i in 0..n {
                row.fill(f64::INFINITY);
                router.one_to_all(network, resolved[i], &mut row);
                for j in 0..n {
                    check_pair(pruned, i, j, row[resolved[j].index()])?;
                    checked += 1;
                }
            }
        }
        VerifyMode::Sample { pairs } => {
            for _ in 0..pairs {
                let i = rng.gen_range(0..n);
                let j = rng.gen_range(0..n);
                let graph = router
                    .one_to_one(network, resolved[i], resolved[j])
                    .unwrap_or(f64::INFINITY);
                check_pair(pruned, i, j, graph)?;
                checked += 1;
            }
        }
    }

    info!("verified {checked} node pairs against the street graph");
    Ok(checked)
}

fn check_pair(pruned: &PrunedGraph, i: usize, j: usize, graph: f64) -> GraphResult<()> {
    let matrix = pruned.matrix.get(NodeIdx(i as u32), NodeIdx(j as u32));
    if times_agree(graph, matrix) {
        return Ok(());
    }
    let name = |k: usize| pruned.nodes.records()[k].node_id.clone();
    Err(GraphError::MatrixMismatch { from: name(i), to: name(j), graph, matrix })
}

fn times_agree(a: f64, b: f64) -> bool {
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() <= VERIFY_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}
