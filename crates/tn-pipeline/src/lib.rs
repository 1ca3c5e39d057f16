//! `tn-pipeline`: the preprocessing run as an explicit sequence of stages.
//!
//! ```text
//! load_graph ─► compute_matrix ─► prune_and_verify ─► join_zones ─► map_trips ─► save
//! ```
//!
//! Every stage takes the previous stage's output by reference and returns a
//! new value, so each one can be driven on its own from tests.  [`run`] chains
//! them for the `tn-prepare` binary.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use log::info;

use tn_core::{PipelineConfig, StageRng};
use tn_graph::{
    DijkstraRouter, DistanceMatrix, PrunedGraph, StreetNetwork, all_pairs, load_graphml,
    verify_pruned,
};
use tn_trips::{MapReport, MappedTrip, load_trips};
use tn_zones::{Crs, JoinReport, NodeZoneTable, ZoneIndex, load_zones_geojson, reproject_points};


// ── Stages ────────────────────────────────────────────────────────────────────

/// Load the GraphML network, bring node positions to WGS-84 and convert edge
/// lengths to travel times at `speed_mps`.
pub fn load_graph(config: &PipelineConfig) -> Result<StreetNetwork> {
    let start = Instant::now();
    let mut network = load_graphml(&config.graph_path)
        .with_context(|| format!("loading graph {}", config.graph_path.display()))?;

    if let Some(name) = &config.graph_crs {
        let crs = Crs::from_name(name).context("graph_crs")?;
        reproject_points(&mut network.node_pos, crs);
    }
    if let Some(i) = network.node_pos.iter().position(|p| !p.is_finite()) {
        bail!("node {} has non-finite coordinates {}", network.node_ext_id[i], network.node_pos[i]);
    }

    network.assign_weights(config.speed_mps)?;
    info!(
        "graph: {} nodes, {} edges loaded in {:.2?}",
        network.node_count(),
        network.edge_count(),
        start.elapsed(),
    );
    Ok(network)
}

/// All-pairs shortest travel times over the full network.
pub fn compute_matrix(network: &StreetNetwork) -> DistanceMatrix {
    let start = Instant::now();
    let matrix = all_pairs(network, &DijkstraRouter);
    info!("all-pairs: {0}×{0} matrix in {1:.2?}", matrix.dim(), start.elapsed());
    matrix
}

/// Drop poorly connected nodes, then spot-check the pruned matrix against a
/// fresh search on the original network.
///
/// Returns the pruned graph and the number of pairs verified.
pub fn prune_and_verify(
    config:  &PipelineConfig,
    network: &StreetNetwork,
    matrix:  &DistanceMatrix,
) -> Result<(PrunedGraph, usize)> {
    let pruned = tn_graph::prune(matrix, &network.node_table(), config.prune_threshold)?;

    let start = Instant::now();
    let mut rng = StageRng::new(config.seed);
    let checked = verify_pruned(network, &pruned, &DijkstraRouter, config.verify, &mut rng)
        .context("pruned matrix disagrees with the street network")?;
    info!("verified {checked} node pairs in {:.2?}", start.elapsed());

    Ok((pruned, checked))
}

/// Assign every retained node to the zone polygon containing it.
pub fn join_zones(config: &PipelineConfig, pruned: &PrunedGraph) -> Result<(NodeZoneTable, JoinReport)> {
    let crs = config
        .zones_crs
        .as_deref()
        .map(Crs::from_name)
        .transpose()
        .context("zones_crs")?;
    let zones = load_zones_geojson(&config.zones_path, crs)
        .with_context(|| format!("loading zones {}", config.zones_path.display()))?;
    let index = ZoneIndex::new(zones);

    let (table, report) = tn_zones::assign_nodes(&index, pruned.nodes.iter().map(|r| (r.idx, r.pos)));
    if config.report_unmapped {
        report.log_warnings();
    }
    Ok((table, report))
}

/// Load the trip file and sample a pickup and dropoff node for every trip.
pub fn map_trips(
    config: &PipelineConfig,
    pruned: &PrunedGraph,
    zones:  &NodeZoneTable,
) -> Result<(Vec<MappedTrip>, MapReport)> {
    let start = Instant::now();
    let trips = load_trips(&config.trips_path, config.trip_limit)
        .with_context(|| format!("loading trips {}", config.trips_path.display()))?;

    let (mapped, report) = tn_trips::map_trips(&trips, zones, &pruned.nodes, config.seed)?;
    if config.report_unmapped {
        report.log_warnings();
    }
    info!("trips: {} mapped in {:.2?}", mapped.len(), start.elapsed());
    Ok((mapped, report))
}

/// Write the matrix, node table and trip table under `output_dir`.
pub fn save(config: &PipelineConfig, pruned: &PrunedGraph, trips: &[MappedTrip]) -> Result<OutputPaths> {
    let paths = OutputPaths {
        distances: config.distances_path(),
        nodes:     config.nodes_path(),
        trips:     config.trips_out_path(),
    };

    tn_output::write_matrix_npy(&paths.distances, &pruned.matrix)
        .with_context(|| format!("writing {}", paths.distances.display()))?;

    let mut writer = tn_output::create_writer(config.output_format, &paths.nodes, &paths.trips)
        .context("creating table writer")?;
    writer.write_nodes(&pruned.nodes).context("writing node table")?;
    writer.write_trips(trips).context("writing trip table")?;
    writer.finish().context("closing table files")?;

    Ok(paths)
}

// ── Whole run ─────────────────────────────────────────────────────────────────

/// Files produced by [`save`].
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub distances: PathBuf,
    pub nodes:     PathBuf,
    pub trips:     PathBuf,
}

/// Counts gathered along one [`run`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub nodes_loaded:   usize,
    pub edges_loaded:   usize,
    pub nodes_retained: usize,
    pub nodes_removed:  usize,
    pub pairs_verified: usize,
    pub join:           JoinReport,
    pub mapping:        MapReport,
    pub outputs:        OutputPaths,
}

/// Run every stage in order.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let start = Instant::now();

    let network = load_graph(config).context("graph stage")?;
    let matrix = compute_matrix(&network);
    let (pruned, pairs_verified) =
        prune_and_verify(config, &network, &matrix).context("pruning stage")?;
    drop(matrix);

    let (zones, join) = join_zones(config, &pruned).context("zone stage")?;
    let (trips, mapping) = map_trips(config, &pruned, &zones).context("trip stage")?;
    let outputs = save(config, &pruned, &trips).context("output stage")?;

    info!("pipeline finished in {:.2?}", start.elapsed());
    Ok(RunSummary {
        nodes_loaded:   network.node_count(),
        edges_loaded:   network.edge_count(),
        nodes_retained: pruned.nodes.len(),
        nodes_removed:  pruned.removed.len(),
        pairs_verified,
        join,
        mapping,
        outputs,
    })
}
