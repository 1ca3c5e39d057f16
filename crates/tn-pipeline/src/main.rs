//! tn-prepare: build the travel-time matrix, node table and trip table.
//!
//! ```text
//! tn-prepare [CONFIG.json]
//! ```
//!
//! Without an argument the built-in defaults are used (`data/` inputs,
//! `raw/manhattan-*` outputs).  Log verbosity follows `RUST_LOG`, default
//! `info`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use log::info;

use tn_core::PipelineConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1);
    let config = match args.next() {
        Some(path) => {
            let path = PathBuf::from(path);
            PipelineConfig::from_json_path(&path)
                .with_context(|| format!("reading config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    if args.next().is_some() {
        bail!("usage: tn-prepare [CONFIG.json]");
    }

    if let Some(threads) = config.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the rayon thread pool")?;
    }
    info!("using {} worker threads", rayon::current_num_threads());

    let summary = tn_pipeline::run(&config)?;

    info!(
        "nodes: {} loaded, {} retained, {} pruned; {} pairs verified",
        summary.nodes_loaded, summary.nodes_retained, summary.nodes_removed, summary.pairs_verified,
    );
    info!(
        "trips: {} read, {} written, {} dropped",
        summary.mapping.trips_in,
        summary.mapping.trips_mapped,
        summary.mapping.trips_dropped(),
    );
    info!("distances → {}", summary.outputs.distances.display());
    info!("nodes     → {}", summary.outputs.nodes.display());
    info!("trips     → {}", summary.outputs.trips.display());
    Ok(())
}
