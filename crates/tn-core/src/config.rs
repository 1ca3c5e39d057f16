//! Pipeline configuration.
//!
//! Loaded from a JSON file by the `tn-prepare` binary; every field has a
//! default, so `{}` is a valid configuration that reproduces the original
//! Manhattan dataset layout.
//!
//! ```json
//! {
//!   "graph_path": "data/manhatten.graphml",
//!   "zones_crs": "EPSG:2263",
//!   "verify": "exhaustive",
//!   "output_format": "csv"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{TnError, TnResult};

/// Assumed free-flow car speed in metres per second.
pub const DEFAULT_SPEED_MPS: f64 = 9.0;

/// A node is pruned when more than this fraction of its row or column in the
/// distance matrix is unreachable.
pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.9;

/// Number of node pairs spot-checked after pruning in production runs.
pub const DEFAULT_VERIFY_PAIRS: usize = 64;

// ── VerifyMode ────────────────────────────────────────────────────────────────

/// How thoroughly the pruned matrix is checked against the original graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Re-run a full shortest-path search from every retained node.
    Exhaustive,
    /// Check `pairs` seeded random (source, destination) pairs.
    Sample { pairs: usize },
}

impl Default for VerifyMode {
    fn default() -> Self {
        VerifyMode::Sample { pairs: DEFAULT_VERIFY_PAIRS }
    }
}

// ── OutputFormat ──────────────────────────────────────────────────────────────

/// Columnar format used for the node and trip tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    #[default]
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

// ── PipelineConfig ────────────────────────────────────────────────────────────

/// Top-level pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// GraphML street network.
    pub graph_path: PathBuf,
    /// Trip records (`.parquet` or `.csv`).
    pub trips_path: PathBuf,
    /// Zone polygons as a GeoJSON FeatureCollection.
    pub zones_path: PathBuf,

    /// Directory receiving the three output files.  Created if missing.
    pub output_dir: PathBuf,
    /// File name prefix: `{prefix}-distances.npy`, `{prefix}-nodes.*`, …
    pub output_prefix: String,
    pub output_format: OutputFormat,

    pub speed_mps: f64,
    pub prune_threshold: f64,

    /// Master RNG seed.  The same seed always produces identical samples.
    pub seed: u64,
    pub verify: VerifyMode,

    /// CRS of node `x`/`y` attributes, e.g. `"EPSG:4326"`.  `None` = WGS-84.
    pub graph_crs: Option<String>,
    /// Overrides the CRS declared inside the zone file.
    pub zones_crs: Option<String>,

    /// Log nodes outside every zone, zones without nodes and dropped trips.
    pub report_unmapped: bool,

    /// Keep only the first N trips (useful for quick runs).
    pub trip_limit: Option<usize>,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            graph_path: PathBuf::from("data/manhatten.graphml"),
            trips_path: PathBuf::from("data/yellow_tripdata_2024-09.parquet"),
            zones_path: PathBuf::from("data/taxi_zones.geojson"),
            output_dir: PathBuf::from("raw"),
            output_prefix: String::from("manhattan"),
            output_format: OutputFormat::Parquet,
            speed_mps: DEFAULT_SPEED_MPS,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            seed: 0,
            verify: VerifyMode::default(),
            graph_crs: None,
            zones_crs: None,
            report_unmapped: true,
            trip_limit: None,
            num_threads: None,
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON configuration file.
    pub fn from_json_path(path: &Path) -> TnResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> TnResult<Self> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TnResult<()> {
        if !(self.speed_mps.is_finite() && self.speed_mps > 0.0) {
            return Err(TnError::Config(format!(
                "speed_mps must be positive and finite, got {}",
                self.speed_mps
            )));
        }
        if !(0.0..=1.0).contains(&self.prune_threshold) {
            return Err(TnError::Config(format!(
                "prune_threshold must lie in [0, 1], got {}",
                self.prune_threshold
            )));
        }
        if let VerifyMode::Sample { pairs: 0 } = self.verify {
            return Err(TnError::Config("verify.sample.pairs must be at least 1".into()));
        }
        if self.output_prefix.is_empty() {
            return Err(TnError::Config("output_prefix must not be empty".into()));
        }
        Ok(())
    }

    pub fn distances_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}-distances.npy", self.output_prefix))
    }

    pub fn nodes_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}-nodes.{}",
            self.output_prefix,
            self.output_format.extension()
        ))
    }

    pub fn trips_out_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}-trips.{}",
            self.output_prefix,
            self.output_format.extension()
        ))
    }
}
