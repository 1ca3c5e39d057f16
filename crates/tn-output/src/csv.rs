//! CSV output backend.
//!
//! Floats are written with Rust's shortest round-trip formatting, so reading
//! a file back yields bit-identical values; `+inf` is written as `inf`.
//! Timestamps are `YYYY-MM-DD HH:MM:SS` with a fractional part only when one
//! is present.

use std::fs::File;
use std::path::Path;

use csv::Writer;
use log::info;
use serde::Deserialize;

use tn_core::{GeoPoint, NodeIdx};
use tn_graph::{NodeRecord, NodeTable};
use tn_trips::MappedTrip;
use tn_trips::record::OUTPUT_COLUMNS;

use crate::OutputResult;
use crate::writer::TableWriter;

pub(crate) const NODE_COLUMNS: [&str; 6] = ["node_id", "idx", "lng", "lat", "osmid", "is_invalid"];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Writes the node and trip tables to two CSV files.
pub struct CsvWriter {
    nodes:    Writer<File>,
    trips:    Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create (or truncate) both files and write their header rows.
    pub fn create(nodes_path: &Path, trips_path: &Path) -> OutputResult<Self> {
        let mut nodes = Writer::from_path(nodes_path)?;
        nodes.write_record(NODE_COLUMNS)?;

        let mut trips = Writer::from_path(trips_path)?;
        trips.write_record(OUTPUT_COLUMNS)?;

        Ok(Self { nodes, trips, finished: false })
    }
}

impl TableWriter for CsvWriter {
    fn write_nodes(&mut self, table: &NodeTable) -> OutputResult<()> {
        for r in table {
            self.nodes.write_record(&[
                r.node_id.clone(),
                r.idx.0.to_string(),
                r.pos.lon.to_string(),
                r.pos.lat.to_string(),
                r.osmid.to_string(),
                r.is_invalid.to_string(),
            ])?;
        }
        info!("wrote {} node rows (csv)", table.len());
        Ok(())
    }

    fn write_trips(&mut self, trips: &[MappedTrip]) -> OutputResult<()> {
        for t in trips {
            self.trips.write_record(&[
                t.t.to_string(),
                t.pickup_datetime.format(DATETIME_FORMAT).to_string(),
                t.dropoff_datetime.format(DATETIME_FORMAT).to_string(),
                t.passenger_count.map(|p| p.to_string()).unwrap_or_default(),
                t.trip_distance.to_string(),
                t.pickup_osmid.to_string(),
                t.dropoff_osmid.to_string(),
                t.pickup_idx.0.to_string(),
                t.dropoff_idx.0.to_string(),
                t.fare_amount.to_string(),
            ])?;
        }
        info!("wrote {} trip rows (csv)", trips.len());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.nodes.flush()?;
        self.trips.flush()?;
        Ok(())
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRow {
    node_id:    String,
    idx:        u32,
    lng:        f64,
    lat:        f64,
    osmid:      i64,
    is_invalid: bool,
}

/// Load a node table written by [`CsvWriter`].
///
/// # Errors
///
/// [`OutputError::NodeTable`](crate::OutputError::NodeTable) if the `idx`
/// column does not enumerate `0..N` in order.
pub fn read_nodes_csv(path: &Path) -> OutputResult<NodeTable> {
    let mut rdr = csv::Reader::from_path(path)?;
    let records = rdr
        .deserialize::<NodeRow>()
        .map(|row| -> OutputResult<NodeRecord> {
            let row = row?;
            Ok(NodeRecord {
                node_id:    row.node_id,
                idx:        NodeIdx(row.idx),
                pos:        GeoPoint::new(row.lng, row.lat),
                osmid:      row.osmid,
                is_invalid: row.is_invalid,
            })
        })
        .collect::<OutputResult<Vec<_>>>()?;
    Ok(NodeTable::from_records(records)?)
}
