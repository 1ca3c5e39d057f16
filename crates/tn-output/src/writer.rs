//! The `TableWriter` trait implemented by both table backends.

use std::path::Path;

use tn_core::OutputFormat;
use tn_graph::NodeTable;
use tn_trips::MappedTrip;

use crate::OutputResult;
use crate::csv::CsvWriter;

/// Trait implemented by the CSV and Parquet writers.
///
/// Both output files are created (and truncated) when the writer is built.
pub trait TableWriter {
    /// Write the node table, one row per record.
    fn write_nodes(&mut self, nodes: &NodeTable) -> OutputResult<()>;

    /// Write a batch of mapped trips.  May be called more than once.
    fn write_trips(&mut self, trips: &[MappedTrip]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Build the writer for `format`, creating parent directories as needed.
pub fn create_writer(
    format:     OutputFormat,
    nodes_path: &Path,
    trips_path: &Path,
) -> OutputResult<Box<dyn TableWriter>> {
    for path in [nodes_path, trips_path] {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
    }
    match format {
        OutputFormat::Csv => Ok(Box::new(CsvWriter::create(nodes_path, trips_path)?)),
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => Ok(Box::new(crate::parquet::ParquetWriter::create(nodes_path, trips_path)?)),
        #[cfg(not(feature = "parquet"))]
        OutputFormat::Parquet => Err(crate::OutputError::FormatUnavailable("parquet")),
    }
}
