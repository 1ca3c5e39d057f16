//! Parquet output backend (feature `parquet`).
//!
//! Node table schema:
//!
//! | Column       | Arrow type |
//! |--------------|------------|
//! | `node_id`    | `Utf8`     |
//! | `idx`        | `UInt32`   |
//! | `lng`, `lat` | `Float64`  |
//! | `osmid`      | `Int64`    |
//! | `is_invalid` | `Boolean`  |
//!
//! Trip table timestamps are `Timestamp(Microsecond, None)`, matching what
//! pandas writes for the TLC datetimes; `passenger_count` is the only
//! nullable column.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder, UInt32Builder,
};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema, TimeUnit, UInt32Type};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use tn_core::time::epoch_micros;
use tn_core::{GeoPoint, NodeIdx};
use tn_graph::{NodeRecord, NodeTable};
use tn_trips::MappedTrip;

use crate::writer::TableWriter;
use crate::{OutputError, OutputResult};

fn node_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("node_id",    DataType::Utf8,    false),
        Field::new("idx",        DataType::UInt32,  false),
        Field::new("lng",        DataType::Float64, false),
        Field::new("lat",        DataType::Float64, false),
        Field::new("osmid",      DataType::Int64,   false),
        Field::new("is_invalid", DataType::Boolean, false),
    ]))
}

fn trip_schema() -> Arc<Schema> {
    let micros = DataType::Timestamp(TimeUnit::Microsecond, None);
    Arc::new(Schema::new(vec![
        Field::new("t",                     DataType::Int64,   false),
        Field::new("tpep_pickup_datetime",  micros.clone(),    false),
        Field::new("tpep_dropoff_datetime", micros,            false),
        Field::new("passenger_count",       DataType::Float64, true),
        Field::new("trip_distance",         DataType::Float64, false),
        Field::new("pickup_osmid",          DataType::Int64,   false),
        Field::new("dropoff_osmid",         DataType::Int64,   false),
        Field::new("pickup_idx",            DataType::UInt32,  false),
        Field::new("dropoff_idx",           DataType::UInt32,  false),
        Field::new("fare_amount",           DataType::Float64, false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Writes the node and trip tables to two Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footer; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    nodes:        Option<ArrowWriter<File>>,
    trips:        Option<ArrowWriter<File>>,
    nodes_schema: Arc<Schema>,
    trips_schema: Arc<Schema>,
}

impl ParquetWriter {
    /// Create (or truncate) both Parquet files.
    pub fn create(nodes_path: &Path, trips_path: &Path) -> OutputResult<Self> {
        let nodes_schema = node_schema();
        let trips_schema = trip_schema();

        let nodes = ArrowWriter::try_new(
            File::create(nodes_path)?,
            Arc::clone(&nodes_schema),
            Some(snappy_props()),
        )?;
        let trips = ArrowWriter::try_new(
            File::create(trips_path)?,
            Arc::clone(&trips_schema),
            Some(snappy_props()),
        )?;

        Ok(Self {
            nodes: Some(nodes),
            trips: Some(trips),
            nodes_schema,
            trips_schema,
        })
    }
}

impl TableWriter for ParquetWriter {
    fn write_nodes(&mut self, table: &NodeTable) -> OutputResult<()> {
        let Some(writer) = self.nodes.as_mut() else {
            return Ok(());
        };
        if table.is_empty() {
            return Ok(());
        }

        let mut node_ids = StringBuilder::new();
        let mut idxs     = UInt32Builder::new();
        let mut lngs     = Float64Builder::new();
        let mut lats     = Float64Builder::new();
        let mut osmids   = Int64Builder::new();
        let mut invalids = BooleanBuilder::new();

        for r in table {
            node_ids.append_value(&r.node_id);
            idxs.append_value(r.idx.0);
            lngs.append_value(r.pos.lon);
            lats.append_value(r.pos.lat);
            osmids.append_value(r.osmid);
            invalids.append_value(r.is_invalid);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.nodes_schema),
            vec![
                Arc::new(node_ids.finish()),
                Arc::new(idxs.finish()),
                Arc::new(lngs.finish()),
                Arc::new(lats.finish()),
                Arc::new(osmids.finish()),
                Arc::new(invalids.finish()),
            ],
        )?;
        writer.write(&batch)?;
        info!("wrote {} node rows (parquet)", table.len());
        Ok(())
    }

    fn write_trips(&mut self, trips: &[MappedTrip]) -> OutputResult<()> {
        if trips.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.trips.as_mut() else {
            return Ok(());
        };

        let mut ts         = Int64Builder::new();
        let mut pickups    = TimestampMicrosecondBuilder::new();
        let mut dropoffs   = TimestampMicrosecondBuilder::new();
        let mut passengers = Float64Builder::new();
        let mut distances  = Float64Builder::new();
        let mut pu_osmids  = Int64Builder::new();
        let mut do_osmids  = Int64Builder::new();
        let mut pu_idxs    = UInt32Builder::new();
        let mut do_idxs    = UInt32Builder::new();
        let mut fares      = Float64Builder::new();

        for t in trips {
            ts.append_value(t.t);
            pickups.append_value(epoch_micros(t.pickup_datetime));
            dropoffs.append_value(epoch_micros(t.dropoff_datetime));
            passengers.append_option(t.passenger_count);
            distances.append_value(t.trip_distance);
            pu_osmids.append_value(t.pickup_osmid);
            do_osmids.append_value(t.dropoff_osmid);
            pu_idxs.append_value(t.pickup_idx.0);
            do_idxs.append_value(t.dropoff_idx.0);
            fares.append_value(t.fare_amount);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.trips_schema),
            vec![
                Arc::new(ts.finish()),
                Arc::new(pickups.finish()),
                Arc::new(dropoffs.finish()),
                Arc::new(passengers.finish()),
                Arc::new(distances.finish()),
                Arc::new(pu_osmids.finish()),
                Arc::new(do_osmids.finish()),
                Arc::new(pu_idxs.finish()),
                Arc::new(do_idxs.finish()),
                Arc::new(fares.finish()),
            ],
        )?;
        writer.write(&batch)?;
        info!("wrote {} trip rows (parquet)", trips.len());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if let Some(w) = self.nodes.take() {
            w.close()?;
        }
        if let Some(w) = self.trips.take() {
            w.close()?;
        }
        Ok(())
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Load a node table written by [`ParquetWriter`].
pub fn read_nodes_parquet(path: &Path) -> OutputResult<NodeTable> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        let column = |name: &'static str, ty: DataType| {
            batch
                .column_by_name(name)
                .filter(|c| c.data_type() == &ty)
                .ok_or(OutputError::MissingColumn(name))
        };

        let node_ids = column("node_id", DataType::Utf8)?.as_string::<i32>();
        let idxs     = column("idx", DataType::UInt32)?.as_primitive::<UInt32Type>();
        let lngs     = column("lng", DataType::Float64)?.as_primitive::<Float64Type>();
        let lats     = column("lat", DataType::Float64)?.as_primitive::<Float64Type>();
        let osmids   = column("osmid", DataType::Int64)?.as_primitive::<Int64Type>();
        let invalids = column("is_invalid", DataType::Boolean)?.as_boolean();

        for i in 0..batch.num_rows() {
            records.push(NodeRecord {
                node_id:    node_ids.value(i).to_owned(),
                idx:        NodeIdx(idxs.value(i)),
                pos:        GeoPoint::new(lngs.value(i), lats.value(i)),
                osmid:      osmids.value(i),
                is_invalid: invalids.value(i),
            });
        }
    }
    Ok(NodeTable::from_records(records)?)
}
