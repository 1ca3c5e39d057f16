//! Parquet trip reader (feature `parquet`).
//!
//! TLC files have drifted over the years: timestamps in µs or ns, zone ids
//! as `int32` or `int64`, `passenger_count` as `int64` or `double`.  Every
//! column is cast to one canonical Arrow type before it is read, so all of
//! those variants load the same way:
//!
//! | Column                  | Read as                       |
//! |-------------------------|-------------------------------|
//! | `tpep_*_datetime`       | `Timestamp(Microsecond, None)`|
//! | `PULocationID` / `DO…`  | `Int64`                       |
//! | numeric trip fields     | `Float64`                     |
//!
//! Only the seven input columns are decoded; the rest of the file is skipped
//! through a projection mask.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray, PrimitiveArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use tn_core::ZoneId;
use tn_core::time::from_epoch_micros;

use crate::record::{
    DROPOFF_DATETIME, DROPOFF_ZONE, FARE_AMOUNT, INPUT_COLUMNS, PASSENGER_COUNT, PICKUP_DATETIME,
    PICKUP_ZONE, TRIP_DISTANCE, TripRecord,
};
use crate::{TripError, TripResult};

const BATCH_ROWS: usize = 64 * 1024;

/// Read trips from a Parquet file.  See the module docs for accepted types.
pub fn read_trips_parquet(path: &Path, limit: Option<usize>) -> TripResult<Vec<TripRecord>> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;

    let schema = builder.schema().clone();
    let mut roots = Vec::with_capacity(INPUT_COLUMNS.len());
    for col in INPUT_COLUMNS {
        roots.push(schema.index_of(col).map_err(|_| TripError::MissingColumn(col))?);
    }
    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);

    let reader = builder.with_projection(mask).with_batch_size(BATCH_ROWS).build()?;

    let limit = limit.unwrap_or(usize::MAX);
    let mut trips = Vec::new();
    for batch in reader {
        if trips.len() >= limit {
            break;
        }
        append_batch(&batch?, &mut trips, limit)?;
    }
    Ok(trips)
}

fn append_batch(batch: &RecordBatch, trips: &mut Vec<TripRecord>, limit: usize) -> TripResult<()> {
    let column = |name: &'static str, ty: &DataType| -> TripResult<ArrayRef> {
        let raw = batch.column_by_name(name).ok_or(TripError::MissingColumn(name))?;
        Ok(cast(raw, ty)?)
    };

    let micros = DataType::Timestamp(TimeUnit::Microsecond, None);
    let pickup_dt = column(PICKUP_DATETIME, &micros)?;
    let dropoff_dt = column(DROPOFF_DATETIME, &micros)?;
    let pickup_zone = column(PICKUP_ZONE, &DataType::Int64)?;
    let dropoff_zone = column(DROPOFF_ZONE, &DataType::Int64)?;
    let passengers = column(PASSENGER_COUNT, &DataType::Float64)?;
    let distance = column(TRIP_DISTANCE, &DataType::Float64)?;
    let fare = column(FARE_AMOUNT, &DataType::Float64)?;

    let pickup_dt = pickup_dt.as_primitive::<TimestampMicrosecondType>();
    let dropoff_dt = dropoff_dt.as_primitive::<TimestampMicrosecondType>();
    let pickup_zone = pickup_zone.as_primitive::<Int64Type>();
    let dropoff_zone = dropoff_zone.as_primitive::<Int64Type>();
    let passengers = passengers.as_primitive::<Float64Type>();
    let distance = distance.as_primitive::<Float64Type>();
    let fare = fare.as_primitive::<Float64Type>();

    let first_row = trips.len();
    let rows = batch.num_rows().min(limit - first_row);
    trips.reserve(rows);

    for i in 0..rows {
        let row = first_row + i;
        trips.push(TripRecord {
            pickup_datetime:  timestamp(pickup_dt, i, row, PICKUP_DATETIME)?,
            dropoff_datetime: timestamp(dropoff_dt, i, row, DROPOFF_DATETIME)?,
            pickup_zone:      value(pickup_zone, i).and_then(ZoneId::from_raw),
            dropoff_zone:     value(dropoff_zone, i).and_then(ZoneId::from_raw),
            passenger_count:  value(passengers, i),
            trip_distance:    value(distance, i).unwrap_or(f64::NAN),
            fare_amount:      value(fare, i).unwrap_or(f64::NAN),
        });
    }
    Ok(())
}

#[inline]
fn value<T: arrow::datatypes::ArrowPrimitiveType>(array: &PrimitiveArray<T>, i: usize) -> Option<T::Native> {
    array.is_valid(i).then(|| array.value(i))
}

fn timestamp(
    array:  &PrimitiveArray<TimestampMicrosecondType>,
    i:      usize,
    row:    usize,
    column: &'static str,
) -> TripResult<NaiveDateTime> {
    let micros = value(array, i).ok_or_else(|| TripError::InvalidTimestamp {
        row,
        column,
        value: "null".to_owned(),
    })?;
    from_epoch_micros(micros).ok_or_else(|| TripError::InvalidTimestamp {
        row,
        column,
        value: micros.to_string(),
    })
}
