//! Trip file loading.
//!
//! [`load_trips`] picks a reader from the file extension:
//!
//! | Extension            | Reader                                  |
//! |----------------------|-----------------------------------------|
//! | `.csv`               | [`read_trips_csv`]                      |
//! | `.parquet`, `.pq`    | `read_trips_parquet` (feature `parquet`)|
//!
//! `limit` keeps only the first K rows.  Row numbers (and therefore the
//! per-row sampling seeds) are positions in the file, so a truncated load
//! samples the surviving rows exactly like a full one.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use log::info;
use serde::Deserialize;

use tn_core::ZoneId;
use tn_core::time::parse_datetime;

use crate::record::{DROPOFF_DATETIME, INPUT_COLUMNS, PICKUP_DATETIME, TripRecord};
use crate::{TripError, TripResult};

/// Load trips from `path`, choosing the reader by extension.
///
/// # Errors
///
/// [`TripError::UnsupportedFormat`] for an unknown extension (or `.parquet`
/// without the `parquet` feature), plus whatever the chosen reader returns.
pub fn load_trips(path: &Path, limit: Option<usize>) -> TripResult<Vec<TripRecord>> {
    let started = Instant::now();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let trips = match ext.as_str() {
        "csv" => read_trips_csv(path, limit)?,
        #[cfg(feature = "parquet")]
        "parquet" | "pq" => crate::parquet::read_trips_parquet(path, limit)?,
        _ => return Err(TripError::UnsupportedFormat(path.display().to_string())),
    };

    info!("loaded {}: {} trips in {:.2?}", path.display(), trips.len(), started.elapsed());
    Ok(trips)
}

// ── CSV ───────────────────────────────────────────────────────────────────────

pub fn read_trips_csv(path: &Path, limit: Option<usize>) -> TripResult<Vec<TripRecord>> {
    read_trips_csv_reader(File::open(path)?, limit)
}

/// Like [`read_trips_csv`] but accepts any `Read` source.  The first line
/// must be a header; extra columns are ignored.
pub fn read_trips_csv_reader<R: Read>(reader: R, limit: Option<usize>) -> TripResult<Vec<TripRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if let Some(missing) = INPUT_COLUMNS.iter().find(|&&col| !headers.iter().any(|h| h == col)) {
        return Err(TripError::MissingColumn(*missing));
    }

    let mut trips = Vec::new();
    for (row, result) in rdr
        .deserialize::<CsvTrip>()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
    {
        trips.push(result?.into_record(row)?);
    }
    Ok(trips)
}

#[derive(Deserialize)]
struct CsvTrip {
    tpep_pickup_datetime:  String,
    tpep_dropoff_datetime: String,
    #[serde(rename = "PULocationID")]
    pu_location_id:        Option<f64>,
    #[serde(rename = "DOLocationID")]
    do_location_id:        Option<f64>,
    passenger_count:       Option<f64>,
    trip_distance:         Option<f64>,
    fare_amount:           Option<f64>,
}

impl CsvTrip {
    fn into_record(self, row: usize) -> TripResult<TripRecord> {
        let timestamp = |column: &'static str, text: String| {
            parse_datetime(&text).ok_or(TripError::InvalidTimestamp { row, column, value: text })
        };
        Ok(TripRecord {
            pickup_datetime:  timestamp(PICKUP_DATETIME, self.tpep_pickup_datetime)?,
            dropoff_datetime: timestamp(DROPOFF_DATETIME, self.tpep_dropoff_datetime)?,
            pickup_zone:      self.pu_location_id.and_then(zone_from_f64),
            dropoff_zone:     self.do_location_id.and_then(zone_from_f64),
            passenger_count:  self.passenger_count,
            trip_distance:    self.trip_distance.unwrap_or(f64::NAN),
            fare_amount:      self.fare_amount.unwrap_or(f64::NAN),
        })
    }
}

/// Zone ids written by float-typed exporters come through as `132.0`.
fn zone_from_f64(v: f64) -> Option<ZoneId> {
    if v.fract() != 0.0 || !v.is_finite() {
        return None;
    }
    ZoneId::from_raw(v as i64)
}
