//! Trip row types and column names.

use chrono::NaiveDateTime;

use tn_core::{NodeIdx, ZoneId};

// ── Input columns (TLC yellow-taxi schema) ────────────────────────────────────

pub const PICKUP_DATETIME: &str = "tpep_pickup_datetime";
pub const DROPOFF_DATETIME: &str = "tpep_dropoff_datetime";
pub const PICKUP_ZONE: &str = "PULocationID";
pub const DROPOFF_ZONE: &str = "DOLocationID";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const TRIP_DISTANCE: &str = "trip_distance";
pub const FARE_AMOUNT: &str = "fare_amount";

/// Columns every trip file must provide.
pub const INPUT_COLUMNS: [&str; 7] = [
    PICKUP_DATETIME,
    DROPOFF_DATETIME,
    PICKUP_ZONE,
    DROPOFF_ZONE,
    PASSENGER_COUNT,
    TRIP_DISTANCE,
    FARE_AMOUNT,
];

/// Output column whitelist, in write order.
pub const OUTPUT_COLUMNS: [&str; 10] = [
    "t",
    PICKUP_DATETIME,
    DROPOFF_DATETIME,
    PASSENGER_COUNT,
    TRIP_DISTANCE,
    "pickup_osmid",
    "dropoff_osmid",
    "pickup_idx",
    "dropoff_idx",
    FARE_AMOUNT,
];

/// One raw trip as read from the trip dataset.
///
/// A null or out-of-range zone id reads as `None`; such a trip can never be
/// mapped.  Null `trip_distance` / `fare_amount` read as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub pickup_datetime:  NaiveDateTime,
    pub dropoff_datetime: NaiveDateTime,
    pub pickup_zone:      Option<ZoneId>,
    pub dropoff_zone:     Option<ZoneId>,
    pub passenger_count:  Option<f64>,
    pub trip_distance:    f64,
    pub fare_amount:      f64,
}

/// A trip with both ends resolved to street nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedTrip {
    /// Pickup time as whole seconds since the Unix epoch.
    pub t:                i64,
    pub pickup_datetime:  NaiveDateTime,
    pub dropoff_datetime: NaiveDateTime,
    pub passenger_count:  Option<f64>,
    pub trip_distance:    f64,
    pub pickup_osmid:     i64,
    pub dropoff_osmid:    i64,
    /// Row/column of the pickup node in the pruned distance matrix.
    pub pickup_idx:       NodeIdx,
    pub dropoff_idx:      NodeIdx,
    pub fare_amount:      f64,
}
