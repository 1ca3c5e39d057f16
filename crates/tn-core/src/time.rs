//! Trip timestamp handling.
//!
//! Trip datetimes are naive (no timezone), as in the TLC trip records.  They
//! are stored as `NaiveDateTime` and converted to integer epoch values by
//! treating them as UTC, which is what the downstream simulator expects for
//! the `t` column.

use chrono::{DateTime, NaiveDateTime};

/// Accepted text layouts, tried in order.
const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a trip datetime such as `2024-09-01 00:05:51`.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Whole seconds since the Unix epoch, rounded towards negative infinity.
#[inline]
pub fn epoch_seconds(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

/// Microseconds since the Unix epoch (Arrow `Timestamp(Microsecond)` unit).
#[inline]
pub fn epoch_micros(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}

/// Inverse of [`epoch_micros`].  `None` if out of chrono's range.
#[inline]
pub fn from_epoch_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
