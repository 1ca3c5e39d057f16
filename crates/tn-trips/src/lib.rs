//! `tn-trips`: taxi trip records and their mapping onto street nodes.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`record`]  | `TripRecord` (input), `MappedTrip` (output row)            |
//! | [`load`]    | `load_trips` (dispatch by extension), CSV reader           |
//! | `parquet`   | `read_trips_parquet` (feature `parquet`)                   |
//! | [`mapper`]  | `map_trips`, `map_trip`, `MapReport`                       |
//! | [`error`]   | `TripError`, `TripResult<T>`                               |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parquet`  | Read `.parquet` trip files (on by default).               |
//! | `parallel` | `map_trips` processes rows on Rayon's thread pool.        |

pub mod error;
pub mod load;
pub mod mapper;
pub mod record;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use error::{TripError, TripResult};
pub use load::{load_trips, read_trips_csv, read_trips_csv_reader};
pub use mapper::{MapReport, map_trip, map_trips};
pub use record::{MappedTrip, TripRecord};

#[cfg(feature = "parquet")]
pub use crate::parquet::read_trips_parquet;
