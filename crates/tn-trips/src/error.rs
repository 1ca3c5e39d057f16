//! Trip-subsystem error type.

use thiserror::Error;

use tn_core::{NodeIdx, ZoneId};

/// Errors produced by `tn-trips`.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "parquet")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("trip file has no `{0}` column")]
    MissingColumn(&'static str),

    #[error("trip row {row}: unreadable `{column}` value {value:?}")]
    InvalidTimestamp {
        row:    usize,
        column: &'static str,
        value:  String,
    },

    #[error("unsupported trip file format {0:?} (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("zone {zone} lists node {idx}, which is not in the node table")]
    NodeNotFound { zone: ZoneId, idx: NodeIdx },
}

pub type TripResult<T> = Result<T, TripError>;
