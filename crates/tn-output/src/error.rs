//! Error types for tn-output.

use thiserror::Error;

/// Errors that can occur when writing or reading pipeline artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
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

    #[error("invalid .npy file: {0}")]
    Npy(String),

    #[error("node table file has no `{0}` column of the expected type")]
    MissingColumn(&'static str),

    #[error("node table is inconsistent: {0}")]
    NodeTable(#[from] tn_graph::GraphError),

    #[error("{0} output requires the `parquet` feature")]
    FormatUnavailable(&'static str),
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
