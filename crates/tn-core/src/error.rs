//! Core error type.
//!
//! Sub-crates define their own error enums (`GraphError`, `ZoneError`, …);
//! `TnError` covers only what lives in this crate: configuration loading and
//! validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TnError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `tn-core`.
pub type TnResult<T> = Result<T, TnError>;
