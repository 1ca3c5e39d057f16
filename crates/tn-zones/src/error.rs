//! Zone-subsystem error type.

use thiserror::Error;

/// Errors produced by `tn-zones`.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("feature #{feature} has no LocationID property")]
    MissingLocationId { feature: usize },

    #[error("feature #{feature} has unusable LocationID {value}")]
    InvalidLocationId { feature: usize, value: String },

    #[error("feature #{feature} has {kind} geometry; only Polygon and MultiPolygon are supported")]
    UnsupportedGeometry { feature: usize, kind: String },

    #[error("unsupported coordinate reference system {0:?}")]
    UnsupportedCrs(String),
}

pub type ZoneResult<T> = Result<T, ZoneError>;
