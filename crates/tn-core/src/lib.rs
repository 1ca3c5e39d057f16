//! `tn-core`: foundational types for the `taxinet` preprocessing pipeline.
//!
//! This crate is a dependency of every other `tn-*` crate.  It has no `tn-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `NodeIdx` (dense matrix index), `ZoneId`              |
//! | [`geo`]         | `GeoPoint` (WGS-84 lon/lat)                           |
//! | [`time`]        | trip timestamp parsing and epoch conversions          |
//! | [`rng`]         | `RowRng` (per-row), `StageRng` (per-stage)            |
//! | [`config`]      | `PipelineConfig`, `VerifyMode`, `OutputFormat`        |
//! | [`error`]       | `TnError`, `TnResult`                                 |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{OutputFormat, PipelineConfig, VerifyMode};
pub use error::{TnError, TnResult};
pub use geo::GeoPoint;
pub use ids::{NodeIdx, ZoneId};
pub use rng::{RowRng, StageRng};
