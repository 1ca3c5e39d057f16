//! `tn-zones`: taxi zone polygons and the node → zone spatial join.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                    |
//! |-----------|-------------------------------------------------------------|
//! | [`crs`]   | `Crs`: the handful of projections the zone data ships in    |
//! | [`zones`] | `Zone`, `load_zones_geojson`, `parse_zones_geojson`         |
//! | [`join`]  | `ZoneIndex` (R-tree), `NodeZoneTable`, `JoinReport`         |
//! | [`error`] | `ZoneError`, `ZoneResult<T>`                                |
//!
//! # Coordinates
//!
//! Everything leaving this crate is WGS-84 lon/lat.  Polygons are reprojected
//! at load time and node positions through [`crs::reproject_points`], so the
//! containment test always compares like with like.

pub mod crs;
pub mod error;
pub mod join;
pub mod zones;

#[cfg(test)]
mod tests;

pub use crs::{Crs, reproject_points};
pub use error::{ZoneError, ZoneResult};
pub use join::{JoinReport, NodeZoneTable, ZoneIndex, assign_nodes};
pub use zones::{Zone, load_zones_geojson, parse_zones_geojson};
