//! `tn-graph`: street network, all-pairs travel times, and pruning.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `StreetNetwork` (CSR), `StreetNetworkBuilder`               |
//! | [`nodes`]   | `NodeRecord`, `NodeTable` (dense index → node metadata)     |
//! | [`graphml`] | `load_graphml`, `load_graphml_reader`                       |
//! | [`router`]  | `Router` trait, `DijkstraRouter`, `all_pairs`               |
//! | [`matrix`]  | `DistanceMatrix` (dense N×N seconds, `+inf` = unreachable)  |
//! | [`prune`]   | `prune`, `verify_pruned`, `PrunedGraph`                     |
//! | [`error`]   | `GraphError`, `GraphResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | `all_pairs` fills matrix rows on Rayon's thread pool.     |

pub mod error;
pub mod graphml;
pub mod matrix;
pub mod network;
pub mod nodes;
pub mod prune;
pub mod router;


pub use error::{GraphError, GraphResult};
pub use graphml::{load_graphml, load_graphml_reader};
pub use matrix::DistanceMatrix;
pub use network::{StreetNetwork, StreetNetworkBuilder};
pub use nodes::{NodeRecord, NodeTable};
pub use prune::{PrunedGraph, prune, verify_pruned};
pub use router::{DijkstraRouter, Router, all_pairs};
