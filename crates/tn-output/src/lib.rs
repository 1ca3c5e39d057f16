//! `tn-output`: writers (and readers) for the pipeline's three artifacts.
//!
//! | Artifact        | Format                          | API                                     |
//! |-----------------|---------------------------------|-----------------------------------------|
//! | distance matrix | NumPy `.npy` (`<f8`, C order)   | `write_matrix_npy`, `read_matrix_npy`   |
//! | node table      | CSV, or Parquet with `parquet`  | [`TableWriter::write_nodes`], `read_nodes_*` |
//! | trip table      | CSV, or Parquet with `parquet`  | [`TableWriter::write_trips`]            |
//!
//! Both table backends implement [`TableWriter`]; pick one with
//! [`create_writer`] from the configured `OutputFormat`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tn_output::{create_writer, write_matrix_npy};
//!
//! write_matrix_npy(&config.distances_path(), &pruned.matrix)?;
//! let mut w = create_writer(config.output_format, &config.nodes_path(), &config.trips_out_path())?;
//! w.write_nodes(&pruned.nodes)?;
//! w.write_trips(&mapped)?;
//! w.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod npy;
pub mod writer;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use crate::csv::{CsvWriter, read_nodes_csv};
pub use error::{OutputError, OutputResult};
pub use npy::{read_matrix_npy, read_npy, write_matrix_npy, write_npy};
pub use writer::{TableWriter, create_writer};

#[cfg(feature = "parquet")]
pub use crate::parquet::{ParquetWriter, read_nodes_parquet};
