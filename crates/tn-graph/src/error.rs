//! Graph-subsystem error type.

use thiserror::Error;

/// Errors produced by `tn-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GraphML parse error: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("{element} {id} has no `{attr}` attribute")]
    MissingAttribute {
        element: &'static str,
        id:      String,
        attr:    &'static str,
    },

    #[error("attribute `{attr}` has non-numeric value {value:?}")]
    InvalidNumber { attr: &'static str, value: String },

    #[error("edge references undeclared node {0:?}")]
    UnknownNode(String),

    #[error("node {0:?} declared twice")]
    DuplicateNode(String),

    #[error("node {0:?} not found in network")]
    NodeNotFound(String),

    #[error("speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),

    #[error("matrix is {matrix}×{matrix} but node table has {nodes} rows")]
    DimensionMismatch { matrix: usize, nodes: usize },

    #[error("node table row {position} carries index {idx}; indices must be 0..N in order")]
    NonContiguousIndex { position: usize, idx: u32 },

    #[error("matrix mismatch {from:?} → {to:?}: graph says {graph} s, matrix says {matrix} s")]
    MatrixMismatch {
        from:   String,
        to:     String,
        graph:  f64,
        matrix: f64,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;
