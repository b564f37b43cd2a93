use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the ugrid mesh kernel.
#[derive(Debug, Error)]
pub enum UgridError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors related to the topology store.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors raised by the mesh codecs.
///
/// Permissive scanning is not represented here: unmatched lines in the
/// polyMesh block parsers are skipped silently and only record counts
/// signal success.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("could not read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("VTK {attribute} is not {expected:?} but {value:?}")]
    Validation {
        attribute: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("file does not look like a VTU document")]
    NotVtu,

    #[error("unsupported VTK cell type {vtk_type}")]
    UnsupportedCellType { vtk_type: i64 },

    #[error("polyhedron cell {cell} declares {declared} faces but {decoded} were decoded")]
    MalformedPolyhedron {
        cell: usize,
        declared: usize,
        decoded: usize,
    },

    #[error("face {key:?} is already shared by two cells")]
    DuplicateFaceOwnership { key: Vec<u32> },

    #[error("could not parse {token:?} in DataArray {array:?}")]
    Parse { array: String, token: String },
}

/// Convenience type alias for results using [`UgridError`].
pub type Result<T> = std::result::Result<T, UgridError>;
