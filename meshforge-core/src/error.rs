use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh loading and packing
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while importing or uploading a mesh
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {record} record on line {line}: {content:?}")]
    Malformed {
        line: usize,
        record: &'static str,
        content: String,
    },

    #[error("Face on line {line} has {corners} corners, only triangles are supported")]
    UnsupportedPolygon { line: usize, corners: usize },

    #[error("Missing data: {0}")]
    MissingData(&'static str),

    #[error("{attribute} index {index} on line {line} is out of range (pool holds {len})")]
    IndexOutOfRange {
        line: usize,
        attribute: &'static str,
        index: u32,
        len: usize,
    },

    #[error("Invalid mesh topology: {0}")]
    InvalidTopology(String),

    #[error("Mesh has {0} unique vertices, more than a 32-bit index can address")]
    TooManyVertices(usize),

    #[error("Buffer upload failed: {0}")]
    Upload(String),
}
