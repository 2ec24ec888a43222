//! Error types for meshtools

use thiserror::Error;

/// Main error type for meshtools operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Submesh index {index} out of range ({count} submeshes)")]
    SubmeshOutOfRange { index: usize, count: usize },

    #[error("Face {face} references vertex {vertex}, but the buffer holds {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        vertex: usize,
        vertex_count: usize,
    },
}

/// Result type alias for meshtools operations
pub type Result<T> = std::result::Result<T, Error>;
