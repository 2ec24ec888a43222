//! Core data structures and traits for meshtools
//!
//! This crate provides the mesh container consumed and produced by the
//! content pipeline: vertex buffers with their attribute banks, submeshes,
//! optional shared geometry, and the traits and error type shared by the
//! processing crates.

pub mod error;
pub mod mesh;
pub mod point;
pub mod statistics;
pub mod traits;
pub mod vertex_buffer;

pub use error::*;
pub use mesh::*;
pub use point::*;
pub use statistics::*;
pub use traits::*;
pub use vertex_buffer::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
