//! Mesh simplification and decimation algorithms
//!
//! This crate reduces mesh complexity by edge collapse:
//! - Unique edge extraction and squared-length ordering
//! - Greedy shortest-edge collapse with reference-count driven merging
//! - Vertex buffer compaction, including shared geometry across submeshes

pub mod compaction;
pub mod decimation;
pub mod edge_collapse;
pub mod edge_cost;

pub use compaction::*;
pub use decimation::*;
pub use edge_collapse::*;
pub use edge_cost::*;

use meshtools_core::MeshContainer;

/// Simplify a mesh by reducing the number of faces/vertices
pub trait MeshSimplifier {
    /// Simplified copy of `mesh`; `target` chooses how many edges to collapse
    fn simplify(&self, mesh: &MeshContainer, target: CollapseTarget) -> MeshContainer;
}
