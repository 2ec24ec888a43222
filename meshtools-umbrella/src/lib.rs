//! # meshtools
//!
//! Triangle mesh containers and edge collapse decimation.
//!
//! This is the umbrella crate re-exporting the individual meshtools crates.
//! Depend on the sub-crates directly for more granular control.
//!
//! ## Quick Start
//!
//! ```rust
//! use meshtools::prelude::*;
//!
//! let mut mesh = MeshContainer::new();
//! let submesh = mesh.push_submesh(Submesh::new());
//! submesh.vertex_buffer.add_vertex(Point3f::new(0.0, 0.0, 0.0));
//! submesh.vertex_buffer.add_vertex(Point3f::new(1.0, 0.0, 0.0));
//! submesh.vertex_buffer.add_vertex(Point3f::new(0.0, 1.0, 0.0));
//! submesh.add_face([0, 1, 2]);
//!
//! let report = EdgeCollapseSimplifier::new().decimate(&mut mesh);
//! assert_eq!(report.submeshes.len(), 1);
//! assert!(mesh.submesh(0).unwrap().face_count() >= 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables simplification
//! - `simplification`: Edge collapse decimation

pub use meshtools_core::*;

#[cfg(feature = "simplification")]
pub use meshtools_simplification as simplification;

/// Convenient imports for common use cases
pub mod prelude {
    pub use meshtools_core::*;

    #[cfg(feature = "simplification")]
    pub use meshtools_simplification::*;
}
