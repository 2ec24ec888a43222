//! Core traits for meshtools

use crate::{mesh::*, point::*, vertex_buffer::VertexBuffer};

/// Trait for objects with spatial extent
pub trait Bounded {
    /// Axis-aligned bounds, `None` when there is no geometry
    fn bounding_box(&self) -> Option<Bounds>;

    /// Center of the bounding box
    fn center(&self) -> Option<Point3f> {
        self.bounding_box().map(|b| b.center())
    }
}

/// Trait for objects that can be moved
pub trait Translatable {
    fn translate_by(&mut self, offset: &Vector3f);
}

impl Bounded for VertexBuffer {
    fn bounding_box(&self) -> Option<Bounds> {
        self.bounds().copied()
    }
}

impl Bounded for MeshContainer {
    /// Union of the shared buffer and every submesh buffer. Extremum
    /// indices refer to whichever buffer produced the extreme.
    fn bounding_box(&self) -> Option<Bounds> {
        let own = self
            .submeshes()
            .iter()
            .filter_map(|s| s.vertex_buffer.bounds());
        self.shared_geometry()
            .and_then(VertexBuffer::bounds)
            .into_iter()
            .chain(own)
            .copied()
            .reduce(|acc, b| acc.union(&b, 0))
    }
}

impl Translatable for VertexBuffer {
    fn translate_by(&mut self, offset: &Vector3f) {
        self.translate(offset);
    }
}

impl Translatable for Submesh {
    fn translate_by(&mut self, offset: &Vector3f) {
        self.translate(offset);
    }
}

impl Translatable for MeshContainer {
    fn translate_by(&mut self, offset: &Vector3f) {
        self.translate(offset);
    }
}
