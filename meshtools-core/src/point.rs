//! Point types and bounding bookkeeping

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Axis-aligned bounds of a vertex buffer.
///
/// Besides the extreme coordinates, the index of the vertex that produced
/// each extreme is tracked per axis, which is what bounding-volume
/// consumers downstream of the mesh container read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point3f,
    pub max: Point3f,
    /// Vertex index holding the minimum on each axis
    pub min_index: [usize; 3],
    /// Vertex index holding the maximum on each axis
    pub max_index: [usize; 3],
}

impl Bounds {
    /// Bounds of a single vertex
    pub fn from_point(point: Point3f, index: usize) -> Self {
        Self {
            min: point,
            max: point,
            min_index: [index; 3],
            max_index: [index; 3],
        }
    }

    /// Grow the bounds to contain `point`, recording `index` for every axis
    /// on which it becomes the new extreme.
    pub fn include(&mut self, point: Point3f, index: usize) {
        for axis in 0..3 {
            if point[axis] < self.min[axis] {
                self.min[axis] = point[axis];
                self.min_index[axis] = index;
            }
            if point[axis] > self.max[axis] {
                self.max[axis] = point[axis];
                self.max_index[axis] = index;
            }
        }
    }

    /// Shift the bounds; extremum indices are unaffected.
    pub fn translate(&mut self, offset: &Vector3f) {
        self.min += *offset;
        self.max += *offset;
    }

    pub fn center(&self) -> Point3f {
        Point3f::from((self.min.coords + self.max.coords) * 0.5)
    }

    pub fn extent(&self) -> Vector3f {
        self.max - self.min
    }

    /// Union of two bounds; `index_offset` is added to the other bounds'
    /// extremum indices (the other buffer was appended after this one).
    pub fn union(&self, other: &Bounds, index_offset: usize) -> Bounds {
        let mut merged = *self;
        for axis in 0..3 {
            if other.min[axis] < merged.min[axis] {
                merged.min[axis] = other.min[axis];
                merged.min_index[axis] = other.min_index[axis] + index_offset;
            }
            if other.max[axis] > merged.max[axis] {
                merged.max[axis] = other.max[axis];
                merged.max_index[axis] = other.max_index[axis] + index_offset;
            }
        }
        merged
    }
}
