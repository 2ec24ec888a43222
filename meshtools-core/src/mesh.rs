//! Mesh container data structures
//!
//! A [`MeshContainer`] owns its submeshes and, optionally, one shared
//! vertex buffer that several submeshes index into. Submeshes hold no
//! reference back to the container; anything needing container-wide
//! context is driven from the container down.

use crate::error::{Error, Result};
use crate::point::Vector3f;
use crate::vertex_buffer::VertexBuffer;
use log::warn;
use serde::{Deserialize, Serialize};

/// A triangle as three vertex indices
pub type Face = [usize; 3];

/// Links a vertex to a skeleton bone. Carried through processing, never
/// interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneAssignment {
    pub vertex_index: usize,
    pub bone_index: usize,
    pub weight: f32,
}

/// A group of triangles sharing one material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submesh {
    pub name: String,
    pub faces: Vec<Face>,
    /// Own geometry; empty when the submesh indexes the shared buffer
    pub vertex_buffer: VertexBuffer,
    pub uses_shared_geometry: bool,
    pub bone_assignments: Vec<BoneAssignment>,
}

impl Submesh {
    /// Create a new submesh owning its geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a submesh that indexes the container's shared geometry
    pub fn with_shared_geometry() -> Self {
        Self {
            uses_shared_geometry: true,
            ..Self::default()
        }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of vertices in the submesh's own buffer
    pub fn vertex_count(&self) -> usize {
        self.vertex_buffer.vertex_count()
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn add_faces(&mut self, faces: &[Face]) {
        self.faces.extend_from_slice(faces);
    }

    pub fn add_bone_assignment(&mut self, assignment: BoneAssignment) {
        self.bone_assignments.push(assignment);
    }

    pub fn translate(&mut self, offset: &Vector3f) {
        self.vertex_buffer.translate(offset);
    }

    /// Append `other`'s faces and geometry.
    ///
    /// Faces and bone assignments of `other` are shifted by this submesh's
    /// vertex count. Submeshes on shared geometry only append faces; the
    /// indices are already global.
    pub fn merge(&mut self, other: &Submesh) {
        let offset = if self.uses_shared_geometry {
            0
        } else {
            self.vertex_buffer.vertex_count()
        };
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|face| [face[0] + offset, face[1] + offset, face[2] + offset]),
        );
        self.bone_assignments
            .extend(other.bone_assignments.iter().map(|b| BoneAssignment {
                vertex_index: b.vertex_index + offset,
                ..*b
            }));
        self.vertex_buffer.merge(&other.vertex_buffer);
    }
}

/// Mutable view of every part of a [`MeshContainer`] at once
pub struct MeshPartsMut<'a> {
    pub shared_geometry: Option<&'a mut VertexBuffer>,
    pub shared_bone_assignments: &'a mut Vec<BoneAssignment>,
    pub submeshes: &'a mut [Submesh],
}

/// Top-level mesh: submeshes plus optional shared geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshContainer {
    submeshes: Vec<Submesh>,
    shared_geometry: Option<VertexBuffer>,
    /// Bone assignments of the shared geometry
    pub shared_bone_assignments: Vec<BoneAssignment>,
    /// Name of the skeleton resource the mesh is bound to
    pub skeleton_link: Option<String>,
}

impl MeshContainer {
    /// Create a new empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new submesh owning its own geometry and return it
    pub fn new_submesh(&mut self) -> &mut Submesh {
        self.push_submesh(Submesh::new())
    }

    /// Append a submesh and return it
    pub fn push_submesh(&mut self, submesh: Submesh) -> &mut Submesh {
        self.submeshes.push(submesh);
        let last = self.submeshes.len() - 1;
        &mut self.submeshes[last]
    }

    /// Create (or reset) the shared vertex buffer and return it
    pub fn new_shared_geometry(&mut self) -> &mut VertexBuffer {
        self.shared_geometry.insert(VertexBuffer::new())
    }

    pub fn shared_geometry(&self) -> Option<&VertexBuffer> {
        self.shared_geometry.as_ref()
    }

    pub fn shared_geometry_mut(&mut self) -> Option<&mut VertexBuffer> {
        self.shared_geometry.as_mut()
    }

    pub fn set_shared_geometry(&mut self, buffer: Option<VertexBuffer>) {
        self.shared_geometry = buffer;
    }

    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    pub fn submeshes_mut(&mut self) -> &mut [Submesh] {
        &mut self.submeshes
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    pub fn submesh(&self, index: usize) -> Result<&Submesh> {
        let count = self.submeshes.len();
        self.submeshes
            .get(index)
            .ok_or(Error::SubmeshOutOfRange { index, count })
    }

    pub fn submesh_mut(&mut self, index: usize) -> Result<&mut Submesh> {
        let count = self.submeshes.len();
        self.submeshes
            .get_mut(index)
            .ok_or(Error::SubmeshOutOfRange { index, count })
    }

    pub fn set_submesh_name(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.submesh_mut(index)?.name = name.into();
        Ok(())
    }

    /// Split borrow of the container's parts
    pub fn parts_mut(&mut self) -> MeshPartsMut<'_> {
        MeshPartsMut {
            shared_geometry: self.shared_geometry.as_mut(),
            shared_bone_assignments: &mut self.shared_bone_assignments,
            submeshes: &mut self.submeshes,
        }
    }

    /// Buffer the faces of `submesh` index into
    pub fn geometry_of<'a>(&'a self, submesh: &'a Submesh) -> Option<&'a VertexBuffer> {
        if submesh.uses_shared_geometry {
            self.shared_geometry.as_ref()
        } else {
            Some(&submesh.vertex_buffer)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.submeshes.iter().all(|s| s.faces.is_empty())
    }

    pub fn translate(&mut self, offset: &Vector3f) {
        for submesh in &mut self.submeshes {
            submesh.translate(offset);
        }
        if let Some(shared) = self.shared_geometry.as_mut() {
            shared.translate(offset);
        }
    }

    /// Append the contents of `other`.
    ///
    /// Submeshes are merged pairwise by position. A source submesh with no
    /// counterpart, or whose counterpart disagrees on shared geometry, is
    /// appended as a new submesh. Shared geometry is appended and `other`'s
    /// shared submeshes are shifted by this container's shared vertex
    /// count. Duplicates are not detected.
    pub fn merge(&mut self, other: &MeshContainer) {
        let shared_offset = self
            .shared_geometry
            .as_ref()
            .map_or(0, VertexBuffer::vertex_count);

        let mut unpaired = Vec::new();
        for (index, source) in other.submeshes.iter().enumerate() {
            match self.submeshes.get_mut(index) {
                Some(target) if target.uses_shared_geometry == source.uses_shared_geometry => {
                    Self::append_submesh(target, source, shared_offset);
                }
                Some(target) => {
                    warn!(
                        "submesh {} '{}' and '{}' disagree on shared geometry, appending as a new submesh",
                        index, target.name, source.name
                    );
                    unpaired.push(source);
                }
                None => unpaired.push(source),
            }
        }
        for source in unpaired {
            let mut target = Submesh {
                name: source.name.clone(),
                uses_shared_geometry: source.uses_shared_geometry,
                ..Submesh::default()
            };
            Self::append_submesh(&mut target, source, shared_offset);
            self.submeshes.push(target);
        }

        if let Some(theirs) = other.shared_geometry.as_ref() {
            self.shared_geometry
                .get_or_insert_with(VertexBuffer::new)
                .merge(theirs);
            self.shared_bone_assignments
                .extend(other.shared_bone_assignments.iter().map(|b| BoneAssignment {
                    vertex_index: b.vertex_index + shared_offset,
                    ..*b
                }));
        }
    }

    fn append_submesh(target: &mut Submesh, source: &Submesh, shared_offset: usize) {
        if source.uses_shared_geometry {
            target.faces.extend(source.faces.iter().map(|face| {
                [
                    face[0] + shared_offset,
                    face[1] + shared_offset,
                    face[2] + shared_offset,
                ]
            }));
        } else {
            target.merge(source);
        }
    }

    /// Check every buffer and that every face index is in range
    pub fn validate(&self) -> Result<()> {
        if let Some(shared) = self.shared_geometry.as_ref() {
            shared.validate()?;
        }
        for submesh in &self.submeshes {
            let buffer = match self.geometry_of(submesh) {
                Some(buffer) => buffer,
                None => {
                    return Err(Error::InvalidData(format!(
                        "submesh '{}' uses shared geometry but the mesh has none",
                        submesh.name
                    )))
                }
            };
            if !submesh.uses_shared_geometry {
                buffer.validate()?;
            }
            let vertex_count = buffer.vertex_count();
            for (face, corners) in submesh.faces.iter().enumerate() {
                if let Some(&vertex) = corners.iter().find(|&&v| v >= vertex_count) {
                    return Err(Error::IndexOutOfRange {
                        face,
                        vertex,
                        vertex_count,
                    });
                }
            }
        }
        Ok(())
    }
}
