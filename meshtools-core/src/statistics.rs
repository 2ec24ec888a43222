//! Mesh statistics reporting

use crate::mesh::{MeshContainer, Submesh};
use crate::vertex_buffer::VertexBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute counts of one vertex buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStatistics {
    pub vertices: usize,
    pub normals: usize,
    pub texcoord_banks: usize,
    /// Tuples in the first texcoord bank
    pub texcoords: usize,
    pub colors: usize,
}

impl BufferStatistics {
    pub fn of(buffer: &VertexBuffer) -> Self {
        Self {
            vertices: buffer.vertex_count(),
            normals: buffer.normals().len(),
            texcoord_banks: buffer.texcoord_bank_count(),
            texcoords: buffer.texcoord_banks().first().map_or(0, |b| b.len()),
            colors: buffer.colors().len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmeshStatistics {
    pub name: String,
    pub faces: usize,
    pub uses_shared_geometry: bool,
    pub buffer: BufferStatistics,
    pub bone_assignments: usize,
}

impl SubmeshStatistics {
    pub fn of(submesh: &Submesh) -> Self {
        Self {
            name: submesh.name.clone(),
            faces: submesh.face_count(),
            uses_shared_geometry: submesh.uses_shared_geometry,
            buffer: BufferStatistics::of(&submesh.vertex_buffer),
            bone_assignments: submesh.bone_assignments.len(),
        }
    }
}

/// Summary of a mesh container's contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshStatistics {
    pub shared: Option<BufferStatistics>,
    pub submeshes: Vec<SubmeshStatistics>,
}

impl MeshStatistics {
    pub fn total_faces(&self) -> usize {
        self.submeshes.iter().map(|s| s.faces).sum()
    }

    /// Vertices across the shared buffer and every submesh buffer
    pub fn total_vertices(&self) -> usize {
        self.shared.map_or(0, |s| s.vertices)
            + self.submeshes.iter().map(|s| s.buffer.vertices).sum::<usize>()
    }
}

impl MeshContainer {
    pub fn statistics(&self) -> MeshStatistics {
        MeshStatistics {
            shared: self.shared_geometry().map(BufferStatistics::of),
            submeshes: self.submeshes().iter().map(SubmeshStatistics::of).collect(),
        }
    }

    /// Write the statistics to the log at info level
    pub fn log_statistics(&self) {
        for line in self.statistics().to_string().lines() {
            log::info!("{}", line);
        }
    }
}

impl fmt::Display for BufferStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vertices={}, normals={}, texcoords={} ({} banks), colors={}",
            self.vertices, self.normals, self.texcoords, self.texcoord_banks, self.colors
        )
    }
}

impl fmt::Display for MeshStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MeshContainer:")?;
        writeln!(f, " Shared vertices: {}", self.shared.is_some())?;
        if let Some(shared) = &self.shared {
            writeln!(f, "  {}", shared)?;
        }
        writeln!(f, " Submeshes {}", self.submeshes.len())?;
        for submesh in &self.submeshes {
            writeln!(f, "  Name = {}", submesh.name)?;
            writeln!(
                f,
                "  faces={}, shared={}, bones={}, {}",
                submesh.faces, submesh.uses_shared_geometry, submesh.bone_assignments, submesh.buffer
            )?;
        }
        Ok(())
    }
}
