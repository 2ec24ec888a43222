//! Vertex buffer compaction after a collapse pass
//!
//! Faces are scanned in order; the first time a (merge-resolved) source
//! vertex is seen it is copied, with all its attributes, to the end of the
//! output buffer. The output buffer only ever holds vertices that some
//! surviving face references.
//!
//! One compactor can serve several submeshes sharing a vertex buffer: each
//! [`BufferCompactor::rebuild`] call gets its own remap table and continues
//! numbering where the previous call stopped, so every submesh owns a
//! disjoint, contiguous index range of the rebuilt buffer.

use crate::edge_collapse::MergeMap;
use log::warn;
use meshtools_core::{AttributeMask, BoneAssignment, Face, VertexBuffer};
use std::collections::HashMap;
use std::ops::Range;

/// Faces and index mapping produced for one submesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compaction {
    pub faces: Vec<Face>,
    /// Source vertex → new vertex index
    pub remap: HashMap<usize, usize>,
    /// Indices of the output buffer assigned by this call
    pub range: Range<usize>,
}

impl Compaction {
    /// Re-index bone assignments of vertices that survived the collapse.
    ///
    /// Assignments of discarded or unreferenced vertices are dropped.
    pub fn remap_bone_assignments(
        &self,
        assignments: &[BoneAssignment],
        merge_map: &MergeMap,
    ) -> Vec<BoneAssignment> {
        assignments
            .iter()
            .filter(|b| !merge_map.contains(b.vertex_index))
            .filter_map(|b| {
                self.remap.get(&b.vertex_index).map(|&vertex_index| BoneAssignment {
                    vertex_index,
                    ..*b
                })
            })
            .collect()
    }
}

/// Builds a densely indexed vertex buffer from a source buffer.
///
/// Only attributes the source holds for every vertex are carried over;
/// partially populated ones are left empty in the output.
#[derive(Debug)]
pub struct BufferCompactor<'a> {
    source: &'a VertexBuffer,
    carried: AttributeMask,
    output: VertexBuffer,
}

impl<'a> BufferCompactor<'a> {
    pub fn new(source: &'a VertexBuffer) -> Self {
        let carried = source.complete_attributes();
        let partial = carried.partial_in(source);
        if !partial.is_empty() {
            warn!(
                "dropping partially populated {} of a {} vertex buffer during compaction",
                partial.join(", "),
                source.vertex_count()
            );
        }
        Self {
            source,
            carried,
            output: source.empty_like(),
        }
    }

    /// Index the next copied vertex will receive
    pub fn running_offset(&self) -> usize {
        self.output.vertex_count()
    }

    /// Compact one face list, appending its vertices to the output buffer.
    ///
    /// Faces referencing vertices missing from the source are skipped.
    pub fn rebuild(&mut self, faces: &[Face], merge_map: &MergeMap) -> Compaction {
        let start = self.running_offset();
        let source_count = self.source.vertex_count();
        let mut remap: HashMap<usize, usize> = HashMap::new();
        let mut new_faces = Vec::with_capacity(faces.len());
        let mut skipped = 0usize;

        for face in faces {
            let resolved = face.map(|v| merge_map.resolve(v));
            if resolved.iter().any(|&v| v >= source_count) {
                skipped += 1;
                continue;
            }
            let mut new_face = resolved;
            for corner in new_face.iter_mut() {
                let new_index = match remap.get(corner) {
                    Some(&index) => index,
                    None => {
                        let index = self.copy_vertex(*corner);
                        remap.insert(*corner, index);
                        index
                    }
                };
                *corner = new_index;
            }
            new_faces.push(new_face);
        }

        if skipped > 0 {
            warn!(
                "compaction skipped {} faces with indices outside {} source vertices",
                skipped, source_count
            );
        }

        Compaction {
            faces: new_faces,
            remap,
            range: start..self.running_offset(),
        }
    }

    fn copy_vertex(&mut self, index: usize) -> usize {
        let offset = self.output.vertex_count();
        self.output
            .copy_vertex_from(self.source, index, &self.carried)
            .unwrap_or(offset)
    }

    /// The rebuilt buffer
    pub fn finish(self) -> VertexBuffer {
        self.output
    }
}
