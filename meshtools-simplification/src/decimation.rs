//! Whole-mesh decimation pipeline
//!
//! Runs prepare → collapse → compact over every submesh of a
//! [`MeshContainer`]. Submeshes with their own geometry are rebuilt one by
//! one; submeshes on shared geometry are collapsed individually and the
//! shared buffer is then rebuilt once, in submesh order, with a running
//! offset so each submesh gets its own index range.

use crate::compaction::BufferCompactor;
use crate::edge_collapse::{CollapseOutcome, CollapseTarget, EdgeCollapseEngine};
use crate::MeshSimplifier;
use log::{debug, warn};
use meshtools_core::{MeshContainer, Submesh};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// What happened to one submesh
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmeshReport {
    pub index: usize,
    pub name: String,
    pub uses_shared_geometry: bool,
    pub unique_edges: usize,
    pub requested: usize,
    pub collapsed: usize,
    pub faces_before: usize,
    pub faces_after: usize,
    /// Vertices in the submesh's own buffer, or in its shared range
    pub vertices_after: usize,
    /// Index range of the shared buffer assigned to this submesh
    pub shared_range: Option<Range<usize>>,
}

/// Summary of a decimation run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecimationReport {
    pub submeshes: Vec<SubmeshReport>,
    pub shared_vertices_before: Option<usize>,
    pub shared_vertices_after: Option<usize>,
}

impl DecimationReport {
    pub fn total_collapsed(&self) -> usize {
        self.submeshes.iter().map(|s| s.collapsed).sum()
    }

    pub fn faces_removed(&self) -> usize {
        self.submeshes
            .iter()
            .map(|s| s.faces_before - s.faces_after)
            .sum()
    }
}

/// Edge collapse mesh simplifier.
///
/// Collapses the shortest edges of every submesh, merging each edge into
/// its more referenced endpoint, then compacts the vertex buffers so that
/// only referenced vertices remain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeCollapseSimplifier {
    /// Collapse amount used by [`EdgeCollapseSimplifier::decimate`]
    pub target: CollapseTarget,
    /// Never let a submesh drop below this many triangles
    pub min_faces_per_submesh: usize,
}

impl Default for EdgeCollapseSimplifier {
    fn default() -> Self {
        Self {
            target: CollapseTarget::default(),
            min_faces_per_submesh: 1,
        }
    }
}

impl EdgeCollapseSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(target: CollapseTarget, min_faces_per_submesh: usize) -> Self {
        Self {
            target,
            min_faces_per_submesh,
        }
    }

    pub fn with_target(mut self, target: CollapseTarget) -> Self {
        self.target = target;
        self
    }

    fn engine(&self) -> EdgeCollapseEngine {
        EdgeCollapseEngine::with_face_floor(self.min_faces_per_submesh)
    }

    /// Decimate `mesh` in place with the configured target
    pub fn decimate(&self, mesh: &mut MeshContainer) -> DecimationReport {
        self.decimate_with(mesh, self.target)
    }

    /// Decimate `mesh` in place.
    ///
    /// Never fails: malformed faces are skipped with a warning and a target
    /// the mesh cannot satisfy collapses as much as it can.
    pub fn decimate_with(&self, mesh: &mut MeshContainer, target: CollapseTarget) -> DecimationReport {
        let engine = self.engine();
        let parts = mesh.parts_mut();
        let mut report = DecimationReport::default();

        for (index, submesh) in parts.submeshes.iter_mut().enumerate() {
            if submesh.uses_shared_geometry {
                continue;
            }
            let faces_before = submesh.faces.len();
            let outcome = engine.run(&submesh.faces, &mut submesh.vertex_buffer, target);

            let mut compactor = BufferCompactor::new(&submesh.vertex_buffer);
            let compaction = compactor.rebuild(&outcome.faces, &outcome.merge_map);
            let bones = compaction.remap_bone_assignments(&submesh.bone_assignments, &outcome.merge_map);
            let buffer = compactor.finish();

            submesh.faces = compaction.faces;
            submesh.vertex_buffer = buffer;
            submesh.bone_assignments = bones;

            let entry = Self::submesh_report(index, submesh, &outcome, faces_before, None);
            Self::log_submesh(&entry);
            report.submeshes.push(entry);
        }

        let shared_indices: Vec<usize> = parts
            .submeshes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.uses_shared_geometry)
            .map(|(i, _)| i)
            .collect();
        if shared_indices.is_empty() {
            return report;
        }
        let Some(shared) = parts.shared_geometry else {
            warn!(
                "{} submeshes use shared geometry but the mesh has none, leaving them untouched",
                shared_indices.len()
            );
            return report;
        };

        report.shared_vertices_before = Some(shared.vertex_count());
        let outcomes: Vec<(usize, CollapseOutcome)> = shared_indices
            .iter()
            .map(|&i| (i, engine.run(&parts.submeshes[i].faces, shared, target)))
            .collect();

        let mut compactor = BufferCompactor::new(shared);
        let mut shared_bones = Vec::new();
        let mut compactions = Vec::with_capacity(outcomes.len());
        for (index, outcome) in &outcomes {
            let compaction = compactor.rebuild(&outcome.faces, &outcome.merge_map);
            shared_bones.extend(
                compaction.remap_bone_assignments(parts.shared_bone_assignments, &outcome.merge_map),
            );
            compactions.push((*index, compaction));
        }
        let rebuilt = compactor.finish();

        for ((index, outcome), (_, compaction)) in outcomes.iter().zip(compactions) {
            let submesh = &mut parts.submeshes[*index];
            let faces_before = submesh.faces.len();
            submesh.faces = compaction.faces;
            let entry = Self::submesh_report(*index, submesh, outcome, faces_before, Some(compaction.range));
            Self::log_submesh(&entry);
            report.submeshes.push(entry);
        }

        report.shared_vertices_after = Some(rebuilt.vertex_count());
        *shared = rebuilt;
        *parts.shared_bone_assignments = shared_bones;
        report
    }

    fn submesh_report(
        index: usize,
        submesh: &Submesh,
        outcome: &CollapseOutcome,
        faces_before: usize,
        shared_range: Option<Range<usize>>,
    ) -> SubmeshReport {
        SubmeshReport {
            index,
            name: submesh.name.clone(),
            uses_shared_geometry: submesh.uses_shared_geometry,
            unique_edges: outcome.unique_edges,
            requested: outcome.requested,
            collapsed: outcome.collapsed(),
            faces_before,
            faces_after: submesh.faces.len(),
            vertices_after: shared_range
                .as_ref()
                .map_or(submesh.vertex_count(), |r| r.len()),
            shared_range,
        }
    }

    fn log_submesh(entry: &SubmeshReport) {
        debug!(
            "submesh {} '{}': {} unique edges, {}/{} collapses, faces {} -> {}, {} vertices",
            entry.index,
            entry.name,
            entry.unique_edges,
            entry.collapsed,
            entry.requested,
            entry.faces_before,
            entry.faces_after,
            entry.vertices_after
        );
    }
}

impl MeshSimplifier for EdgeCollapseSimplifier {
    fn simplify(&self, mesh: &MeshContainer, target: CollapseTarget) -> MeshContainer {
        let mut simplified = mesh.clone();
        self.decimate_with(&mut simplified, target);
        simplified
    }
}
