//! Edge collapse simplification
//!
//! Drains an [`EdgeCostIndex`] cheapest edge first, merging the endpoints
//! of each edge into whichever vertex is referenced by more face corners.
//! Decisions are recorded in a [`MergeMap`]; once the requested number of
//! collapses is reached the face list is rewritten through the map and
//! triangles that lost a corner are dropped.

use crate::edge_cost::EdgeCostIndex;
use meshtools_core::{Face, VertexBuffer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fraction of unique edges collapsed when the caller does not choose
pub const DEFAULT_COLLAPSE_FRACTION: f32 = 0.80;

/// How many edges a collapse pass should remove
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollapseTarget {
    /// Absolute number of collapses
    Count(usize),
    /// Fraction of the unique edges, `0.0..=1.0`
    Fraction(f32),
}

impl Default for CollapseTarget {
    fn default() -> Self {
        CollapseTarget::Fraction(DEFAULT_COLLAPSE_FRACTION)
    }
}

impl CollapseTarget {
    /// Number of collapses to attempt on a mesh with `unique_edges` edges.
    ///
    /// Counts are clamped to the edge count, fractions to `0.0..=1.0`.
    pub fn resolve(self, unique_edges: usize) -> usize {
        match self {
            CollapseTarget::Count(count) => count.min(unique_edges),
            CollapseTarget::Fraction(fraction) => {
                let fraction = if fraction.is_nan() {
                    0.0
                } else {
                    fraction.clamp(0.0, 1.0)
                };
                ((unique_edges as f64) * f64::from(fraction)).floor() as usize
            }
        }
    }
}

/// Discarded vertex → surviving vertex, kept flat: every entry points at a
/// vertex that is not itself mapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeMap {
    targets: HashMap<usize, usize>,
    /// Survivor → every vertex currently mapped onto it
    absorbed: HashMap<usize, Vec<usize>>,
}

impl MergeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final vertex for `vertex`; unmapped vertices resolve to themselves
    pub fn resolve(&self, vertex: usize) -> usize {
        self.targets.get(&vertex).copied().unwrap_or(vertex)
    }

    pub fn get(&self, vertex: usize) -> Option<usize> {
        self.targets.get(&vertex).copied()
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.targets.contains_key(&vertex)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets.iter().map(|(&from, &to)| (from, to))
    }

    /// Map `discarded` onto `survivor`.
    ///
    /// Returns `false` without changes when `discarded` is already mapped
    /// or both resolve to the same vertex. Entries that pointed at
    /// `discarded` are retargeted to the survivor's root.
    pub fn insert(&mut self, discarded: usize, survivor: usize) -> bool {
        if self.targets.contains_key(&discarded) {
            return false;
        }
        let survivor = self.resolve(survivor);
        if survivor == discarded {
            return false;
        }

        self.targets.insert(discarded, survivor);
        let mut moved = self.absorbed.remove(&discarded).unwrap_or_default();
        for &vertex in &moved {
            self.targets.insert(vertex, survivor);
        }
        moved.push(discarded);
        self.absorbed.entry(survivor).or_default().extend(moved);
        true
    }
}

/// One recorded collapse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseDecision {
    pub survivor: usize,
    pub discarded: usize,
    pub survivor_references: u32,
    pub discarded_references: u32,
}

/// Result of a collapse pass
#[derive(Debug, Clone, Default)]
pub struct CollapseOutcome {
    /// Rewritten faces with degenerate triangles removed
    pub faces: Vec<Face>,
    pub merge_map: MergeMap,
    pub decisions: Vec<CollapseDecision>,
    pub unique_edges: usize,
    /// Collapses asked for after clamping
    pub requested: usize,
    /// Faces dropped because the merge made two corners coincide
    pub degenerate_faces: usize,
    /// Faces dropped because they reference vertices outside the buffer
    pub invalid_faces: usize,
}

impl CollapseOutcome {
    pub fn collapsed(&self) -> usize {
        self.decisions.len()
    }
}

/// Live face bookkeeping used to honour a face floor
struct FaceTracker {
    corners: Vec<Face>,
    alive: Vec<bool>,
    incident: Vec<Vec<usize>>,
    live: usize,
}

impl FaceTracker {
    fn new(faces: &[Face], vertex_count: usize) -> Self {
        let mut incident = vec![Vec::new(); vertex_count];
        let mut alive = vec![false; faces.len()];
        let mut live = 0;
        for (index, face) in faces.iter().enumerate() {
            if face.iter().any(|&v| v >= vertex_count) || is_degenerate(face) {
                continue;
            }
            alive[index] = true;
            live += 1;
            for &v in face {
                incident[v].push(index);
            }
        }
        Self {
            corners: faces.to_vec(),
            alive,
            incident,
            live,
        }
    }

    /// Faces that would degenerate if `discarded` merged into `survivor`
    fn dying(&self, discarded: usize, survivor: usize) -> usize {
        self.incident[discarded]
            .iter()
            .filter(|&&f| self.alive[f] && self.corners[f].contains(&survivor))
            .count()
    }

    fn merge(&mut self, discarded: usize, survivor: usize) {
        let moved = std::mem::take(&mut self.incident[discarded]);
        for &f in &moved {
            if !self.alive[f] {
                continue;
            }
            for corner in self.corners[f].iter_mut() {
                if *corner == discarded {
                    *corner = survivor;
                }
            }
            if is_degenerate(&self.corners[f]) {
                self.alive[f] = false;
                self.live -= 1;
            }
        }
        self.incident[survivor].extend(moved);
    }
}

/// Whether two corners of `face` coincide
pub fn is_degenerate(face: &Face) -> bool {
    face[0] == face[1] || face[1] == face[2] || face[0] == face[2]
}

/// Apply `merge_map` to every corner and drop the triangles that become
/// degenerate. Order is preserved; duplicate triangles are kept. Faces with
/// corners outside `vertex_count` are dropped as well.
pub fn rewrite_faces(faces: &[Face], merge_map: &MergeMap, vertex_count: usize) -> Vec<Face> {
    faces
        .iter()
        .filter(|face| face.iter().all(|&v| v < vertex_count))
        .map(|face| face.map(|v| merge_map.resolve(v)))
        .filter(|face| !is_degenerate(face))
        .collect()
}

/// Greedy shortest-edge collapse.
///
/// With the default face floor of 0 a large enough target can remove every
/// triangle of a mesh; use [`EdgeCollapseEngine::with_face_floor`] to keep
/// some.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCollapseEngine {
    /// Skip collapses that would leave fewer non-degenerate faces than this
    pub face_floor: usize,
}

impl EdgeCollapseEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_face_floor(face_floor: usize) -> Self {
        Self { face_floor }
    }

    /// Prepare an index for `faces` over `buffer` and collapse it
    pub fn run(&self, faces: &[Face], buffer: &mut VertexBuffer, target: CollapseTarget) -> CollapseOutcome {
        let index = EdgeCostIndex::prepare(faces, buffer);
        self.collapse(index, faces, target)
    }

    /// Collapse up to `target` edges of `index`, which must have been
    /// prepared from `faces`.
    ///
    /// Endpoints are resolved through the merge map first; edges whose
    /// endpoints already coincide are skipped and do not count toward the
    /// target. The survivor is the endpoint with more corner references,
    /// the first endpoint on ties; it inherits the discarded vertex's count.
    pub fn collapse(&self, mut index: EdgeCostIndex, faces: &[Face], target: CollapseTarget) -> CollapseOutcome {
        let unique_edges = index.edge_count();
        let requested = target.resolve(unique_edges);
        let mut references = index.reference_counts().to_vec();
        let vertex_count = references.len();
        let mut tracker = (self.face_floor > 0).then(|| FaceTracker::new(faces, vertex_count));

        let mut merge_map = MergeMap::new();
        let mut decisions = Vec::with_capacity(requested);

        while decisions.len() < requested {
            let Some((edge, _cost)) = index.pop() else {
                break;
            };
            let first = merge_map.resolve(edge.v1);
            let second = merge_map.resolve(edge.v2);
            if first == second {
                continue;
            }
            let (survivor, discarded) = if references[second] > references[first] {
                (second, first)
            } else {
                (first, second)
            };
            if merge_map.contains(discarded) {
                continue;
            }
            if let Some(tracker) = tracker.as_mut() {
                let dying = tracker.dying(discarded, survivor);
                if tracker.live.saturating_sub(dying) < self.face_floor {
                    continue;
                }
                tracker.merge(discarded, survivor);
            }
            if !merge_map.insert(discarded, survivor) {
                continue;
            }

            decisions.push(CollapseDecision {
                survivor,
                discarded,
                survivor_references: references[survivor],
                discarded_references: references[discarded],
            });
            references[survivor] += references[discarded];
        }

        let invalid_faces = faces
            .iter()
            .filter(|face| face.iter().any(|&v| v >= vertex_count))
            .count();
        let rewritten = rewrite_faces(faces, &merge_map, vertex_count);
        CollapseOutcome {
            degenerate_faces: faces.len() - invalid_faces - rewritten.len(),
            invalid_faces,
            faces: rewritten,
            merge_map,
            decisions,
            unique_edges,
            requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use meshtools_core::Point3f;

    fn make_buffer(points: &[[f32; 3]]) -> VertexBuffer {
        let mut buffer = VertexBuffer::new();
        for p in points {
            buffer.add_vertex(Point3f::new(p[0], p[1], p[2]));
        }
        buffer
    }

    fn make_single_triangle() -> (VertexBuffer, Vec<Face>) {
        (
            make_buffer(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]]),
            vec![[0, 1, 2]],
        )
    }

    fn make_cube() -> (VertexBuffer, Vec<Face>) {
        let buffer = make_buffer(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ]);
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [1, 2, 6],
            [1, 6, 5],
            [2, 3, 7],
            [2, 7, 6],
            [3, 0, 4],
            [3, 4, 7],
        ];
        (buffer, faces)
    }

    fn make_plane_grid(size: usize) -> (VertexBuffer, Vec<Face>) {
        let mut buffer = VertexBuffer::new();
        for y in 0..size {
            for x in 0..size {
                buffer.add_vertex(Point3f::new(x as f32, y as f32, 0.0));
            }
        }
        let mut faces = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let tl = y * size + x;
                let tr = tl + 1;
                let bl = (y + 1) * size + x;
                let br = bl + 1;
                faces.push([tl, bl, tr]);
                faces.push([tr, bl, br]);
            }
        }
        (buffer, faces)
    }

    // ---- Target tests ----

    #[test]
    fn test_target_resolution() {
        assert_eq!(CollapseTarget::default(), CollapseTarget::Fraction(0.8));
        assert_eq!(CollapseTarget::Count(10).resolve(4), 4);
        assert_eq!(CollapseTarget::Count(3).resolve(56), 3);
        assert_eq!(CollapseTarget::Fraction(0.8).resolve(56), 44);
        assert_eq!(CollapseTarget::Fraction(1.0).resolve(56), 56);
        assert_eq!(CollapseTarget::Fraction(1.5).resolve(10), 10);
        assert_eq!(CollapseTarget::Fraction(-0.5).resolve(10), 0);
        assert_eq!(CollapseTarget::Fraction(f32::NAN).resolve(10), 0);
        assert_eq!(CollapseTarget::Fraction(0.01).resolve(10), 0);
    }

    // ---- Merge map tests ----

    #[test]
    fn test_merge_map_transitive_closure() {
        let mut map = MergeMap::new();
        // A -> B, then B -> C: A must resolve straight to C
        assert!(map.insert(0, 1));
        assert!(map.insert(1, 2));
        assert_eq!(map.get(0), Some(2));
        assert_eq!(map.get(1), Some(2));
        assert_eq!(map.resolve(2), 2);
        assert!(map.iter().all(|(_, to)| !map.contains(to)));
    }

    #[test]
    fn test_merge_map_survivor_already_mapped() {
        let mut map = MergeMap::new();
        assert!(map.insert(1, 0));
        // Mapping onto a discarded vertex lands on its root
        assert!(map.insert(2, 1));
        assert_eq!(map.get(2), Some(0));
    }

    #[test]
    fn test_merge_map_rejects_second_mapping() {
        let mut map = MergeMap::new();
        assert!(map.insert(1, 0));
        assert!(!map.insert(1, 3));
        assert!(!map.insert(0, 1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(1), Some(0));
    }

    // ---- Collapse tests ----

    #[test]
    fn test_zero_target_is_identity() {
        let (mut buffer, faces) = make_cube();
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Count(0));
        assert_eq!(outcome.faces, faces);
        assert!(outcome.merge_map.is_empty());
        assert_eq!(outcome.collapsed(), 0);
    }

    #[test]
    fn test_no_edges_is_noop() {
        let mut buffer = make_buffer(&[[0.0, 0.0, 0.0]]);
        let outcome = EdgeCollapseEngine::new().run(&[], &mut buffer, CollapseTarget::Fraction(1.0));
        assert!(outcome.faces.is_empty());
        assert!(outcome.merge_map.is_empty());
        assert_eq!(outcome.unique_edges, 0);
    }

    #[test]
    fn test_cube_single_collapse() {
        let (mut buffer, faces) = make_cube();
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Count(1));

        assert_eq!(outcome.collapsed(), 1);
        assert_eq!(outcome.merge_map.len(), 1);
        let referenced = outcome.faces.iter().flatten().unique().count();
        assert!(referenced <= 7);
        assert!(outcome.faces.iter().all(|f| !is_degenerate(f)));
        assert!(outcome.faces.len() < faces.len());
    }

    #[test]
    fn test_single_triangle_collapses_to_one_vertex() {
        let (mut buffer, faces) = make_single_triangle();
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Count(3));

        assert!(outcome.faces.is_empty());
        assert_eq!(outcome.degenerate_faces, 1);
        assert_eq!(outcome.invalid_faces, 0);
        let roots = (0..3).map(|v| outcome.merge_map.resolve(v)).unique().count();
        assert_eq!(roots, 1);
    }

    #[test]
    fn test_target_above_edge_count_clamps() {
        let (mut buffer, faces) = make_cube();
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Count(1000));
        assert_eq!(outcome.requested, outcome.unique_edges);
        assert!(outcome.collapsed() <= outcome.unique_edges);
        assert!(outcome.faces.iter().all(|f| !is_degenerate(f)));
    }

    #[test]
    fn test_survivor_has_more_references() {
        let (mut buffer, faces) = make_plane_grid(6);
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Fraction(0.5));
        assert!(outcome.collapsed() > 0);
        for decision in &outcome.decisions {
            assert!(decision.survivor_references >= decision.discarded_references);
        }
    }

    #[test]
    fn test_merge_map_is_flat_after_collapse() {
        let (mut buffer, faces) = make_plane_grid(6);
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Fraction(0.8));
        for (_, to) in outcome.merge_map.iter() {
            assert!(!outcome.merge_map.contains(to));
        }
        for decision in &outcome.decisions {
            assert!(outcome.merge_map.contains(decision.discarded));
        }
    }

    #[test]
    fn test_each_vertex_discarded_once() {
        let (mut buffer, faces) = make_plane_grid(5);
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Fraction(1.0));
        let discarded: Vec<usize> = outcome.decisions.iter().map(|d| d.discarded).collect();
        assert_eq!(discarded.len(), discarded.iter().unique().count());
    }

    #[test]
    fn test_collapse_is_deterministic() {
        let (buffer, faces) = make_plane_grid(5);
        let run = || {
            let mut buffer = buffer.clone();
            EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Fraction(0.6))
        };
        let a = run();
        let b = run();
        assert_eq!(a.faces, b.faces);
        assert_eq!(a.decisions, b.decisions);
    }

    #[test]
    fn test_default_engine_can_empty_a_grid() {
        let (mut buffer, faces) = make_plane_grid(5);
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Fraction(1.0));
        assert!(outcome.faces.is_empty());
        assert_eq!(outcome.degenerate_faces, faces.len());
    }

    #[test]
    fn test_invalid_faces_counted_apart_from_degenerate() {
        let (mut buffer, mut faces) = make_single_triangle();
        faces.push([0, 1, 9]);

        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Count(0));
        assert_eq!(outcome.faces, vec![[0, 1, 2]]);
        assert_eq!(outcome.invalid_faces, 1);
        assert_eq!(outcome.degenerate_faces, 0);

        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Count(3));
        assert!(outcome.faces.is_empty());
        assert_eq!(outcome.invalid_faces, 1);
        assert_eq!(outcome.degenerate_faces, 1);
    }

    #[test]
    fn test_face_floor_keeps_triangles() {
        let (mut buffer, faces) = make_plane_grid(5);
        let outcome = EdgeCollapseEngine::with_face_floor(1).run(&faces, &mut buffer, CollapseTarget::Fraction(1.0));
        assert!(!outcome.faces.is_empty());
        assert!(outcome.faces.iter().all(|f| !is_degenerate(f)));

        let (mut buffer, faces) = make_single_triangle();
        let outcome = EdgeCollapseEngine::with_face_floor(1).run(&faces, &mut buffer, CollapseTarget::Count(3));
        assert_eq!(outcome.faces, faces);
        assert_eq!(outcome.collapsed(), 0);
    }

    #[test]
    fn test_duplicate_triangles_kept() {
        let mut buffer = make_buffer(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [5.0, 5.0, 0.0],
        ]);
        let faces = vec![[0, 1, 2], [0, 1, 2], [1, 3, 2]];
        let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Count(0));
        assert_eq!(outcome.faces.len(), 3);
    }

    #[test]
    fn test_rewrite_faces_preserves_order() {
        let mut map = MergeMap::new();
        map.insert(3, 1);
        let faces = vec![[0, 1, 2], [1, 3, 4], [2, 3, 4], [0, 2, 9]];
        let rewritten = rewrite_faces(&faces, &map, 5);
        assert_eq!(rewritten, vec![[0, 1, 2], [2, 1, 4]]);
    }
}
