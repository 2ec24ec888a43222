//! Unique edge extraction and cost ordering
//!
//! [`EdgeCostIndex::prepare`] derives per-vertex reference counts and the
//! set of unique undirected edges of a face list, and queues every edge by
//! its squared length. The index is single-shot: it is consumed by one
//! collapse pass and must be rebuilt whenever the face list changes.

use itertools::Itertools;
use log::warn;
use meshtools_core::{Face, VertexBuffer};
use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::collections::HashMap;

/// An undirected edge stored with `v1 < v2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub v1: usize,
    pub v2: usize,
}

impl Edge {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            v1: a.min(b),
            v2: a.max(b),
        }
    }
}

/// Queue priority of an edge: squared length, ties broken by discovery
/// order.
#[derive(Debug, Clone, Copy)]
pub struct EdgeCost {
    pub cost: f32,
    pub index: usize,
}

impl PartialEq for EdgeCost {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for EdgeCost {}

impl PartialOrd for EdgeCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCost {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-queue pops the greatest: cheaper and earlier edges rank higher
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Unique edges of a face list ordered by ascending squared length
#[derive(Debug, Clone)]
pub struct EdgeCostIndex {
    edges: Vec<Edge>,
    queue: PriorityQueue<usize, EdgeCost>,
    reference_counts: Vec<u32>,
}

impl EdgeCostIndex {
    /// Build reference counts, unique edges and the cost queue.
    ///
    /// Faces referencing vertices outside `buffer` are skipped.
    pub fn prepare(faces: &[Face], buffer: &mut VertexBuffer) -> Self {
        let vertex_count = buffer.vertex_count();
        let (valid, invalid): (Vec<&Face>, Vec<&Face>) = faces
            .iter()
            .partition(|face| face.iter().all(|&v| v < vertex_count));
        if !invalid.is_empty() {
            warn!(
                "skipping {} faces with indices outside {} vertices",
                invalid.len(),
                vertex_count
            );
        }

        let counts = buffer.setup_reference_counts();
        counts.fill(0);
        for &v in valid.iter().flat_map(|face| face.iter()) {
            counts[v] += 1;
        }
        let reference_counts = counts.clone();

        let mut seen: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut edges = Vec::new();
        for face in &valid {
            let Some((a, b, c)) = face.iter().copied().sorted_unstable().collect_tuple() else {
                continue;
            };
            for (v1, v2) in [(a, b), (b, c), (a, c)] {
                if v1 == v2 {
                    continue;
                }
                let seconds = seen.entry(v1).or_default();
                if !seconds.contains(&v2) {
                    seconds.push(v2);
                    edges.push(Edge { v1, v2 });
                }
            }
        }

        let positions = buffer.positions();
        let mut queue = PriorityQueue::with_capacity(edges.len());
        for (index, edge) in edges.iter().enumerate() {
            let cost = nalgebra::distance_squared(&positions[edge.v1], &positions[edge.v2]);
            queue.push(index, EdgeCost { cost, index });
        }

        Self {
            edges,
            queue,
            reference_counts,
        }
    }

    /// Unique edges in discovery order
    pub fn unique_edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Corner references per vertex of the prepared buffer
    pub fn reference_counts(&self) -> &[u32] {
        &self.reference_counts
    }

    /// Squared length of a still-queued edge
    pub fn cost(&self, edge_index: usize) -> Option<f32> {
        self.queue.get_priority(&edge_index).map(|p| p.cost)
    }

    /// Edges left in the queue
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Take the cheapest remaining edge
    pub fn pop(&mut self) -> Option<(Edge, f32)> {
        self.queue
            .pop()
            .map(|(index, priority)| (self.edges[index], priority.cost))
    }
}
