//! Nearest-neighbor graph construction
//!
//! The neighbor relation is computed once per population build and never
//! changes afterwards. Three modes are supported: topological (k closest),
//! metric (all within a radius) and hybrid (within the radius, capped at k).
//! For every neighbor edge the inverse "mimicking" edge is registered on the
//! other endpoint, so each individual also knows who is watching it.
//!
//! Individuals that end up with zero neighbors can never participate in a
//! movement and are dropped before ids are assigned; the returned graph is
//! dense over the surviving set.

use ordered_float::OrderedFloat;

use crate::core::types::{IndividualId, NeighborMode, Vec2};

/// One directed neighbor edge, annotated with the Euclidean distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: IndividualId,
    pub distance: f64,
}

/// Neighbor and mimicking relations over a pruned, densely-indexed population
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    /// Per-individual neighbor list, sorted by ascending distance.
    ///
    /// Ties among equal distances keep input order; nothing downstream may
    /// rely on the tie order.
    pub neighbors: Vec<Vec<Neighbor>>,
    /// Inverse relation: `mimics[i]` holds every j with i in `neighbors[j]`,
    /// in arena order
    pub mimics: Vec<Vec<IndividualId>>,
    /// Original input index of each surviving individual
    pub kept: Vec<usize>,
}

impl NeighborGraph {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Build the fixed neighbor graph for a set of candidate positions
pub fn build_neighbor_graph(
    positions: &[Vec2],
    mode: NeighborMode,
    neighbor_count: usize,
    neighbor_radius: f64,
) -> NeighborGraph {
    let n = positions.len();

    // Raw per-candidate neighbor lists, keyed by input index
    let mut raw: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut candidates: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, positions[i].distance(&positions[j])))
            .collect();
        if matches!(mode, NeighborMode::Metric | NeighborMode::Hybrid) {
            candidates.retain(|&(_, d)| d <= neighbor_radius);
        }
        candidates.sort_by_key(|&(_, d)| OrderedFloat(d));
        if matches!(mode, NeighborMode::Topological | NeighborMode::Hybrid) {
            candidates.truncate(neighbor_count);
        }
        raw.push(candidates);
    }

    // Prune individuals with no neighbors and assign dense ids over the rest
    let kept: Vec<usize> = (0..n).filter(|&i| !raw[i].is_empty()).collect();
    let mut remap: Vec<Option<IndividualId>> = vec![None; n];
    for (new, &old) in kept.iter().enumerate() {
        remap[old] = Some(IndividualId(new as u32));
    }

    let mut neighbors: Vec<Vec<Neighbor>> = Vec::with_capacity(kept.len());
    for &old in &kept {
        let list: Vec<Neighbor> = raw[old]
            .iter()
            .filter_map(|&(j, distance)| remap[j].map(|id| Neighbor { id, distance }))
            .collect();
        neighbors.push(list);
    }

    let mut mimics: Vec<Vec<IndividualId>> = vec![Vec::new(); kept.len()];
    for (i, list) in neighbors.iter().enumerate() {
        for neighbor in list {
            mimics[neighbor.id.index()].push(IndividualId(i as u32));
        }
    }

    NeighborGraph {
        neighbors,
        mimics,
        kept,
    }
}
