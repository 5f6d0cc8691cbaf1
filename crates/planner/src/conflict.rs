//! Pairwise exclusion between candidates.
//!
//! Candidate footprints go into an R*-tree keyed by their axis-aligned bounds
//! grown by half the minimum spacing. Only pairs whose grown bounds intersect
//! are passed to the exact [`overlap`] test, which keeps construction close to
//! linear in the number of candidates for realistic lots.

use crate::candidate::Candidate;
use crate::geometry::overlap;
use lotplan_core::geometry::AABB2D;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use std::time::Instant;

/// An entry in the candidate spatial index.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    /// Index into the candidate list.
    pub index: usize,
    /// Grown bounds (min_x, min_y, max_x, max_y)
    pub aabb: [f64; 4],
}

impl CandidateEntry {
    pub fn new(index: usize, aabb: AABB2D) -> Self {
        Self {
            index,
            aabb: [aabb.min_x, aabb.min_y, aabb.max_x, aabb.max_y],
        }
    }
}

impl RTreeObject for CandidateEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.aabb[0], self.aabb[1]], [self.aabb[2], self.aabb[3]])
    }
}

/// R*-tree over candidate footprints.
#[derive(Debug)]
pub struct CandidateIndex {
    tree: RTree<CandidateEntry>,
    margin: f64,
}

impl CandidateIndex {
    /// Bulk-loads the index with each footprint grown by `min_gap / 2`.
    pub fn build(candidates: &[Candidate], min_gap: f64) -> Self {
        let margin = min_gap.max(0.0) / 2.0;
        let entries = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| CandidateEntry::new(i, c.footprint.aabb().expand(margin)))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            margin,
        }
    }

    /// An index to be filled one candidate at a time.
    pub fn empty(min_gap: f64) -> Self {
        Self {
            tree: RTree::new(),
            margin: min_gap.max(0.0) / 2.0,
        }
    }

    pub fn insert(&mut self, index: usize, candidate: &Candidate) {
        self.tree
            .insert(CandidateEntry::new(index, candidate.footprint.aabb().expand(self.margin)));
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indices of candidates whose grown bounds intersect `aabb` grown by the
    /// same margin.
    pub fn query(&self, aabb: AABB2D) -> Vec<usize> {
        let grown = aabb.expand(self.margin);
        let envelope = AABB::from_corners([grown.min_x, grown.min_y], [grown.max_x, grown.max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.index)
            .collect()
    }
}

/// Adjacency lists of the candidate conflict graph.
///
/// Candidate `i` conflicts with `j` when their footprints overlap or are
/// closer than the minimum spacing. Lists are sorted and symmetric.
#[derive(Debug, Clone, Default)]
pub struct ConflictGraph {
    adjacency: Vec<Vec<u32>>,
    edge_count: usize,
}

impl ConflictGraph {
    pub fn build(candidates: &[Candidate], min_gap: f64) -> Self {
        Self::build_inner(candidates, min_gap, None).unwrap_or_default()
    }

    /// Like [`build`](Self::build), but gives up once `deadline` passes.
    pub fn build_until(candidates: &[Candidate], min_gap: f64, deadline: Instant) -> Option<Self> {
        let graph = Self::build_inner(candidates, min_gap, Some(deadline));
        if graph.is_none() {
            log::warn!(
                "Conflict graph over {} candidates abandoned at the deadline",
                candidates.len()
            );
        }
        graph
    }

    fn build_inner(candidates: &[Candidate], min_gap: f64, deadline: Option<Instant>) -> Option<Self> {
        let index = CandidateIndex::build(candidates, min_gap);

        let adjacency: Vec<Vec<u32>> = candidates
            .par_iter()
            .enumerate()
            .map(|(i, c)| {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return None;
                }
                let mut neighbors: Vec<u32> = index
                    .query(c.footprint.aabb())
                    .into_iter()
                    .filter(|&j| j != i && overlap(&c.footprint, &candidates[j].footprint, min_gap))
                    .map(|j| j as u32)
                    .collect();
                neighbors.sort_unstable();
                Some(neighbors)
            })
            .collect::<Option<Vec<_>>>()?;

        let edge_count = adjacency.iter().map(Vec::len).sum::<usize>() / 2;
        log::debug!(
            "Conflict graph: {} candidates, {} conflicting pairs",
            candidates.len(),
            edge_count
        );
        Some(Self { adjacency, edge_count })
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of conflicting pairs.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn conflicts(&self, i: usize) -> &[u32] {
        &self.adjacency[i]
    }

    pub fn degree(&self, i: usize) -> usize {
        self.adjacency[i].len()
    }

    pub fn are_conflicting(&self, i: usize, j: usize) -> bool {
        self.adjacency[i].binary_search(&(j as u32)).is_ok()
    }

    /// Each conflicting pair once, with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(i, adj)| {
            adj.iter()
                .map(|&j| j as usize)
                .filter(move |&j| j > i)
                .map(move |j| (i, j))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotplan_core::geometry::OrientedRect;

    fn candidate(id: u32, x: f64, y: f64, rotation: f64) -> Candidate {
        Candidate {
            id,
            zone: 0,
            vehicle_type: "van".into(),
            footprint: OrientedRect::new((x, y), 7.5, 3.0, rotation),
            accessible: true,
            revenue: 1.0,
            weight: 1.0,
        }
    }

    #[test]
    fn test_index_query() {
        let cands = vec![candidate(0, 0.0, 0.0, 0.0), candidate(1, 50.0, 0.0, 0.0)];
        let index = CandidateIndex::build(&cands, 1.0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.query(cands[0].footprint.aabb()), vec![0]);
    }

    #[test]
    fn test_conflicts_respect_min_gap() {
        // Side by side: widths 3.0, centers 3.5 apart leaves a 0.5 gap.
        // Centers 4.0 apart leave exactly 1.0.
        let cands = vec![
            candidate(0, 0.0, 0.0, 0.0),
            candidate(1, 0.0, 3.5, 0.0),
            candidate(2, 0.0, 7.5, 0.0),
            candidate(3, 40.0, 0.0, 90.0),
        ];
        let graph = ConflictGraph::build(&cands, 1.0);

        assert!(graph.are_conflicting(0, 1));
        assert!(graph.are_conflicting(1, 0));
        assert!(!graph.are_conflicting(1, 2));
        assert!(!graph.are_conflicting(0, 2));
        assert_eq!(graph.degree(3), 0);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.pairs().collect::<Vec<_>>(), vec![(0, 1)]);
    }

    #[test]
    fn test_build_until_gives_up_after_deadline() {
        let cands: Vec<Candidate> = (0..20).map(|i| candidate(i, i as f64 * 2.0, 0.0, 0.0)).collect();
        assert!(ConflictGraph::build_until(&cands, 1.0, Instant::now()).is_none());

        let later = Instant::now() + std::time::Duration::from_secs(60);
        let graph = ConflictGraph::build_until(&cands, 1.0, later).unwrap();
        assert_eq!(graph.edge_count(), ConflictGraph::build(&cands, 1.0).edge_count());
    }

    #[test]
    fn test_incremental_index() {
        let cands = vec![candidate(0, 0.0, 0.0, 0.0), candidate(1, 0.0, 3.5, 0.0)];
        let mut index = CandidateIndex::empty(1.0);
        assert!(index.is_empty());
        index.insert(0, &cands[0]);
        assert_eq!(index.query(cands[1].footprint.aabb()), vec![0]);
    }

    #[test]
    fn test_crossed_orientations_conflict() {
        let cands = vec![candidate(0, 0.0, 0.0, 0.0), candidate(1, 0.0, 0.0, 90.0)];
        let graph = ConflictGraph::build(&cands, 1.0);
        assert_eq!(graph.conflicts(0), &[1]);
    }
}
