//! The candidate selection problem shared by the greedy and exact solvers.

use crate::candidate::Candidate;
use crate::conflict::ConflictGraph;
use lotplan_core::{SolutionStatus, VehicleMix};
use std::collections::BTreeMap;

/// Choose a conflict-free subset of candidates maximizing total weight,
/// subject to per-type count bounds.
#[derive(Debug, Clone, Copy)]
pub struct SelectionProblem<'a> {
    pub candidates: &'a [Candidate],
    pub conflicts: &'a ConflictGraph,
    pub mix: &'a VehicleMix,
}

impl<'a> SelectionProblem<'a> {
    pub fn new(candidates: &'a [Candidate], conflicts: &'a ConflictGraph, mix: &'a VehicleMix) -> Self {
        Self {
            candidates,
            conflicts,
            mix,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Total weight of a selection.
    pub fn objective(&self, chosen: &[usize]) -> f64 {
        chosen.iter().map(|&i| self.candidates[i].weight).sum()
    }

    /// Selected count per vehicle type.
    pub fn counts(&self, chosen: &[usize]) -> BTreeMap<&'a str, usize> {
        let mut counts = BTreeMap::new();
        for &i in chosen {
            *counts.entry(self.candidates[i].vehicle_type.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Upper bound for a type; unbounded when the mix does not name it.
    pub fn max_for(&self, vehicle_type: &str) -> usize {
        self.mix.get(vehicle_type).map_or(usize::MAX, |b| b.max_count())
    }

    pub fn min_for(&self, vehicle_type: &str) -> usize {
        self.mix.get(vehicle_type).map_or(0, |b| b.min_count())
    }

    /// Describes every way `chosen` violates the problem. Empty when valid.
    pub fn violations(&self, chosen: &[usize]) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = vec![false; self.candidates.len()];

        for &i in chosen {
            if i >= self.candidates.len() {
                problems.push(format!("Selected candidate {} does not exist", i));
                continue;
            }
            if seen[i] {
                problems.push(format!("Candidate {} selected twice", i));
            }
            seen[i] = true;
        }

        for &i in chosen.iter().filter(|&&i| i < seen.len()) {
            if let Some(&j) = self
                .conflicts
                .conflicts(i)
                .iter()
                .find(|&&j| (j as usize) > i && seen[j as usize])
            {
                problems.push(format!("Candidates {} and {} violate minimum spacing", i, j));
            }
        }

        let valid: Vec<usize> = chosen.iter().copied().filter(|&i| i < seen.len()).collect();
        let counts = self.counts(&valid);
        for (vehicle_type, bound) in self.mix.iter() {
            let n = counts.get(vehicle_type).copied().unwrap_or(0);
            if n < bound.min_count() {
                problems.push(format!(
                    "Vehicle mix minimum for {} not met: placed {} of {}",
                    vehicle_type,
                    n,
                    bound.min_count()
                ));
            }
            if n > bound.max_count() {
                problems.push(format!(
                    "Vehicle mix maximum for {} exceeded: placed {} of {}",
                    vehicle_type,
                    n,
                    bound.max_count()
                ));
            }
        }
        problems
    }
}

/// A solver's answer to a [`SelectionProblem`].
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Chosen candidate indices, ascending.
    pub chosen: Vec<usize>,
    pub status: SolutionStatus,
    pub objective: f64,
    pub warnings: Vec<String>,
}

impl Selection {
    pub fn new(mut chosen: Vec<usize>, status: SolutionStatus, problem: &SelectionProblem<'_>) -> Self {
        chosen.sort_unstable();
        let objective = problem.objective(&chosen);
        Self {
            chosen,
            status,
            objective,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    /// True if the selection can be returned as a layout.
    pub fn is_usable(&self) -> bool {
        matches!(
            self.status,
            SolutionStatus::Optimal | SolutionStatus::Feasible | SolutionStatus::Timeout
        )
    }
}

/// A strategy for solving a [`SelectionProblem`].
pub trait SelectionSolver {
    /// Short name recorded in run statistics.
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &SelectionProblem<'_>) -> Selection;
}
