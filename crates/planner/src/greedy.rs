//! Greedy candidate selection with a mix repair pass.
//!
//! Candidates are taken in descending weight order (ties in candidate order),
//! skipping any that conflict with an accepted one or would exceed a type
//! maximum. If a type minimum is unmet afterwards, the repair pass admits
//! candidates of that type by evicting their conflicting neighbours, as long
//! as no evicted type drops below its own minimum. Remaining room is then
//! refilled in the original order.

use crate::candidate::Candidate;
use crate::conflict::CandidateIndex;
use crate::geometry::overlap;
use crate::selection::{Selection, SelectionProblem, SelectionSolver};
use lotplan_core::{SolutionStatus, VehicleMix};
use std::collections::BTreeMap;

/// Greedy selection solver. Always terminates in `O(n log n + E)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl GreedySolver {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionSolver for GreedySolver {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&self, problem: &SelectionProblem<'_>) -> Selection {
        let mut state = GreedyState::new(problem);

        let order = priority_order(problem);
        state.fill(&order);

        let mut warnings = Vec::new();
        for (vehicle_type, bound) in problem.mix.iter() {
            let min = bound.min_count();
            if state.count(vehicle_type) < min {
                log::debug!(
                    "Greedy placed {} {} spaces, minimum {}; repairing",
                    state.count(vehicle_type),
                    vehicle_type,
                    min
                );
                state.repair(vehicle_type, min, &order);
            }
        }
        state.fill(&order);

        for (vehicle_type, bound) in problem.mix.iter() {
            let placed = state.count(vehicle_type);
            if placed < bound.min_count() {
                warnings.push(format!(
                    "Vehicle mix minimum for {} not met: placed {} of {}",
                    vehicle_type,
                    placed,
                    bound.min_count()
                ));
            }
        }

        let status = if warnings.is_empty() {
            SolutionStatus::Feasible
        } else {
            SolutionStatus::Infeasible
        };
        let chosen = state.chosen();
        log::debug!("Greedy selected {} of {} candidates", chosen.len(), problem.len());

        let mut selection = Selection::new(chosen, status, problem);
        selection.warnings = warnings;
        selection
    }
}

/// Greedy selection without a conflict graph, used when the graph could not
/// be built in time.
///
/// Accepted footprints go into an R*-tree and each new candidate is tested
/// against them only, so the cost follows the layout size rather than the
/// candidate density. Mix maximums are honoured; unmet minimums make the
/// selection infeasible, there is no repair pass.
pub fn first_fit(candidates: &[Candidate], mix: &VehicleMix, min_gap: f64) -> Selection {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| candidates[b].weight.total_cmp(&candidates[a].weight));

    let mut index = CandidateIndex::empty(min_gap);
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut chosen = Vec::new();
    for i in order {
        let c = &candidates[i];
        let placed = counts.get(c.vehicle_type.as_str()).copied().unwrap_or(0);
        if placed >= mix.get(&c.vehicle_type).map_or(usize::MAX, |b| b.max_count()) {
            continue;
        }
        let blocked = index
            .query(c.footprint.aabb())
            .into_iter()
            .any(|j| overlap(&c.footprint, &candidates[j].footprint, min_gap));
        if blocked {
            continue;
        }
        index.insert(i, c);
        *counts.entry(c.vehicle_type.as_str()).or_insert(0) += 1;
        chosen.push(i);
    }
    chosen.sort_unstable();

    let warnings: Vec<String> = mix
        .iter()
        .filter_map(|(vehicle_type, bound)| {
            let placed = counts.get(vehicle_type).copied().unwrap_or(0);
            (placed < bound.min_count()).then(|| {
                format!(
                    "Vehicle mix minimum for {} not met: placed {} of {}",
                    vehicle_type,
                    placed,
                    bound.min_count()
                )
            })
        })
        .collect();
    let status = if warnings.is_empty() {
        SolutionStatus::Feasible
    } else {
        SolutionStatus::Infeasible
    };
    log::debug!("First-fit selected {} of {} candidates", chosen.len(), candidates.len());

    Selection {
        objective: chosen.iter().map(|&i| candidates[i].weight).sum(),
        chosen,
        status,
        warnings,
    }
}

/// Candidate indices by descending weight. The sort is stable so equal
/// weights keep candidate order.
fn priority_order(problem: &SelectionProblem<'_>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..problem.len()).collect();
    order.sort_by(|&a, &b| {
        problem.candidates[b]
            .weight
            .total_cmp(&problem.candidates[a].weight)
    });
    order
}

struct GreedyState<'p, 'a> {
    problem: &'p SelectionProblem<'a>,
    selected: Vec<bool>,
    /// Number of selected neighbours per candidate.
    blocked: Vec<u32>,
    counts: BTreeMap<&'a str, usize>,
}

impl<'p, 'a> GreedyState<'p, 'a> {
    fn new(problem: &'p SelectionProblem<'a>) -> Self {
        Self {
            problem,
            selected: vec![false; problem.len()],
            blocked: vec![0; problem.len()],
            counts: BTreeMap::new(),
        }
    }

    fn type_of(&self, i: usize) -> &'a str {
        self.problem.candidates[i].vehicle_type.as_str()
    }

    fn count(&self, vehicle_type: &str) -> usize {
        self.counts.get(vehicle_type).copied().unwrap_or(0)
    }

    fn admissible(&self, i: usize) -> bool {
        !self.selected[i]
            && self.blocked[i] == 0
            && self.count(self.type_of(i)) < self.problem.max_for(self.type_of(i))
    }

    fn select(&mut self, i: usize) {
        let vehicle_type = self.type_of(i);
        self.selected[i] = true;
        *self.counts.entry(vehicle_type).or_insert(0) += 1;
        for &j in self.problem.conflicts.conflicts(i) {
            self.blocked[j as usize] += 1;
        }
    }

    fn evict(&mut self, i: usize) {
        let vehicle_type = self.type_of(i);
        self.selected[i] = false;
        if let Some(n) = self.counts.get_mut(vehicle_type) {
            *n -= 1;
        }
        for &j in self.problem.conflicts.conflicts(i) {
            self.blocked[j as usize] -= 1;
        }
    }

    fn fill(&mut self, order: &[usize]) {
        for &i in order {
            if self.admissible(i) {
                self.select(i);
            }
        }
    }

    /// Admits candidates of `vehicle_type` until `min` is reached, evicting
    /// conflicting neighbours of other types that can spare them.
    fn repair(&mut self, vehicle_type: &str, min: usize, order: &[usize]) {
        for &i in order {
            if self.count(vehicle_type) >= min {
                return;
            }
            if self.selected[i] || self.type_of(i) != vehicle_type {
                continue;
            }

            let victims: Vec<usize> = self
                .problem
                .conflicts
                .conflicts(i)
                .iter()
                .map(|&j| j as usize)
                .filter(|&j| self.selected[j])
                .collect();
            if victims.iter().any(|&j| self.type_of(j) == vehicle_type) {
                continue;
            }

            let mut losses: BTreeMap<&'a str, usize> = BTreeMap::new();
            for &j in &victims {
                *losses.entry(self.type_of(j)).or_insert(0) += 1;
            }
            let spare = losses
                .iter()
                .all(|(t, &lost)| self.count(t) - lost >= self.problem.min_for(t));
            if !spare {
                continue;
            }

            for j in victims {
                self.evict(j);
            }
            self.select(i);
        }
    }

    fn chosen(&self) -> Vec<usize> {
        (0..self.selected.len()).filter(|&i| self.selected[i]).collect()
    }
}
