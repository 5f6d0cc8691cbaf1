//! MILP-based exact candidate selection.
//!
//! Selection is formulated as a 0-1 program and solved with HiGHS via the
//! `good_lp` crate:
//!
//! - One binary variable per candidate
//! - `x_i + x_j <= 1` for every conflicting pair
//! - Per-type count bounds from the vehicle mix
//! - Objective: maximize total candidate weight
//!
//! When a warm-start objective is supplied (normally the greedy result) it is
//! added as a lower bound on the objective, which lets the solver prune every
//! branch that cannot beat the greedy layout.
//!
//! # Example
//!
//! ```ignore
//! use lotplan_planner::milp_solver::run_milp_selection;
//!
//! let outcome = run_milp_selection(&problem, &exact_config, 10_000, Some(greedy.objective));
//! ```

use crate::selection::{Selection, SelectionProblem, SelectionSolver};
use lotplan_core::exact::{ExactConfig, ExactResult, SolutionStatus};

#[cfg(feature = "milp")]
use good_lp::{
    constraint, solvers::highs::highs, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};

#[cfg(feature = "milp")]
use std::time::Instant;

/// Fraction of the time limit after which a returned solution is treated as
/// a timeout rather than a proven optimum. good_lp's HiGHS backend returns
/// only variable values, not the model status, so elapsed time is the only
/// signal that the limit cut the search short.
#[cfg(feature = "milp")]
const TIMEOUT_FRACTION: f64 = 0.98;

/// Result of an exact solve attempt.
#[derive(Debug, Clone)]
pub struct MilpOutcome {
    /// Chosen candidate indices, if the solver produced a solution.
    pub chosen: Option<Vec<usize>>,
    pub result: ExactResult,
}

impl MilpOutcome {
    fn without_solution(result: ExactResult) -> Self {
        Self { chosen: None, result }
    }
}

/// Lifts any [`SelectionSolver`] result into an outcome the orchestrator can
/// compare against greedy. The objective doubles as the bound since other
/// solvers report none.
impl From<Selection> for MilpOutcome {
    fn from(selection: Selection) -> Self {
        let objective = selection.objective;
        let result = match selection.status {
            SolutionStatus::Optimal => ExactResult::optimal(objective),
            SolutionStatus::Feasible => ExactResult::feasible(objective, objective),
            SolutionStatus::Timeout => ExactResult::timeout(Some(objective), objective),
            SolutionStatus::Infeasible => ExactResult::infeasible(),
            _ => ExactResult::error(selection.warnings.join("; ")),
        };
        Self {
            chosen: selection.is_usable().then_some(selection.chosen),
            result,
        }
    }
}

/// Solves `problem` exactly within `time_limit_ms`.
///
/// `warm_start` is a known achievable objective; solutions below it are cut.
#[cfg(feature = "milp")]
pub fn run_milp_selection(
    problem: &SelectionProblem<'_>,
    config: &ExactConfig,
    time_limit_ms: u64,
    warm_start: Option<f64>,
) -> MilpOutcome {
    let start = Instant::now();
    let n = problem.len();

    if !config.is_within_limit(n) {
        log::warn!(
            "Candidate count {} exceeds exact limit {}, skipping MILP",
            n,
            config.max_candidates
        );
        return MilpOutcome::without_solution(ExactResult::error(format!(
            "candidate count {} exceeds exact limit {}",
            n, config.max_candidates
        )));
    }
    if n == 0 {
        return MilpOutcome {
            chosen: Some(Vec::new()),
            result: ExactResult::optimal(0.0),
        };
    }

    let mut vars = ProblemVariables::new();
    let x: Vec<Variable> = (0..n)
        .map(|i| vars.add(variable().binary().name(format!("x_{}", i))))
        .collect();

    let objective: Expression = problem
        .candidates
        .iter()
        .zip(&x)
        .map(|(c, &v)| c.weight * v)
        .fold(Expression::from(0.0), |acc, term| acc + term);

    let time_limit_secs = time_limit_ms as f64 / 1000.0;
    let mut model = vars
        .maximise(objective.clone())
        .using(highs)
        .set_verbose(config.verbose)
        .set_option("time_limit", time_limit_secs)
        .set_option("mip_rel_gap", config.gap_tolerance)
        .set_option("threads", config.threads as i32);

    // Pairwise exclusion
    let mut pair_count = 0usize;
    for (i, j) in problem.conflicts.pairs() {
        model = model.with(constraint!(x[i] + x[j] <= 1.0));
        pair_count += 1;
    }

    // Vehicle mix bounds
    for (vehicle_type, bound) in problem.mix.iter() {
        let members: Vec<usize> = (0..n)
            .filter(|&i| problem.candidates[i].vehicle_type == vehicle_type)
            .collect();
        let count: Expression = members
            .iter()
            .map(|&i| x[i])
            .fold(Expression::from(0.0), |acc, v| acc + v);
        let min = bound.min_count() as f64;
        let max = bound.max_count();

        if min > 0.0 {
            model = model.with(constraint!(count.clone() >= min));
        }
        if max < members.len() {
            model = model.with(constraint!(count <= max as f64));
        }
    }

    if let Some(cutoff) = warm_start.filter(|_| config.use_warm_start) {
        let slack = 1e-6 * cutoff.abs().max(1.0);
        model = model.with(constraint!(objective >= cutoff - slack));
    }

    log::info!(
        "Solving MILP with {} candidates, {} exclusion pairs, limit {:.1}s",
        n,
        pair_count,
        time_limit_secs
    );

    let upper_bound: f64 = problem.candidates.iter().map(|c| c.weight.max(0.0)).sum();
    let solved = model.solve();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    let timed_out = elapsed_ms as f64 >= time_limit_ms as f64 * TIMEOUT_FRACTION;

    match solved {
        Ok(solution) => {
            let chosen: Vec<usize> = (0..n).filter(|&i| solution.value(x[i]) > 0.5).collect();
            let value = problem.objective(&chosen);
            let result = if timed_out {
                log::warn!("MILP hit the time limit after {} ms", elapsed_ms);
                ExactResult::timeout(Some(value), upper_bound)
            } else if config.gap_tolerance > 0.0 {
                ExactResult::feasible(value, upper_bound)
            } else {
                log::info!("MILP found optimal solution ({:.2})", value);
                ExactResult::optimal(value)
            };
            MilpOutcome {
                chosen: Some(chosen),
                result: result.with_solve_time(elapsed_ms),
            }
        }
        Err(ResolutionError::Infeasible) => {
            log::info!("MILP proved the selection problem infeasible");
            MilpOutcome::without_solution(ExactResult::infeasible().with_solve_time(elapsed_ms))
        }
        Err(e) if timed_out => {
            log::warn!("MILP timed out without a solution: {}", e);
            MilpOutcome::without_solution(
                ExactResult::timeout(None, upper_bound).with_solve_time(elapsed_ms),
            )
        }
        Err(e) => {
            log::warn!("MILP solver failed: {}", e);
            MilpOutcome::without_solution(ExactResult::error(e.to_string()).with_solve_time(elapsed_ms))
        }
    }
}

/// Stub when the `milp` feature is disabled.
#[cfg(not(feature = "milp"))]
pub fn run_milp_selection(
    problem: &SelectionProblem<'_>,
    _config: &ExactConfig,
    _time_limit_ms: u64,
    _warm_start: Option<f64>,
) -> MilpOutcome {
    log::warn!(
        "MILP solver not available (compile with 'milp' feature), {} candidates left to greedy",
        problem.len()
    );
    MilpOutcome::without_solution(ExactResult::error(
        "MILP solver not available (compile with 'milp' feature)",
    ))
}

/// Returns true if the exact solver is compiled in.
pub fn is_milp_available() -> bool {
    cfg!(feature = "milp")
}

/// [`SelectionSolver`] adapter over [`run_milp_selection`].
#[derive(Debug, Clone)]
pub struct MilpSolver {
    config: ExactConfig,
    warm_start: Option<f64>,
}

impl MilpSolver {
    pub fn new(config: ExactConfig) -> Self {
        Self {
            config,
            warm_start: None,
        }
    }

    pub fn with_warm_start(mut self, objective: f64) -> Self {
        self.warm_start = Some(objective);
        self
    }
}

impl SelectionSolver for MilpSolver {
    fn name(&self) -> &'static str {
        "milp"
    }

    fn solve(&self, problem: &SelectionProblem<'_>) -> Selection {
        let outcome = run_milp_selection(problem, &self.config, self.config.time_limit_ms, self.warm_start);
        match outcome.chosen {
            Some(chosen) => Selection::new(chosen, outcome.result.status, problem),
            None => {
                let status = match outcome.result.status {
                    SolutionStatus::Infeasible => SolutionStatus::Infeasible,
                    SolutionStatus::Timeout => SolutionStatus::Timeout,
                    _ => SolutionStatus::Error,
                };
                Selection {
                    status,
                    ..Selection::default()
                }
                .with_warning(outcome.result.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use crate::conflict::ConflictGraph;
    use lotplan_core::geometry::OrientedRect;
    use lotplan_core::VehicleMix;

    fn candidate(id: u32, vehicle_type: &str, x: f64, weight: f64) -> Candidate {
        Candidate {
            id,
            zone: 0,
            vehicle_type: vehicle_type.into(),
            footprint: OrientedRect::new((x, 0.0), 3.0, 3.0, 0.0),
            accessible: true,
            revenue: weight,
            weight,
        }
    }

    #[test]
    fn test_is_milp_available() {
        assert_eq!(is_milp_available(), cfg!(feature = "milp"));
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_milp_beats_greedy_on_chain() {
        // Chain a - b - c: greedy takes the heavy middle, the optimum takes
        // both ends.
        let cands = vec![
            candidate(0, "van", 0.0, 3.0),
            candidate(1, "van", 3.2, 4.0),
            candidate(2, "van", 6.4, 3.0),
        ];
        let graph = ConflictGraph::build(&cands, 1.0);
        assert!(graph.are_conflicting(0, 1) && graph.are_conflicting(1, 2));
        assert!(!graph.are_conflicting(0, 2));

        let mix = VehicleMix::new();
        let problem = SelectionProblem::new(&cands, &graph, &mix);
        let outcome = run_milp_selection(&problem, &ExactConfig::default(), 10_000, Some(4.0));

        assert_eq!(outcome.result.status, SolutionStatus::Optimal);
        assert_eq!(outcome.chosen, Some(vec![0, 2]));
        assert!((outcome.result.objective_value - 6.0).abs() < 1e-9);
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_milp_infeasible_mix() {
        let cands = vec![candidate(0, "van", 0.0, 1.0), candidate(1, "van", 1.0, 1.0)];
        let graph = ConflictGraph::build(&cands, 1.0);
        let mix = VehicleMix::new().with_bound("van", 2, 2);
        let problem = SelectionProblem::new(&cands, &graph, &mix);

        let outcome = run_milp_selection(&problem, &ExactConfig::default(), 10_000, None);
        assert_eq!(outcome.result.status, SolutionStatus::Infeasible);
        assert!(outcome.chosen.is_none());
    }

    #[test]
    #[cfg(not(feature = "milp"))]
    fn test_milp_stub() {
        let cands = vec![candidate(0, "van", 0.0, 1.0)];
        let graph = ConflictGraph::build(&cands, 1.0);
        let mix = VehicleMix::new();
        let problem = SelectionProblem::new(&cands, &graph, &mix);

        let outcome = run_milp_selection(&problem, &ExactConfig::default(), 1_000, None);
        assert!(outcome.chosen.is_none());
        assert_eq!(outcome.result.status, SolutionStatus::Error);

        let selection = MilpSolver::new(ExactConfig::default()).solve(&problem);
        assert_eq!(selection.status, SolutionStatus::Error);
        assert!(!selection.is_usable());
    }
}
