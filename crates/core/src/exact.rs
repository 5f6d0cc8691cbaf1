//! Exact solver configuration and result types.
//!
//! The exact stage formulates candidate selection as a 0-1 program and hands it
//! to a MILP backend. Runs are bounded by a wall-clock limit and a candidate
//! count ceiling; past either the orchestrator keeps the greedy layout.
//!
//! # Example
//!
//! ```
//! use lotplan_core::exact::ExactConfig;
//!
//! let config = ExactConfig::default()
//!     .with_time_limit_ms(10_000)
//!     .with_max_candidates(5_000)
//!     .with_threads(2);
//! assert!(config.is_within_limit(1_200));
//! ```

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of one selection solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolutionStatus {
    /// Best selection, proven.
    Optimal,
    /// A valid selection without an optimality proof.
    Feasible,
    /// No selection satisfies the conflict and mix constraints.
    Infeasible,
    /// The time limit cut the search short.
    Timeout,
    Error,
    #[default]
    Unknown,
}

impl SolutionStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Feasible => "feasible",
            Self::Infeasible => "infeasible",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the exact (MILP) stage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExactConfig {
    /// Run the exact stage at all. When false the greedy layout is returned.
    pub enabled: bool,

    /// Upper bound on solver time in milliseconds. The orchestrator further
    /// caps this by the time remaining in the run.
    pub time_limit_ms: u64,

    /// Relative MIP gap tolerance (0.0 = prove optimality).
    pub gap_tolerance: f64,

    /// Candidate count above which exact solving is skipped.
    pub max_candidates: usize,

    /// Solver worker threads. Kept small for stability on shared hosts.
    pub threads: u32,

    /// Feed the greedy objective to the solver as a lower bound.
    pub use_warm_start: bool,

    /// Print solver output.
    pub verbose: bool,
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time_limit_ms: 30_000,
            gap_tolerance: 0.0,
            max_candidates: 20_000,
            threads: 2,
            use_warm_start: true,
            verbose: false,
        }
    }
}

impl ExactConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that skips the exact stage.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_gap_tolerance(mut self, gap: f64) -> Self {
        self.gap_tolerance = gap.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max.max(1);
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_warm_start(mut self, enable: bool) -> Self {
        self.use_warm_start = enable;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check if the candidate count is within the exact solving limit.
    pub fn is_within_limit(&self, num_candidates: usize) -> bool {
        num_candidates <= self.max_candidates
    }
}

/// What the exact stage reports back to the orchestrator.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExactResult {
    pub status: SolutionStatus,
    /// Total weight of the returned selection, `-inf` when there is none.
    pub objective_value: f64,
    /// Upper bound on the total weight.
    pub best_bound: f64,
    /// `(bound - objective) / bound`
    pub gap: f64,
    pub solve_time_ms: u64,
    pub message: String,
}

impl ExactResult {
    fn bounded(status: SolutionStatus, objective: f64, bound: f64, message: String) -> Self {
        Self {
            status,
            objective_value: objective,
            best_bound: bound,
            gap: relative_gap(objective, bound),
            solve_time_ms: 0,
            message,
        }
    }

    fn empty(status: SolutionStatus, bound: f64, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: f64::NEG_INFINITY,
            best_bound: bound,
            gap: 0.0,
            solve_time_ms: 0,
            message: message.into(),
        }
    }

    pub fn optimal(objective: f64) -> Self {
        Self::bounded(
            SolutionStatus::Optimal,
            objective,
            objective,
            format!("selection proven optimal ({:.2})", objective),
        )
    }

    pub fn feasible(objective: f64, bound: f64) -> Self {
        let gap = relative_gap(objective, bound);
        Self::bounded(
            SolutionStatus::Feasible,
            objective,
            bound,
            format!("selection within {:.2}% of the bound", gap * 100.0),
        )
    }

    pub fn infeasible() -> Self {
        Self::empty(
            SolutionStatus::Infeasible,
            f64::NEG_INFINITY,
            "no selection satisfies the spacing and mix constraints",
        )
    }

    /// Time limit reached, with the incumbent if the solver had one.
    pub fn timeout(incumbent: Option<f64>, bound: f64) -> Self {
        match incumbent {
            Some(objective) => {
                let gap = relative_gap(objective, bound);
                Self::bounded(
                    SolutionStatus::Timeout,
                    objective,
                    bound,
                    format!("time limit reached {:.2}% from the bound", gap * 100.0),
                )
            }
            None => Self::empty(
                SolutionStatus::Timeout,
                bound,
                "time limit reached before any selection was found",
            ),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::empty(SolutionStatus::Error, f64::NEG_INFINITY, message)
    }

    pub fn with_solve_time(mut self, ms: u64) -> Self {
        self.solve_time_ms = ms;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn has_selection(&self) -> bool {
        self.objective_value.is_finite()
    }
}

fn relative_gap(objective: f64, bound: f64) -> f64 {
    if bound.is_finite() && bound.abs() > 1e-10 {
        ((bound - objective) / bound.abs()).max(0.0)
    } else {
        0.0
    }
}
