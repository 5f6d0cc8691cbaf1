//! Optimization orchestrator.
//!
//! Runs the pipeline stage by stage:
//!
//! 1. Input validation (problems become an `invalid` result)
//! 2. Lane generation
//! 3. Candidate generation
//! 4. Conflict graph construction
//! 5. Greedy selection, always, as fallback and warm start
//! 6. Exact selection, when enabled and compiled in
//! 7. Layout assembly
//!
//! Geometry failures abort the run with an [`Error`]. Solver-stage outcomes
//! are reported through the result status and warnings.
//!
//! The time limit covers the whole run. Candidate generation and conflict
//! detection stop at the deadline; the run then falls back to a first-fit
//! layout over whatever candidates exist and reports `timeout`.

use crate::candidate::{Candidate, CandidateGenerator, CandidateSet};
use crate::conflict::ConflictGraph;
use crate::geometry::{fully_contained, overlap, polygon_from_points};
use crate::greedy::{first_fit, GreedySolver};
use crate::lane::{estimate_lane_requirements, LaneGenerator, LanePlan, LaneRequirements};
use crate::milp_solver::{is_milp_available, run_milp_selection, MilpOutcome};
use crate::selection::{Selection, SelectionProblem, SelectionSolver};
use lotplan_core::geometry::{Point2, Polygon2D};
use lotplan_core::{
    Error, LaneSpec, LaneType, Layout, OptimizationConfig, OptimizationResult,
    OptimizationStatus, ParkingSpace, ProgressCallback, Result, SolutionStatus, SolveStats,
    VehicleCatalog, VehicleMix, VehicleSpec,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Share of the lot taken by a one-way lane in quick estimates.
const ONE_WAY_LANE_FRACTION: f64 = 0.17;

/// Share of the lot taken by a two-way lane in quick estimates.
const TWO_WAY_LANE_FRACTION: f64 = 0.22;

/// Fraction of parking area actually covered by spaces in quick estimates.
const PACKING_EFFICIENCY: f64 = 0.6;

/// Objective tolerance when comparing exact and greedy selections.
const OBJECTIVE_EPSILON: f64 = 1e-6;

/// Grid coarsening attempts before falling back to truncation.
const MAX_COARSENING_STEPS: usize = 4;

/// Extra coarsening on top of the square-root estimate, so one step usually
/// lands under the candidate ceiling.
const COARSENING_MARGIN: f64 = 1.1;

/// One optimization run's input.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationRequest {
    /// Lot boundary, at least three vertices.
    pub boundary: Vec<Point2>,
    pub entry: Point2,
    /// Defaults to the boundary point opposite the entry.
    pub exit: Option<Point2>,
    pub vehicle_mix: VehicleMix,
    /// Per-type eligible areas. A type with an empty list cannot be placed.
    pub eligible_areas: BTreeMap<String, Vec<Vec<Point2>>>,
}

impl OptimizationRequest {
    pub fn new(boundary: Vec<Point2>, entry: Point2) -> Self {
        Self {
            boundary,
            entry,
            ..Default::default()
        }
    }

    pub fn with_exit(mut self, exit: Point2) -> Self {
        self.exit = Some(exit);
        self
    }

    pub fn with_vehicle_mix(mut self, mix: VehicleMix) -> Self {
        self.vehicle_mix = mix;
        self
    }

    pub fn with_eligible_areas(mut self, vehicle_type: impl Into<String>, areas: Vec<Vec<Point2>>) -> Self {
        self.eligible_areas.insert(vehicle_type.into(), areas);
        self
    }

    /// Input problems that make the request unusable.
    pub fn validate(&self, catalog: &VehicleCatalog) -> Vec<String> {
        let mut problems = Vec::new();

        if self.boundary.len() < 3 {
            problems.push(format!(
                "Boundary must have at least 3 vertices (got {})",
                self.boundary.len()
            ));
        }
        if let Some(i) = self
            .boundary
            .iter()
            .position(|p| !p.0.is_finite() || !p.1.is_finite())
        {
            problems.push(format!("Boundary vertex {} has a non-finite coordinate", i));
        }
        let finite = |p: Point2| p.0.is_finite() && p.1.is_finite();
        if !finite(self.entry) {
            problems.push("Entry point has a non-finite coordinate".to_string());
        }
        if self.exit.is_some_and(|p| !finite(p)) {
            problems.push("Exit point has a non-finite coordinate".to_string());
        }

        problems.extend(self.vehicle_mix.validate(catalog));

        for vehicle_type in self.eligible_areas.keys() {
            if !catalog.contains(vehicle_type) {
                problems.push(format!("Unknown vehicle type in eligible areas: {}", vehicle_type));
            }
        }
        problems
    }
}

/// Parking layout optimizer.
///
/// # Example
///
/// ```rust
/// use lotplan_core::OptimizationConfig;
/// use lotplan_planner::{OptimizationRequest, Optimizer};
///
/// let config = OptimizationConfig::new().with_grid_resolution(2.0);
/// let request = OptimizationRequest::new(
///     vec![(0.0, 0.0), (50.0, 0.0), (50.0, 100.0), (0.0, 100.0)],
///     (25.0, 0.0),
/// )
/// .with_exit((25.0, 100.0));
///
/// let result = Optimizer::new(config).optimize(&request).unwrap();
/// assert!(result.is_success());
/// ```
pub struct Optimizer {
    config: OptimizationConfig,
    catalog: Arc<VehicleCatalog>,
    exact_solver: Option<Arc<dyn SelectionSolver + Send + Sync>>,
}

impl Optimizer {
    /// Creates an optimizer using the default vehicle catalog.
    pub fn new(config: OptimizationConfig) -> Self {
        Self {
            config,
            catalog: Arc::new(VehicleCatalog::default()),
            exact_solver: None,
        }
    }

    /// Uses a shared vehicle catalog.
    pub fn with_catalog(mut self, catalog: impl Into<Arc<VehicleCatalog>>) -> Self {
        self.catalog = catalog.into();
        self
    }

    /// Replaces the built-in MILP backend for the exact stage. The greedy
    /// stage, output re-validation and fallbacks still apply.
    pub fn with_exact_solver(mut self, solver: impl SelectionSolver + Send + Sync + 'static) -> Self {
        self.exact_solver = Some(Arc::new(solver));
        self
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &VehicleCatalog {
        &self.catalog
    }

    pub fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResult> {
        self.run(request, None)
    }

    /// Like [`optimize`](Self::optimize), reporting a message after each stage.
    pub fn optimize_with_progress(
        &self,
        request: &OptimizationRequest,
        callback: ProgressCallback,
    ) -> Result<OptimizationResult> {
        self.run(request, Some(&callback))
    }

    /// Rough capacity estimate for a lot using this optimizer's catalog.
    pub fn quick_estimate(&self, boundary: &[Point2], lane_type: LaneType) -> Result<QuickEstimate> {
        estimate_with_catalog(boundary, lane_type, &self.catalog)
    }

    fn run(&self, request: &OptimizationRequest, callback: Option<&ProgressCallback>) -> Result<OptimizationResult> {
        let start = Instant::now();
        let report = |message: String| {
            log::info!("{}", message);
            if let Some(cb) = callback {
                cb(message.as_str());
            }
        };

        // Validation
        let mut problems = request.validate(&self.catalog);
        problems.extend(self.config.validate(&self.catalog));
        if !problems.is_empty() {
            log::warn!("Rejected optimization input: {}", problems.join("; "));
            report("Validation failed".to_string());
            return Ok(OptimizationResult::invalid(problems));
        }
        report("Input validated".to_string());

        let boundary = polygon_from_points(&request.boundary)?;
        let eligible = request
            .eligible_areas
            .iter()
            .map(|(t, areas)| -> Result<(String, Vec<Polygon2D>)> {
                let polygons = areas
                    .iter()
                    .map(|a| polygon_from_points(a))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((t.clone(), polygons))
            })
            .collect::<Result<BTreeMap<String, Vec<Polygon2D>>>>()?;

        // Lane
        let lane = LaneGenerator::from_config(&self.config).generate(&boundary, request.entry, request.exit)?;
        let mut run = RunState {
            warnings: lane.warnings.clone(),
            stats: SolveStats {
                lot_area: boundary.area(),
                parking_area: lane.parking_area(),
                ..Default::default()
            },
        };
        report(format!(
            "Lane generated: {} parking zones, {:.0} parking area",
            lane.zones.len(),
            lane.parking_area()
        ));

        if lane.zones.is_empty() {
            run.warnings
                .push("No usable parking zone remains after lane subtraction".to_string());
            return Ok(run.finish(OptimizationStatus::Infeasible, &boundary, &lane, Vec::new(), start));
        }

        // Candidates
        let deadline = start + Duration::from_millis(self.config.time_limit_ms);
        let min_spacing = self.config.rules.min_spacing;
        let types = self.resolve_types(&request.vehicle_mix);
        let set = self.generate_candidates(&boundary, &lane, &types, &eligible, deadline, &mut run.warnings);
        run.warnings.extend(set.warnings.iter().cloned());
        run.stats.total_candidates = set.len();
        report(format!("Generated {} candidates", set.len()));

        if !set.timed_out {
            let shortfalls = mix_shortfalls(&set, &request.vehicle_mix);
            if !shortfalls.is_empty() {
                run.warnings.extend(shortfalls);
                return Ok(run.finish(OptimizationStatus::Infeasible, &boundary, &lane, Vec::new(), start));
            }
        }

        // Conflicts
        let conflicts = if set.timed_out {
            None
        } else {
            ConflictGraph::build_until(&set.candidates, min_spacing, deadline)
        };
        let Some(conflicts) = conflicts else {
            let stage = if set.timed_out {
                "candidate generation"
            } else {
                "conflict detection"
            };
            run.warnings.push(format!(
                "Time limit reached during {}; returning first-fit layout (optimality not proven)",
                stage
            ));
            let selection = first_fit(&set.candidates, &request.vehicle_mix, min_spacing);
            run.warnings.extend(selection.warnings.iter().cloned());
            let status = if selection.is_usable() {
                OptimizationStatus::Timeout
            } else {
                OptimizationStatus::Infeasible
            };
            report(format!("Selection finished: {} (first-fit)", status));
            run.stats.solver = Some("first-fit".to_string());

            let spaces = if status.has_layout() {
                self.materialize(&set.candidates, &selection.chosen)
            } else {
                Vec::new()
            };
            let problems = validate_spaces(&boundary, &spaces, min_spacing);
            if !problems.is_empty() {
                return Err(invalid_layout(&problems));
            }
            return Ok(run.finish(status, &boundary, &lane, spaces, start));
        };
        run.stats.total_conflicts = conflicts.edge_count();
        report(format!("Built conflict graph with {} pairs", conflicts.edge_count()));

        let problem = SelectionProblem::new(&set.candidates, &conflicts, &request.vehicle_mix);

        // Greedy
        let greedy = GreedySolver.solve(&problem);
        report(format!(
            "Greedy selected {} spaces ({})",
            greedy.len(),
            greedy.status
        ));
        let greedy_fallback = greedy.is_usable().then(|| greedy.chosen.clone());

        // Exact
        let (mut status, selection, mut solver) = self.exact_stage(&problem, greedy, start, &mut run.warnings);

        let mut spaces = if status.has_layout() {
            self.materialize(&set.candidates, &selection.chosen)
        } else {
            Vec::new()
        };
        let problems = validate_spaces(&boundary, &spaces, min_spacing);
        if !problems.is_empty() {
            log::error!("Assembled layout failed validation: {}", problems.join("; "));
            match greedy_fallback.filter(|_| solver != "greedy") {
                Some(chosen) => {
                    run.warnings.push(format!(
                        "Layout from {} failed final validation; returning greedy layout (optimality not proven)",
                        solver
                    ));
                    spaces = self.materialize(&set.candidates, &chosen);
                    status = OptimizationStatus::Feasible;
                    solver = "greedy";
                    let problems = validate_spaces(&boundary, &spaces, min_spacing);
                    if !problems.is_empty() {
                        return Err(invalid_layout(&problems));
                    }
                }
                None => return Err(invalid_layout(&problems)),
            }
        }
        report(format!("Selection finished: {} ({})", status, solver));
        run.stats.solver = Some(solver.to_string());

        let result = run.finish(status, &boundary, &lane, spaces, start);
        report(format!(
            "Layout assembled: {} spaces, revenue {:.2}",
            result.space_count(),
            result.estimated_revenue()
        ));
        Ok(result)
    }

    /// Generates candidates, coarsening the grid while the count is above the
    /// configured ceiling and truncating to the heaviest ones as a last resort.
    fn generate_candidates(
        &self,
        boundary: &Polygon2D,
        lane: &LanePlan,
        types: &[&VehicleSpec],
        eligible: &BTreeMap<String, Vec<Polygon2D>>,
        deadline: Instant,
        warnings: &mut Vec<String>,
    ) -> CandidateSet {
        let max = self.config.max_candidates;
        let mut resolution = self.config.grid_resolution;
        let mut attempt = 0;

        let mut set = loop {
            let set = CandidateGenerator::new(&self.config)
                .with_eligible_areas(eligible)
                .with_resolution(resolution)
                .with_deadline(deadline)
                .generate(boundary, lane, types);
            if set.timed_out || set.len() <= max || attempt == MAX_COARSENING_STEPS {
                break set;
            }

            let coarser = resolution * ((set.len() as f64 / max as f64).sqrt() * COARSENING_MARGIN);
            log::info!(
                "{} candidates over the limit of {}, retrying on a {:.2} grid",
                set.len(),
                max,
                coarser
            );
            warnings.push(format!(
                "Candidate count {} exceeds limit {}; coarsening grid from {:.2} to {:.2}",
                set.len(),
                max,
                resolution,
                coarser
            ));
            resolution = coarser;
            attempt += 1;
        };

        let dropped = set.truncate(max);
        if dropped > 0 {
            warnings.push(format!(
                "Dropped {} lowest-weight candidates to stay within limit {}",
                dropped, max
            ));
        }
        set
    }

    /// Runs the exact solver if possible and decides which selection to keep.
    fn exact_stage(
        &self,
        problem: &SelectionProblem<'_>,
        greedy: Selection,
        start: Instant,
        warnings: &mut Vec<String>,
    ) -> (OptimizationStatus, Selection, &'static str) {
        let exact = &self.config.exact;
        let greedy_usable = greedy.is_usable();

        let fallback = |greedy: Selection, warnings: &mut Vec<String>| {
            let status = if greedy.is_usable() {
                OptimizationStatus::Feasible
            } else {
                OptimizationStatus::Infeasible
            };
            warnings.extend(greedy.warnings.iter().cloned());
            (status, greedy, "greedy")
        };

        let skip_reason = if !exact.enabled {
            Some("Exact solver disabled; returning greedy layout (optimality not proven)".to_string())
        } else if self.exact_solver.is_none() && !is_milp_available() {
            Some("Exact solver unavailable; returning greedy layout (optimality not proven)".to_string())
        } else if !exact.is_within_limit(problem.len()) {
            Some(format!(
                "Candidate count {} exceeds exact solver limit {}; returning greedy layout (optimality not proven)",
                problem.len(),
                exact.max_candidates
            ))
        } else {
            None
        };
        if let Some(reason) = skip_reason {
            log::info!("{}", reason);
            if greedy_usable {
                warnings.push(reason);
            }
            return fallback(greedy, warnings);
        }

        let elapsed = start.elapsed().as_millis() as u64;
        let remaining = self.config.time_limit_ms.saturating_sub(elapsed);
        let limit = exact.time_limit_ms.min(remaining);
        if limit == 0 {
            warnings.push("Time limit reached before exact solve; optimality not proven".to_string());
            let status = if greedy_usable {
                OptimizationStatus::Timeout
            } else {
                OptimizationStatus::Infeasible
            };
            warnings.extend(greedy.warnings.iter().cloned());
            return (status, greedy, "greedy");
        }

        let warm_start = greedy_usable.then_some(greedy.objective);
        let (outcome, exact_name) = match &self.exact_solver {
            Some(custom) => (MilpOutcome::from(custom.solve(problem)), custom.name()),
            None => (run_milp_selection(problem, exact, limit, warm_start), "milp"),
        };
        let result = outcome.result;

        match outcome.chosen {
            Some(chosen) => {
                let violations = problem.violations(&chosen);
                if !violations.is_empty() {
                    log::warn!("Exact solver output rejected: {}", violations.join("; "));
                    warnings.push("Exact solver returned an invalid selection; using greedy layout".to_string());
                    return fallback(greedy, warnings);
                }
                let candidate = Selection::new(chosen, result.status, problem);
                if greedy_usable && candidate.objective + OBJECTIVE_EPSILON < greedy.objective {
                    warnings.push(
                        "Time limit reached; exact solver did not improve on greedy layout (optimality not proven)"
                            .to_string(),
                    );
                    return (OptimizationStatus::Timeout, greedy, "greedy");
                }
                let status = match result.status {
                    SolutionStatus::Optimal => OptimizationStatus::Optimal,
                    SolutionStatus::Timeout => {
                        warnings.push(format!(
                            "Time limit reached; optimality not proven (gap {:.2}%)",
                            result.gap * 100.0
                        ));
                        OptimizationStatus::Timeout
                    }
                    _ => {
                        warnings.push(format!("Optimality not proven: {}", result.message));
                        OptimizationStatus::Feasible
                    }
                };
                (status, candidate, exact_name)
            }
            None => match result.status {
                SolutionStatus::Infeasible if !greedy_usable => {
                    warnings.extend(greedy.warnings.iter().cloned());
                    (OptimizationStatus::Infeasible, greedy, exact_name)
                }
                SolutionStatus::Timeout if greedy_usable => {
                    warnings.push(
                        "Time limit reached without an exact solution; returning greedy layout (optimality not proven)"
                            .to_string(),
                    );
                    (OptimizationStatus::Timeout, greedy, "greedy")
                }
                _ => {
                    warnings.push(format!("Exact solver failed ({}); using greedy layout", result.message));
                    fallback(greedy, warnings)
                }
            },
        }
    }

    /// Vehicle types to place: the mix types if a mix is given, else the
    /// configured subset, else the whole catalog. Always in catalog order.
    fn resolve_types(&self, mix: &VehicleMix) -> Vec<&VehicleSpec> {
        self.catalog
            .iter()
            .filter(|spec| {
                if !mix.is_empty() {
                    mix.contains(&spec.id)
                } else if let Some(types) = &self.config.vehicle_types {
                    types.iter().any(|t| *t == spec.id)
                } else {
                    true
                }
            })
            .collect()
    }

    /// Turns chosen candidates into labelled spaces, numbered in candidate order.
    fn materialize(&self, candidates: &[Candidate], chosen: &[usize]) -> Vec<ParkingSpace> {
        chosen
            .iter()
            .enumerate()
            .map(|(n, &i)| {
                let c = &candidates[i];
                let id = n as u32 + 1;
                let prefix = self
                    .catalog
                    .get(&c.vehicle_type)
                    .map_or("S", |spec| spec.label_prefix.as_str());
                ParkingSpace {
                    id,
                    label: format!("{}-{}", prefix, id),
                    vehicle_type: c.vehicle_type.clone(),
                    footprint: c.footprint,
                    revenue: c.revenue,
                }
            })
            .collect()
    }
}

/// Warnings for mix minimums that exceed the number of feasible candidates.
fn mix_shortfalls(set: &CandidateSet, mix: &VehicleMix) -> Vec<String> {
    mix.iter()
        .filter(|(t, bound)| set.count_for(t) < bound.min_count())
        .map(|(t, bound)| {
            format!(
                "Vehicle mix minimum for {} cannot be met: {} feasible placements for {} required",
                t,
                set.count_for(t),
                bound.min_count()
            )
        })
        .collect()
}

struct RunState {
    warnings: Vec<String>,
    stats: SolveStats,
}

impl RunState {
    fn finish(
        mut self,
        status: OptimizationStatus,
        boundary: &Polygon2D,
        lane: &LanePlan,
        spaces: Vec<ParkingSpace>,
        start: Instant,
    ) -> OptimizationResult {
        let layout = Layout {
            boundary: boundary.exterior().to_vec(),
            spaces,
            lanes: vec![lane.to_layout()],
            zones: lane.zones.clone(),
        };
        self.stats.space_count = layout.spaces.len();
        self.stats.estimated_revenue = layout.total_revenue();
        self.stats.space_counts = layout.count_by_type();
        self.stats.elapsed_ms = start.elapsed().as_millis() as u64;

        log::info!(
            "Optimization finished: {} with {} spaces in {} ms",
            status,
            self.stats.space_count,
            self.stats.elapsed_ms
        );
        OptimizationResult {
            status,
            layout,
            stats: self.stats,
            warnings: self.warnings,
        }
    }
}

/// Re-checks a finished layout: every space inside the boundary and every
/// pair at least `min_spacing` apart. Returns a message per problem.
pub fn validate_layout(layout: &Layout, min_spacing: f64) -> Vec<String> {
    if layout.spaces.is_empty() {
        return Vec::new();
    }
    match polygon_from_points(&layout.boundary) {
        Ok(boundary) => validate_spaces(&boundary, &layout.spaces, min_spacing),
        Err(e) => vec![format!("Layout boundary is invalid: {}", e)],
    }
}

fn validate_spaces(boundary: &Polygon2D, spaces: &[ParkingSpace], min_spacing: f64) -> Vec<String> {
    let mut problems = Vec::new();
    for space in spaces {
        if !fully_contained(&space.footprint, boundary) {
            problems.push(format!("Space {} is not inside the boundary", space.label));
        }
    }
    for (i, a) in spaces.iter().enumerate() {
        for b in &spaces[i + 1..] {
            if overlap(&a.footprint, &b.footprint, min_spacing) {
                problems.push(format!(
                    "Spaces {} and {} are closer than {:.2}",
                    a.label, b.label, min_spacing
                ));
            }
        }
    }
    problems
}

fn invalid_layout(problems: &[String]) -> Error {
    Error::Internal(format!("assembled layout failed validation: {}", problems.join("; ")))
}

// ============================================================================
// Quick estimate
// ============================================================================

/// Rough sizing of a lot without candidate enumeration or solving.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuickEstimate {
    pub total_area: f64,
    pub lane_area: f64,
    pub parking_area: f64,
    /// Parking area after packing losses.
    pub usable_area: f64,
    /// Spaces of average catalog footprint that fit the usable area.
    pub estimated_spaces: usize,
    /// Upper bound on spaces if the lot held a single type.
    pub max_by_type: BTreeMap<String, usize>,
    /// Annual revenue of `estimated_spaces` at average price and default occupancy.
    pub estimated_revenue: f64,
    pub lane: LaneRequirements,
}

impl QuickEstimate {
    pub fn max_for(&self, vehicle_type: &str) -> usize {
        self.max_by_type.get(vehicle_type).copied().unwrap_or(0)
    }
}

/// Capacity estimate from lot area over the default catalog's average
/// footprint.
pub fn quick_estimate(boundary: &[Point2], lane_type: LaneType) -> Result<QuickEstimate> {
    estimate_with_catalog(boundary, lane_type, &VehicleCatalog::default())
}

fn estimate_with_catalog(boundary: &[Point2], lane_type: LaneType, catalog: &VehicleCatalog) -> Result<QuickEstimate> {
    if boundary.len() < 3 {
        return Err(Error::InvalidInput(format!(
            "Boundary must have at least 3 vertices (got {})",
            boundary.len()
        )));
    }
    let polygon = polygon_from_points(boundary)?;

    let total_area = polygon.area();
    let lane_fraction = match lane_type {
        LaneType::OneWay => ONE_WAY_LANE_FRACTION,
        LaneType::TwoWay => TWO_WAY_LANE_FRACTION,
    };
    let lane_area = total_area * lane_fraction;
    let parking_area = total_area - lane_area;
    let usable_area = parking_area * PACKING_EFFICIENCY;

    let average = catalog.average_footprint_area();
    let estimated_spaces = if average > 0.0 {
        (usable_area / average).floor() as usize
    } else {
        0
    };

    let max_by_type = catalog
        .iter()
        .map(|spec| {
            let n = if spec.footprint_area() > 0.0 {
                (usable_area / spec.footprint_area()).floor() as usize
            } else {
                0
            };
            (spec.id.clone(), n)
        })
        .collect();

    let defaults = OptimizationConfig::default();
    let (revenue_sum, width_sum) = catalog
        .iter()
        .fold((0.0, 0.0), |(r, w), s| (r + s.expected_revenue(defaults.occupancy), w + s.default_width));
    let count = catalog.len().max(1) as f64;
    let estimated_revenue = estimated_spaces as f64 * revenue_sum / count;

    let lane = estimate_lane_requirements(&polygon, &LaneSpec::for_type(lane_type), width_sum / count);

    Ok(QuickEstimate {
        total_area,
        lane_area,
        parking_area,
        usable_area,
        estimated_spaces,
        max_by_type,
        estimated_revenue,
        lane,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lotplan_core::ExactConfig;

    fn rectangle_request() -> OptimizationRequest {
        OptimizationRequest::new(
            vec![(0.0, 0.0), (50.0, 0.0), (50.0, 100.0), (0.0, 100.0)],
            (25.0, 0.0),
        )
        .with_exit((25.0, 100.0))
    }

    fn fast_config() -> OptimizationConfig {
        OptimizationConfig::new()
            .with_grid_resolution(2.0)
            .with_vehicle_types(["truck", "van"])
            .with_exact(ExactConfig::disabled())
    }

    #[test]
    fn test_rectangle_layout_is_valid() {
        let result = Optimizer::new(fast_config()).optimize(&rectangle_request()).unwrap();

        assert_eq!(result.status, OptimizationStatus::Feasible);
        assert!(result.space_count() > 0);
        assert!(validate_layout(&result.layout, 1.0).is_empty());
        assert_eq!(result.stats.space_count, result.space_count());
        assert_relative_eq!(result.stats.lot_area, 5000.0, epsilon = 1e-6);
        assert!(result.stats.parking_area < 5000.0);
        assert!(result.has_warning("optimality not proven"));
        assert_eq!(result.stats.solver.as_deref(), Some("greedy"));
    }

    #[test]
    fn test_labels_use_catalog_prefix() {
        let result = Optimizer::new(fast_config()).optimize(&rectangle_request()).unwrap();
        for (n, space) in result.layout.spaces.iter().enumerate() {
            assert_eq!(space.id as usize, n + 1);
            let prefix = if space.vehicle_type == "truck" { "T" } else { "V" };
            assert_eq!(space.label, format!("{}-{}", prefix, space.id));
        }
    }

    #[test]
    fn test_short_boundary_is_invalid() {
        let request = OptimizationRequest::new(vec![(0.0, 0.0), (1.0, 0.0)], (0.0, 0.0));
        let result = Optimizer::new(fast_config()).optimize(&request).unwrap();
        assert_eq!(result.status, OptimizationStatus::Invalid);
        assert!(result.has_warning("at least 3 vertices"));
    }

    #[test]
    fn test_self_intersecting_boundary_is_error() {
        let request = OptimizationRequest::new(
            vec![(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)],
            (5.0, 0.0),
        );
        let err = Optimizer::new(fast_config()).optimize(&request).unwrap_err();
        assert!(matches!(err, Error::Geometry(_)));
    }

    #[test]
    fn test_validate_layout_flags_overlap() {
        let result = Optimizer::new(fast_config()).optimize(&rectangle_request()).unwrap();
        let mut layout = result.layout.clone();
        let mut twin = layout.spaces[0].clone();
        twin.label = "X-1".into();
        layout.spaces.push(twin);
        let problems = validate_layout(&layout, 1.0);
        assert!(problems.iter().any(|p| p.contains("closer than")));
    }

    /// Picks every candidate and claims optimality.
    struct TakeEverything;

    impl SelectionSolver for TakeEverything {
        fn name(&self) -> &'static str {
            "take-everything"
        }

        fn solve(&self, problem: &SelectionProblem<'_>) -> Selection {
            Selection::new((0..problem.len()).collect(), SolutionStatus::Optimal, problem)
        }
    }

    #[test]
    fn test_invalid_exact_selection_falls_back_to_greedy() {
        let config = fast_config().with_exact(ExactConfig::default());
        let result = Optimizer::new(config)
            .with_exact_solver(TakeEverything)
            .optimize(&rectangle_request())
            .unwrap();

        assert_eq!(result.status, OptimizationStatus::Feasible);
        assert!(result.space_count() > 0);
        assert!(validate_layout(&result.layout, 1.0).is_empty());
        assert!(result.has_warning("invalid selection; using greedy layout"));
        assert_eq!(result.stats.solver.as_deref(), Some("greedy"));
    }

    #[test]
    fn test_candidate_ceiling_coarsens_grid() {
        let config = fast_config().with_grid_resolution(0.5).with_max_candidates(300);
        let result = Optimizer::new(config).optimize(&rectangle_request()).unwrap();

        assert!(result.is_success());
        assert!(result.stats.total_candidates <= 300);
        assert!(result.has_warning("coarsening grid"));
        assert!(result.space_count() > 0);
        assert!(validate_layout(&result.layout, 1.0).is_empty());
    }

    #[test]
    fn test_zero_time_limit_returns_timeout() {
        let config = fast_config().with_time_limit(0);
        let result = Optimizer::new(config).optimize(&rectangle_request()).unwrap();

        assert_eq!(result.status, OptimizationStatus::Timeout);
        assert!(result.has_warning("Time limit reached during candidate generation"));
        assert_eq!(result.stats.solver.as_deref(), Some("first-fit"));
        assert!(validate_layout(&result.layout, 1.0).is_empty());
    }

    #[test]
    fn test_quick_estimate() {
        let boundary = [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)];
        let one_way = quick_estimate(&boundary, LaneType::OneWay).unwrap();
        let two_way = quick_estimate(&boundary, LaneType::TwoWay).unwrap();

        assert_relative_eq!(one_way.total_area, 10_000.0, epsilon = 1e-6);
        assert_relative_eq!(one_way.lane_area, 1_700.0, epsilon = 1e-6);
        assert_relative_eq!(one_way.usable_area, 8_300.0 * 0.6, epsilon = 1e-6);
        assert!(one_way.estimated_spaces > two_way.estimated_spaces);
        // 4980 / (18.5 * 3.5)
        assert_eq!(one_way.max_for("truck"), 76);
        assert!(one_way.max_for("tractor") > one_way.max_for("truck"));
        assert!(one_way.estimated_revenue > 0.0);
    }

    #[test]
    fn test_quick_estimate_rejects_short_boundary() {
        assert!(quick_estimate(&[(0.0, 0.0), (1.0, 1.0)], LaneType::OneWay).is_err());
    }
}
