//! Candidate placement enumeration.
//!
//! Every parking zone is scanned on a fixed grid for each vehicle type and
//! orientation. Grid rows are evaluated in parallel and collected in order,
//! so the resulting list is identical to a sequential scan: zone, then type,
//! then row, then column, then orientation.

use crate::geometry::{
    distance_to_exterior, distance_to_polyline, fully_contained, oriented_rectangle,
    rect_polyline_distance,
};
use crate::lane::LanePlan;
use lotplan_core::geometry::{OrientedRect, Point2, Polygon2D};
use lotplan_core::{Goal, OptimizationConfig, VehicleSpec};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;

/// A proposed placement. Candidates are immutable once generated; solvers
/// refer to them by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Position in the candidate list.
    pub id: u32,
    /// Index of the parking zone it was generated in.
    pub zone: usize,
    pub vehicle_type: String,
    pub footprint: OrientedRect,
    /// Within maneuvering reach of the lane centerline.
    pub accessible: bool,
    /// Expected annual revenue.
    pub revenue: f64,
    /// Objective coefficient under the active goal.
    pub weight: f64,
}

impl Candidate {
    pub fn center(&self) -> Point2 {
        self.footprint.center
    }

    pub fn rotation(&self) -> f64 {
        self.footprint.rotation
    }
}

/// Objective coefficient for a vehicle type under `goal`.
///
/// `off_target` is the weight of every other type under
/// [`Goal::MaximizeType`], see [`off_target_weight`].
pub fn goal_weight(goal: &Goal, vehicle_type: &str, revenue: f64, off_target: f64) -> f64 {
    match goal {
        Goal::MaximizeRevenue => revenue,
        Goal::MaximizeCount => 1.0,
        Goal::MaximizeType(target) if target == vehicle_type => 1.0,
        Goal::MaximizeType(_) => off_target,
    }
}

/// Off-target weight for a list of `candidate_count` candidates. Even if every
/// candidate were selected, off-target spaces sum to less than one target
/// space, yet they still fill leftover room.
pub fn off_target_weight(candidate_count: usize) -> f64 {
    1.0 / (candidate_count as f64 + 1.0)
}

/// Generated candidates plus per-type diagnostics.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    /// Candidates generated per vehicle type.
    pub per_type: BTreeMap<String, usize>,
    /// Placements that fit but were out of lane reach.
    pub inaccessible: usize,
    /// The deadline passed before every zone was scanned.
    pub timed_out: bool,
    pub warnings: Vec<String>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn count_for(&self, vehicle_type: &str) -> usize {
        self.per_type.get(vehicle_type).copied().unwrap_or(0)
    }

    /// Keeps the `max` heaviest candidates (ties in list order) and renumbers
    /// them, preserving list order. Returns how many were dropped.
    pub fn truncate(&mut self, max: usize) -> usize {
        let len = self.candidates.len();
        if len <= max {
            return 0;
        }

        let mut order: Vec<usize> = (0..len).collect();
        order.sort_by(|&a, &b| self.candidates[b].weight.total_cmp(&self.candidates[a].weight));
        let mut keep = vec![false; len];
        for &i in &order[..max] {
            keep[i] = true;
        }

        let candidates = std::mem::take(&mut self.candidates);
        self.candidates = candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(c, k)| k.then_some(c))
            .collect();

        for n in self.per_type.values_mut() {
            *n = 0;
        }
        for (i, c) in self.candidates.iter_mut().enumerate() {
            c.id = i as u32;
            *self.per_type.entry(c.vehicle_type.clone()).or_insert(0) += 1;
        }
        len - max
    }

    /// Recomputes candidate weights for `goal` over the current list.
    fn reweight(&mut self, goal: &Goal) {
        let off_target = off_target_weight(self.candidates.len());
        for c in &mut self.candidates {
            c.weight = goal_weight(goal, &c.vehicle_type, c.revenue, off_target);
        }
    }
}

/// Grid-based candidate generator.
pub struct CandidateGenerator<'a> {
    config: &'a OptimizationConfig,
    eligible: Option<&'a BTreeMap<String, Vec<Polygon2D>>>,
    resolution: f64,
    deadline: Option<Instant>,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(config: &'a OptimizationConfig) -> Self {
        Self {
            config,
            eligible: None,
            resolution: config.grid_resolution,
            deadline: None,
        }
    }

    /// Scans on a different grid than the configured one.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Stops scanning once `deadline` passes. The partial set is flagged with
    /// [`CandidateSet::timed_out`].
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Restricts vehicle types to eligible areas. A type mapped to an empty
    /// list gets no candidates at all.
    pub fn with_eligible_areas(mut self, eligible: &'a BTreeMap<String, Vec<Polygon2D>>) -> Self {
        self.eligible = Some(eligible);
        self
    }

    /// Enumerates candidates for `types` over the zones of `lane`.
    pub fn generate(&self, boundary: &Polygon2D, lane: &LanePlan, types: &[&VehicleSpec]) -> CandidateSet {
        let mut set = CandidateSet::default();
        for &spec in types {
            set.per_type.insert(spec.id.clone(), 0);
        }

        'zones: for (zone_index, zone) in lane.zones.iter().enumerate() {
            for &spec in types {
                if self.expired() {
                    set.timed_out = true;
                    break 'zones;
                }
                let scan = ZoneScan {
                    config: self.config,
                    resolution: self.resolution,
                    deadline: self.deadline,
                    boundary,
                    lane,
                    zone,
                    spec,
                    areas: self.eligible.and_then(|e| e.get(&spec.id)).map(Vec::as_slice),
                };
                let (placed, inaccessible, complete) = scan.run();
                set.inaccessible += inaccessible;
                set.timed_out |= !complete;

                for (footprint, accessible) in placed {
                    let revenue = spec.expected_revenue(self.config.occupancy);
                    set.candidates.push(Candidate {
                        id: set.candidates.len() as u32,
                        zone: zone_index,
                        vehicle_type: spec.id.clone(),
                        footprint,
                        accessible,
                        revenue,
                        weight: revenue,
                    });
                    *set.per_type.entry(spec.id.clone()).or_insert(0) += 1;
                }
            }
        }

        set.reweight(&self.config.goal);

        if set.timed_out {
            log::warn!("Candidate generation hit the deadline after {} candidates", set.len());
        }
        for &spec in types {
            if set.count_for(&spec.id) == 0 && !lane.zones.is_empty() && !set.timed_out {
                set.warnings
                    .push(format!("No feasible placements for vehicle type {}", spec.id));
            }
        }

        log::debug!(
            "Generated {} candidates across {} zones ({} out of lane reach)",
            set.len(),
            lane.zones.len(),
            set.inaccessible
        );
        set
    }
}

/// Scan of one zone for one vehicle type.
struct ZoneScan<'a> {
    config: &'a OptimizationConfig,
    resolution: f64,
    deadline: Option<Instant>,
    boundary: &'a Polygon2D,
    lane: &'a LanePlan,
    zone: &'a Polygon2D,
    spec: &'a VehicleSpec,
    areas: Option<&'a [Polygon2D]>,
}

impl ZoneScan<'_> {
    /// Accepted footprints with their accessibility flag, the number
    /// rejected for being out of reach, and whether every row was scanned.
    fn run(&self) -> (Vec<(OrientedRect, bool)>, usize, bool) {
        if matches!(self.areas, Some(a) if a.is_empty()) {
            return (Vec::new(), 0, true);
        }

        let res = self.resolution;
        let bbox = self.zone.aabb();
        let cols = (bbox.width() / res).floor() as usize + 1;
        let rows = (bbox.height() / res).floor() as usize + 1;

        let per_row: Vec<Option<(Vec<(OrientedRect, bool)>, usize)>> = (0..rows)
            .into_par_iter()
            .map(|r| {
                if self.deadline.is_some_and(|d| Instant::now() >= d) {
                    return None;
                }
                let y = bbox.min_y + r as f64 * res;
                let mut row = Vec::new();
                let mut inaccessible = 0;
                for c in 0..cols {
                    let x = bbox.min_x + c as f64 * res;
                    for &rotation in &self.config.orientations {
                        match self.evaluate(x, y, rotation) {
                            Placement::Accepted(rect, accessible) => row.push((rect, accessible)),
                            Placement::OutOfReach => inaccessible += 1,
                            Placement::Rejected => {}
                        }
                    }
                }
                Some((row, inaccessible))
            })
            .collect();

        let complete = per_row.iter().all(Option::is_some);
        let per_row: Vec<_> = per_row.into_iter().flatten().collect();
        let inaccessible: usize = per_row.iter().map(|(_, n)| n).sum();
        (per_row.into_iter().flat_map(|(row, _)| row).collect(), inaccessible, complete)
    }

    fn evaluate(&self, x: f64, y: f64, rotation: f64) -> Placement {
        let rect = oriented_rectangle(x, y, self.spec.default_length, self.spec.default_width, rotation);
        if !fully_contained(&rect, self.zone) {
            return Placement::Rejected;
        }
        if let Some(areas) = self.areas {
            if !areas.iter().any(|a| fully_contained(&rect, a)) {
                return Placement::Rejected;
            }
        }

        if let Some(max_distance) = self.config.rules.fire_access_max_distance {
            let reach = distance_to_exterior(self.boundary, rect.center)
                .min(distance_to_polyline(rect.center, &self.lane.centerline));
            if reach > max_distance {
                return Placement::Rejected;
            }
        }

        // Closed-form maneuvering proxy: distance to the centerline against
        // turning radius plus corridor width.
        let reach = self.spec.turning_radius + self.lane.width();
        let accessible = rect_polyline_distance(&rect, &self.lane.centerline) <= reach;
        if !accessible && self.config.require_access {
            return Placement::OutOfReach;
        }
        Placement::Accepted(rect, accessible)
    }
}

enum Placement {
    Accepted(OrientedRect, bool),
    OutOfReach,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::LaneGenerator;
    use lotplan_core::{LaneSpec, VehicleCatalog};

    fn setup(grid: f64) -> (Polygon2D, LanePlan, OptimizationConfig) {
        let lot = Polygon2D::rectangle(50.0, 100.0).unwrap();
        let plan = LaneGenerator::new(LaneSpec::default())
            .generate(&lot, (25.0, 0.0), Some((25.0, 100.0)))
            .unwrap();
        (lot, plan, OptimizationConfig::new().with_grid_resolution(grid))
    }

    #[test]
    fn test_candidates_are_contained_and_ordered() {
        let (lot, plan, config) = setup(2.0);
        let catalog = VehicleCatalog::default();
        let types = [catalog.get("truck").unwrap(), catalog.get("van").unwrap()];
        let set = CandidateGenerator::new(&config).generate(&lot, &plan, &types);

        assert!(!set.is_empty());
        assert!(set.count_for("truck") > 0);
        assert!(set.count_for("van") > 0);
        for (i, c) in set.candidates.iter().enumerate() {
            assert_eq!(c.id as usize, i);
            assert!(fully_contained(&c.footprint, &plan.zones[c.zone]));
        }
        // zone-major, then type
        let keys: Vec<(usize, usize)> = set
            .candidates
            .iter()
            .map(|c| (c.zone, if c.vehicle_type == "truck" { 0 } else { 1 }))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let (lot, plan, config) = setup(2.0);
        let catalog = VehicleCatalog::default();
        let types: Vec<&VehicleSpec> = catalog.iter().collect();
        let a = CandidateGenerator::new(&config).generate(&lot, &plan, &types);
        let b = CandidateGenerator::new(&config).generate(&lot, &plan, &types);
        assert_eq!(a.candidates, b.candidates);
    }

    #[test]
    fn test_empty_eligible_area_blocks_type() {
        let (lot, plan, config) = setup(2.0);
        let catalog = VehicleCatalog::default();
        let mut eligible = BTreeMap::new();
        eligible.insert("ev".to_string(), Vec::new());
        let types = [catalog.get("truck").unwrap(), catalog.get("ev").unwrap()];

        let set = CandidateGenerator::new(&config)
            .with_eligible_areas(&eligible)
            .generate(&lot, &plan, &types);
        assert_eq!(set.count_for("ev"), 0);
        assert!(set.count_for("truck") > 0);
        assert!(set.warnings.iter().any(|w| w.contains("ev")));
    }

    #[test]
    fn test_eligible_area_restricts_placement() {
        let (lot, plan, config) = setup(1.0);
        let catalog = VehicleCatalog::default();
        let area = crate::geometry::polygon_from_points(&[(0.0, 0.0), (22.0, 0.0), (22.0, 30.0), (0.0, 30.0)])
            .unwrap();
        let mut eligible = BTreeMap::new();
        eligible.insert("ev".to_string(), vec![area.clone()]);

        let set = CandidateGenerator::new(&config)
            .with_eligible_areas(&eligible)
            .generate(&lot, &plan, &[catalog.get("ev").unwrap()]);
        assert!(set.count_for("ev") > 0);
        assert!(set.candidates.iter().all(|c| fully_contained(&c.footprint, &area)));
    }

    #[test]
    fn test_goal_weights() {
        assert_eq!(goal_weight(&Goal::MaximizeRevenue, "truck", 1825.2, 0.5), 1825.2);
        assert_eq!(goal_weight(&Goal::MaximizeCount, "van", 900.0, 0.5), 1.0);
        let goal = Goal::MaximizeType("truck".into());
        assert_eq!(goal_weight(&goal, "truck", 1825.2, 0.5), 1.0);
        assert_eq!(goal_weight(&goal, "van", 900.0, 0.5), 0.5);
    }

    #[test]
    fn test_off_target_spaces_never_outweigh_one_target_space() {
        let (lot, plan, _) = setup(1.0);
        let config = OptimizationConfig::new()
            .with_grid_resolution(1.0)
            .with_goal(Goal::MaximizeType("truck".into()));
        let catalog = VehicleCatalog::default();
        let types: Vec<&VehicleSpec> = catalog.iter().collect();
        let set = CandidateGenerator::new(&config).generate(&lot, &plan, &types);

        let off_target: Vec<&Candidate> =
            set.candidates.iter().filter(|c| c.vehicle_type != "truck").collect();
        assert!(off_target.len() > 1000);
        let off_total: f64 = off_target.iter().map(|c| c.weight).sum();
        assert!(off_total < 1.0, "off-target total {}", off_total);
        assert!(off_target.iter().all(|c| c.weight > 0.0));
        assert!(set
            .candidates
            .iter()
            .filter(|c| c.vehicle_type == "truck")
            .all(|c| c.weight == 1.0));
    }

    #[test]
    fn test_truncate_keeps_heaviest_in_order() {
        let (lot, plan, config) = setup(2.0);
        let catalog = VehicleCatalog::default();
        let types = [catalog.get("van").unwrap(), catalog.get("truck").unwrap()];
        let mut set = CandidateGenerator::new(&config).generate(&lot, &plan, &types);
        let trucks = set.count_for("truck");
        assert!(trucks > 0 && set.count_for("van") > 0);

        let dropped = set.truncate(trucks);
        assert!(dropped > 0);
        assert_eq!(set.len(), trucks);
        // Trucks earn more than vans, so only trucks survive.
        assert_eq!(set.count_for("truck"), trucks);
        assert_eq!(set.count_for("van"), 0);
        for (i, c) in set.candidates.iter().enumerate() {
            assert_eq!(c.id as usize, i);
        }
        assert_eq!(set.truncate(trucks), 0);
    }

    #[test]
    fn test_expired_deadline_stops_generation() {
        let (lot, plan, config) = setup(2.0);
        let catalog = VehicleCatalog::default();
        let types: Vec<&VehicleSpec> = catalog.iter().collect();
        let set = CandidateGenerator::new(&config)
            .with_deadline(Instant::now())
            .generate(&lot, &plan, &types);
        assert!(set.timed_out);
        assert!(set.is_empty());
        assert!(set.warnings.is_empty());
    }

    #[test]
    fn test_coarser_resolution_yields_fewer_candidates() {
        let (lot, plan, config) = setup(1.0);
        let catalog = VehicleCatalog::default();
        let types = [catalog.get("van").unwrap()];
        let fine = CandidateGenerator::new(&config).generate(&lot, &plan, &types);
        let coarse = CandidateGenerator::new(&config)
            .with_resolution(3.0)
            .generate(&lot, &plan, &types);
        assert!(!coarse.timed_out);
        assert!(coarse.len() > 0 && coarse.len() < fine.len());
    }

    #[test]
    fn test_inaccessible_candidates_flagged_when_not_required() {
        // Wide lot with the lane along one edge leaves far placements.
        let lot = Polygon2D::rectangle(120.0, 60.0).unwrap();
        let plan = LaneGenerator::new(LaneSpec::default())
            .generate(&lot, (0.0, 5.0), Some((120.0, 5.0)))
            .unwrap();
        let catalog = VehicleCatalog::default();
        let van = [catalog.get("van").unwrap()];

        let strict = OptimizationConfig::new()
            .with_grid_resolution(2.0)
            .with_rules(lotplan_core::ComplianceRules::default().with_fire_access(None));
        let lenient = strict.clone().with_require_access(false);

        let a = CandidateGenerator::new(&strict).generate(&lot, &plan, &van);
        let b = CandidateGenerator::new(&lenient).generate(&lot, &plan, &van);
        assert!(a.inaccessible > 0);
        assert!(a.candidates.iter().all(|c| c.accessible));
        assert!(b.len() > a.len());
        assert!(b.candidates.iter().any(|c| !c.accessible));
    }
}
