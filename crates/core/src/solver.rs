//! Optimization configuration: goals, lanes, vehicle mix and progress reporting.

use crate::error::Error;
use crate::exact::ExactConfig;
use crate::rules::ComplianceRules;
use crate::vehicle::VehicleCatalog;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optimization objective. Exactly one is active per run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Goal {
    /// Maximize expected revenue (price times occupancy).
    #[default]
    MaximizeRevenue,
    /// Maximize the number of spaces.
    MaximizeCount,
    /// Maximize the number of spaces of one vehicle type.
    MaximizeType(String),
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaximizeRevenue => write!(f, "maximize_revenue"),
            Self::MaximizeCount => write!(f, "maximize_count"),
            Self::MaximizeType(id) => write!(f, "maximize_type:{}", id),
        }
    }
}

impl FromStr for Goal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "maximize_revenue" | "revenue" => Ok(Self::MaximizeRevenue),
            "maximize_count" | "count" => Ok(Self::MaximizeCount),
            "maximize_trucks" => Ok(Self::MaximizeType("truck".to_string())),
            other => match other.strip_prefix("maximize_type:") {
                Some(id) if !id.is_empty() => Ok(Self::MaximizeType(id.to_string())),
                _ => Err(Error::InvalidInput(format!(
                    "unknown optimization goal '{}' (expected maximize_revenue, \
                     maximize_count, maximize_trucks or maximize_type:<id>)",
                    other
                ))),
            },
        }
    }
}

/// Lane traffic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LaneType {
    #[default]
    OneWay,
    TwoWay,
}

impl fmt::Display for LaneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneWay => write!(f, "oneway"),
            Self::TwoWay => write!(f, "twoway"),
        }
    }
}

impl FromStr for LaneType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oneway" | "one-way" | "one_way" => Ok(Self::OneWay),
            "twoway" | "two-way" | "two_way" => Ok(Self::TwoWay),
            other => Err(Error::InvalidInput(format!(
                "unknown lane type '{}' (expected oneway or twoway)",
                other
            ))),
        }
    }
}

/// Where the access lane runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LaneMode {
    /// A single lane from entry to exit through the interior.
    #[default]
    Central,
    /// A ring lane along the boundary with parking in the middle.
    Perimeter,
}

/// Lane dimensions. The corridor is `travel_width + buffer` wide.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneSpec {
    pub lane_type: LaneType,
    pub travel_width: f64,
    /// Extra maneuvering space.
    pub buffer: f64,
}

impl Default for LaneSpec {
    fn default() -> Self {
        Self::for_type(LaneType::OneWay)
    }
}

impl LaneSpec {
    /// Default dimensions for a traffic mode: one-way 5+1, two-way 7+2.
    pub fn for_type(lane_type: LaneType) -> Self {
        match lane_type {
            LaneType::OneWay => Self {
                lane_type,
                travel_width: 5.0,
                buffer: 1.0,
            },
            LaneType::TwoWay => Self {
                lane_type,
                travel_width: 7.0,
                buffer: 2.0,
            },
        }
    }

    pub fn with_travel_width(mut self, width: f64) -> Self {
        self.travel_width = width;
        self
    }

    pub fn with_buffer(mut self, buffer: f64) -> Self {
        self.buffer = buffer;
        self
    }

    /// Total corridor width.
    pub fn total_width(&self) -> f64 {
        self.travel_width + self.buffer
    }
}

/// Inclusive bounds on the number of spaces of one vehicle type.
///
/// Signed so that malformed requests can be reported rather than rejected at
/// deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixBound {
    pub min: i64,
    pub max: i64,
}

impl MixBound {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Minimum as a count (negative bounds clamp to 0).
    pub fn min_count(&self) -> usize {
        self.min.max(0) as usize
    }

    /// Maximum as a count (negative bounds clamp to 0).
    pub fn max_count(&self) -> usize {
        self.max.max(0) as usize
    }
}

/// Per-type minimum/maximum constraints, keyed by vehicle type id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleMix {
    bounds: BTreeMap<String, MixBound>,
}

impl VehicleMix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bound(mut self, vehicle_type: impl Into<String>, min: i64, max: i64) -> Self {
        self.bounds
            .insert(vehicle_type.into(), MixBound::new(min, max));
        self
    }

    pub fn get(&self, vehicle_type: &str) -> Option<MixBound> {
        self.bounds.get(vehicle_type).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MixBound)> {
        self.bounds.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn contains(&self, vehicle_type: &str) -> bool {
        self.bounds.contains_key(vehicle_type)
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Checks every entry against the catalog and returns one message per problem.
    pub fn validate(&self, catalog: &VehicleCatalog) -> Vec<String> {
        let mut errors = Vec::new();
        for (vehicle_type, bound) in &self.bounds {
            if !catalog.contains(vehicle_type) {
                errors.push(format!("Unknown vehicle type in mix: {}", vehicle_type));
                continue;
            }
            if bound.min < 0 || bound.max < 0 {
                errors.push(format!(
                    "Vehicle mix for {} cannot be negative ({}, {})",
                    vehicle_type, bound.min, bound.max
                ));
            }
            if bound.min > bound.max {
                errors.push(format!(
                    "Vehicle mix for {} has min > max ({} > {})",
                    vehicle_type, bound.min, bound.max
                ));
            }
        }
        errors
    }
}

impl<S: Into<String>> FromIterator<(S, (i64, i64))> for VehicleMix {
    fn from_iter<I: IntoIterator<Item = (S, (i64, i64))>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |mix, (id, (min, max))| mix.with_bound(id, min, max))
    }
}

/// Configuration for one optimization run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationConfig {
    pub goal: Goal,

    /// Wall-clock budget for the whole run in milliseconds.
    pub time_limit_ms: u64,

    pub lane: LaneSpec,
    pub lane_mode: LaneMode,

    /// Candidate grid spacing in distance units.
    pub grid_resolution: f64,

    /// Allowed footprint orientations in degrees.
    pub orientations: Vec<f64>,

    /// Ceiling on generated candidates. Above it the grid is coarsened, and
    /// as a last resort the lowest-weight candidates are dropped.
    pub max_candidates: usize,

    /// Types to place when no vehicle mix is given. `None` means every catalog type.
    pub vehicle_types: Option<Vec<String>>,

    /// Expected occupancy used to turn prices into revenue.
    pub occupancy: f64,

    /// Maximum distance an entry or exit point may be moved onto the boundary.
    pub snap_tolerance: f64,

    /// Reject candidates that fail the accessibility check instead of flagging them.
    pub require_access: bool,

    pub rules: ComplianceRules,
    pub exact: ExactConfig,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            goal: Goal::default(),
            time_limit_ms: 30_000,
            lane: LaneSpec::default(),
            lane_mode: LaneMode::default(),
            grid_resolution: 0.5,
            orientations: vec![0.0, 90.0],
            max_candidates: 5_000,
            vehicle_types: None,
            occupancy: 0.75,
            snap_tolerance: 5.0,
            require_access: true,
            rules: ComplianceRules::default(),
            exact: ExactConfig::default(),
        }
    }
}

impl OptimizationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    /// Sets the time limit in milliseconds. The exact solver receives whatever
    /// remains after lane and candidate generation.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Selects a lane type with its default dimensions.
    pub fn with_lane_type(mut self, lane_type: LaneType) -> Self {
        self.lane = LaneSpec::for_type(lane_type);
        self
    }

    pub fn with_lane(mut self, lane: LaneSpec) -> Self {
        self.lane = lane;
        self
    }

    pub fn with_lane_mode(mut self, mode: LaneMode) -> Self {
        self.lane_mode = mode;
        self
    }

    pub fn with_grid_resolution(mut self, resolution: f64) -> Self {
        self.grid_resolution = resolution;
        self
    }

    /// Sets allowed orientations. Duplicates are removed and the order is normalized.
    pub fn with_orientations(mut self, orientations: Vec<f64>) -> Self {
        let mut orientations = orientations;
        orientations.sort_by(|a, b| a.total_cmp(b));
        orientations.dedup();
        self.orientations = orientations;
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    pub fn with_vehicle_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.vehicle_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = occupancy.clamp(0.0, 1.0);
        self
    }

    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance.max(0.0);
        self
    }

    pub fn with_require_access(mut self, require: bool) -> Self {
        self.require_access = require;
        self
    }

    pub fn with_rules(mut self, rules: ComplianceRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_exact(mut self, exact: ExactConfig) -> Self {
        self.exact = exact;
        self
    }

    /// Checks configuration values that do not depend on the request.
    pub fn validate(&self, catalog: &VehicleCatalog) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.grid_resolution.is_finite() && self.grid_resolution > 0.0) {
            errors.push(format!(
                "Grid resolution must be positive, got {}",
                self.grid_resolution
            ));
        }
        if self.max_candidates == 0 {
            errors.push("Candidate ceiling must be at least 1".to_string());
        }
        if self.orientations.is_empty() {
            errors.push("At least one orientation is required".to_string());
        }
        if self.orientations.iter().any(|o| !o.is_finite()) {
            errors.push("Orientations must be finite angles".to_string());
        }
        if let Goal::MaximizeType(id) = &self.goal {
            if !catalog.contains(id) {
                errors.push(format!("Unknown vehicle type in goal: {}", id));
            }
        }
        if let Some(types) = &self.vehicle_types {
            for id in types.iter().filter(|id| !catalog.contains(id)) {
                errors.push(format!("Unknown vehicle type: {}", id));
            }
        }

        errors.extend(self.rules.check_lane(&self.lane));
        errors.extend(self.rules.check_catalog(catalog));
        errors
    }
}

/// Progress callback. Receives one human-readable message per stage boundary.
///
/// May be invoked from solver threads, so implementations must not block.
pub type ProgressCallback = Box<dyn Fn(&str) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_from_str() {
        assert_eq!("maximize_revenue".parse::<Goal>().unwrap(), Goal::MaximizeRevenue);
        assert_eq!("maximize_count".parse::<Goal>().unwrap(), Goal::MaximizeCount);
        assert_eq!(
            "maximize_trucks".parse::<Goal>().unwrap(),
            Goal::MaximizeType("truck".to_string())
        );
        assert_eq!(
            "maximize_type:ev".parse::<Goal>().unwrap(),
            Goal::MaximizeType("ev".to_string())
        );
        assert!("maximize_type:".parse::<Goal>().is_err());
        assert!("fastest".parse::<Goal>().is_err());
    }

    #[test]
    fn test_goal_display_round_trip() {
        let goal = Goal::MaximizeType("van".to_string());
        assert_eq!(goal.to_string().parse::<Goal>().unwrap(), goal);
    }

    #[test]
    fn test_lane_spec_defaults() {
        let one = LaneSpec::for_type(LaneType::OneWay);
        assert_eq!(one.total_width(), 6.0);
        let two = LaneSpec::for_type(LaneType::TwoWay);
        assert_eq!(two.total_width(), 9.0);
        assert_eq!("two-way".parse::<LaneType>().unwrap(), LaneType::TwoWay);
        assert!("diagonal".parse::<LaneType>().is_err());
    }

    #[test]
    fn test_vehicle_mix_validation() {
        let catalog = VehicleCatalog::default();

        let mix: VehicleMix = [("truck", (5, 3))].into_iter().collect();
        let errors = mix.validate(&catalog);
        assert_eq!(errors, vec!["Vehicle mix for truck has min > max (5 > 3)"]);

        let mix = VehicleMix::new().with_bound("bus", 1, 2);
        assert_eq!(mix.validate(&catalog), vec!["Unknown vehicle type in mix: bus"]);

        let mix = VehicleMix::new().with_bound("van", -1, 4);
        assert_eq!(mix.validate(&catalog).len(), 1);
        assert!(mix.validate(&catalog)[0].contains("cannot be negative"));

        let ok = VehicleMix::new().with_bound("truck", 5, 50).with_bound("ev", 2, 10);
        assert!(ok.validate(&catalog).is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = OptimizationConfig::new()
            .with_goal(Goal::MaximizeCount)
            .with_time_limit(5_000)
            .with_lane_type(LaneType::TwoWay)
            .with_grid_resolution(2.0)
            .with_orientations(vec![90.0, 0.0, 90.0])
            .with_max_candidates(800)
            .with_occupancy(1.5);

        assert_eq!(config.goal, Goal::MaximizeCount);
        assert_eq!(config.time_limit_ms, 5_000);
        assert_eq!(config.lane.total_width(), 9.0);
        assert_eq!(config.orientations, vec![0.0, 90.0]);
        assert_eq!(config.max_candidates, 800);
        assert_eq!(config.occupancy, 1.0);
    }

    #[test]
    fn test_config_validate() {
        let catalog = VehicleCatalog::default();
        assert!(OptimizationConfig::default().validate(&catalog).is_empty());

        let bad = OptimizationConfig::default()
            .with_grid_resolution(0.0)
            .with_goal(Goal::MaximizeType("bus".to_string()))
            .with_lane(LaneSpec::for_type(LaneType::TwoWay).with_travel_width(4.0));
        let errors = bad.validate(&catalog);
        assert_eq!(errors.len(), 3, "{:?}", errors);

        let no_room = OptimizationConfig::default().with_max_candidates(0);
        assert_eq!(no_room.validate(&catalog), vec!["Candidate ceiling must be at least 1"]);
    }
}
