//! Optimization result representation.

use crate::geometry::{OrientedRect, Point2, Polygon2D};
use crate::solver::LaneType;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Final status of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptimizationStatus {
    /// Proven best layout.
    Optimal,
    /// Valid layout, optimality not proven.
    Feasible,
    /// Constraints cannot be satisfied.
    Infeasible,
    /// Input rejected before any geometry work.
    Invalid,
    /// Time budget exhausted; the layout is the best found.
    Timeout,
}

impl OptimizationStatus {
    /// True for statuses that carry a usable layout.
    pub fn has_layout(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible | Self::Timeout)
    }
}

impl fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Feasible => write!(f, "feasible"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Invalid => write!(f, "invalid"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// A selected parking space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParkingSpace {
    /// 1-based id in layout order.
    pub id: u32,
    /// Display label such as `T-3`.
    pub label: String,
    pub vehicle_type: String,
    pub footprint: OrientedRect,
    /// Expected annual revenue.
    pub revenue: f64,
}

impl ParkingSpace {
    pub fn center(&self) -> Point2 {
        self.footprint.center
    }

    pub fn rotation(&self) -> f64 {
        self.footprint.rotation
    }

    pub fn corners(&self) -> [Point2; 4] {
        self.footprint.corners()
    }
}

/// The generated access lane.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneLayout {
    pub lane_type: LaneType,
    /// Corridor width (travel width plus buffer).
    pub width: f64,
    /// Centerline from entry to exit.
    pub centerline: Vec<Point2>,
    /// Corridor clipped to the boundary. May be several pieces.
    pub corridor: Vec<Polygon2D>,
}

/// Spaces and lanes placed on a lot.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    pub boundary: Vec<Point2>,
    pub spaces: Vec<ParkingSpace>,
    pub lanes: Vec<LaneLayout>,
    pub zones: Vec<Polygon2D>,
}

impl Layout {
    /// Number of spaces per vehicle type.
    pub fn count_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for space in &self.spaces {
            *counts.entry(space.vehicle_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn total_revenue(&self) -> f64 {
        self.spaces.iter().map(|s| s.revenue).sum()
    }
}

/// Statistics about a run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveStats {
    pub space_count: usize,
    /// Expected annual revenue of the selected spaces.
    pub estimated_revenue: f64,
    pub elapsed_ms: u64,
    pub total_candidates: usize,
    pub total_conflicts: usize,
    pub space_counts: BTreeMap<String, usize>,
    pub lot_area: f64,
    pub parking_area: f64,
    /// Name of the solver whose selection was returned.
    pub solver: Option<String>,
}

/// Result of an optimization run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult {
    pub status: OptimizationStatus,
    pub layout: Layout,
    pub stats: SolveStats,
    pub warnings: Vec<String>,
}

impl OptimizationResult {
    /// A result for input rejected during validation.
    pub fn invalid(warnings: Vec<String>) -> Self {
        Self {
            status: OptimizationStatus::Invalid,
            layout: Layout::default(),
            stats: SolveStats::default(),
            warnings,
        }
    }

    /// Returns true if the run produced a usable layout.
    pub fn is_success(&self) -> bool {
        self.status.has_layout()
    }

    pub fn space_count(&self) -> usize {
        self.layout.spaces.len()
    }

    pub fn estimated_revenue(&self) -> f64 {
        self.stats.estimated_revenue
    }

    /// Returns true if any warning contains `needle`.
    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(id: u32, vehicle_type: &str, revenue: f64) -> ParkingSpace {
        ParkingSpace {
            id,
            label: format!("S-{}", id),
            vehicle_type: vehicle_type.to_string(),
            footprint: OrientedRect::new((0.0, 0.0), 10.0, 3.0, 0.0),
            revenue,
        }
    }

    #[test]
    fn test_layout_counts_and_revenue() {
        let layout = Layout {
            spaces: vec![space(1, "truck", 100.0), space(2, "van", 50.0), space(3, "truck", 100.0)],
            ..Default::default()
        };
        let counts = layout.count_by_type();
        assert_eq!(counts.get("truck"), Some(&2));
        assert_eq!(counts.get("van"), Some(&1));
        assert_eq!(layout.total_revenue(), 250.0);
    }

    #[test]
    fn test_invalid_result() {
        let result = OptimizationResult::invalid(vec!["Unknown vehicle type in mix: bus".into()]);
        assert_eq!(result.status, OptimizationStatus::Invalid);
        assert!(!result.is_success());
        assert!(result.has_warning("bus"));
        assert_eq!(result.space_count(), 0);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(OptimizationStatus::Timeout.to_string(), "timeout");
        assert!(OptimizationStatus::Timeout.has_layout());
        assert!(!OptimizationStatus::Infeasible.has_layout());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_result_serializes() {
        let result = OptimizationResult::invalid(vec!["bad".into()]);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"Invalid\""));
    }
}
