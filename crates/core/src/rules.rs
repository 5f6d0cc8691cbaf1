//! Compliance rules consumed by the optimizer.

use crate::solver::{LaneSpec, LaneType};
use crate::vehicle::VehicleCatalog;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Regulatory limits that shape candidate generation and conflict detection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComplianceRules {
    /// Minimum clear gap between two parked vehicles.
    pub min_spacing: f64,
    pub min_oneway_travel_width: f64,
    pub min_twoway_travel_width: f64,
    /// Maximum distance from a space center to the boundary or lane for fire
    /// access. `None` disables the check.
    pub fire_access_max_distance: Option<f64>,
    /// Parking zones smaller than this are discarded.
    pub min_zone_area: f64,
}

impl Default for ComplianceRules {
    fn default() -> Self {
        Self {
            min_spacing: 1.0,
            min_oneway_travel_width: 5.0,
            min_twoway_travel_width: 7.0,
            fire_access_max_distance: Some(10.0),
            min_zone_area: 30.0,
        }
    }
}

impl ComplianceRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_spacing(mut self, spacing: f64) -> Self {
        self.min_spacing = spacing.max(0.0);
        self
    }

    pub fn with_fire_access(mut self, max_distance: Option<f64>) -> Self {
        self.fire_access_max_distance = max_distance;
        self
    }

    pub fn with_min_zone_area(mut self, area: f64) -> Self {
        self.min_zone_area = area.max(0.0);
        self
    }

    /// Minimum travel width for a traffic mode.
    pub fn min_travel_width(&self, lane_type: LaneType) -> f64 {
        match lane_type {
            LaneType::OneWay => self.min_oneway_travel_width,
            LaneType::TwoWay => self.min_twoway_travel_width,
        }
    }

    /// Reports lane dimensions that break the rules.
    pub fn check_lane(&self, lane: &LaneSpec) -> Vec<String> {
        let mut errors = Vec::new();
        let min = self.min_travel_width(lane.lane_type);
        if !(lane.travel_width >= min) {
            errors.push(format!(
                "Lane travel width {} is below the {} minimum of {}",
                lane.travel_width, lane.lane_type, min
            ));
        }
        if !(lane.buffer >= 0.0) {
            errors.push(format!("Lane buffer cannot be negative ({})", lane.buffer));
        }
        errors
    }

    /// Reports catalog entries whose default footprint is below its minimum.
    pub fn check_catalog(&self, catalog: &VehicleCatalog) -> Vec<String> {
        catalog
            .iter()
            .filter(|spec| {
                !(spec.default_length >= spec.min_length && spec.default_width >= spec.min_width)
                    || !(spec.default_length > 0.0 && spec.default_width > 0.0)
            })
            .map(|spec| {
                format!(
                    "Vehicle type {} default footprint {}x{} is below its minimum {}x{}",
                    spec.id, spec.default_length, spec.default_width, spec.min_length, spec.min_width
                )
            })
            .collect()
    }
}
