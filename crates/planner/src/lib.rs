//! # Lotplan Planner
//!
//! Automatic parking space placement for truck and vehicle lots.
//!
//! Given a lot boundary and an entry point, the planner lays out an access
//! lane, enumerates candidate space placements on a grid, and selects a
//! conflict-free subset that maximizes revenue, space count, or the count of
//! one vehicle type.
//!
//! ## Features
//!
//! - Polygon boolean operations and buffering on arbitrary simple lots
//! - Straight lanes for convex lots, skeleton-routed lanes for concave ones
//! - Optional perimeter lanes
//! - Deterministic parallel candidate generation
//! - R*-tree pruned conflict graph with a minimum spacing
//! - Greedy selection with vehicle-mix repair
//! - Exact 0-1 selection through HiGHS (`milp` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use lotplan_core::{Goal, OptimizationConfig, VehicleMix};
//! use lotplan_planner::{OptimizationRequest, Optimizer};
//!
//! let config = OptimizationConfig::new()
//!     .with_goal(Goal::MaximizeRevenue)
//!     .with_grid_resolution(2.0);
//!
//! let request = OptimizationRequest::new(
//!     vec![(0.0, 0.0), (50.0, 0.0), (50.0, 100.0), (0.0, 100.0)],
//!     (25.0, 0.0),
//! )
//! .with_exit((25.0, 100.0))
//! .with_vehicle_mix(VehicleMix::new().with_bound("truck", 2, 40).with_bound("van", 0, 10));
//!
//! let result = Optimizer::new(config).optimize(&request).unwrap();
//! println!(
//!     "{}: {} spaces, {:.0}/year",
//!     result.status,
//!     result.space_count(),
//!     result.estimated_revenue()
//! );
//! ```
//!
//! ## Quick Estimate
//!
//! ```rust
//! use lotplan_core::LaneType;
//! use lotplan_planner::quick_estimate;
//!
//! let estimate = quick_estimate(
//!     &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
//!     LaneType::OneWay,
//! )
//! .unwrap();
//! assert!(estimate.estimated_spaces > 0);
//! ```

pub mod candidate;
pub mod conflict;
pub mod geometry;
pub mod greedy;
pub mod lane;
pub mod milp_solver;
pub mod optimizer;
pub mod selection;

pub use candidate::{Candidate, CandidateGenerator, CandidateSet};
pub use conflict::{CandidateIndex, ConflictGraph};
pub use geometry::BoundingRect;
pub use greedy::{first_fit, GreedySolver};
pub use lane::{
    estimate_lane_requirements, optimal_lane_direction, LaneGenerator, LanePlan,
    LaneRequirements,
};
pub use milp_solver::{is_milp_available, MilpSolver};
pub use optimizer::{quick_estimate, validate_layout, OptimizationRequest, Optimizer, QuickEstimate};
pub use selection::{Selection, SelectionProblem, SelectionSolver};

// Re-export core types
pub use lotplan_core::{
    Error, ExactConfig, Goal, LaneMode, LaneSpec, LaneType, OptimizationConfig,
    OptimizationResult, OptimizationStatus, Result, VehicleCatalog, VehicleMix, VehicleSpec,
};
