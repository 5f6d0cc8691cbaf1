//! # Lotplan Core
//!
//! Shared data model for the lotplan parking layout optimizer.
//!
//! This crate holds everything the planning algorithms exchange but do not
//! compute themselves:
//!
//! - **Geometry values**: [`Polygon2D`], [`OrientedRect`], [`AABB2D`]
//! - **Configuration**: [`OptimizationConfig`], [`Goal`], [`LaneSpec`], [`VehicleMix`]
//! - **Injected collaborators**: [`VehicleCatalog`], [`ComplianceRules`]
//! - **Exact solver settings**: [`ExactConfig`], [`SolutionStatus`]
//! - **Results**: [`OptimizationResult`], [`Layout`], [`SolveStats`]
//!
//! ## Configuration
//!
//! ```rust
//! use lotplan_core::{Goal, LaneType, OptimizationConfig};
//!
//! let config = OptimizationConfig::new()
//!     .with_goal(Goal::MaximizeCount)
//!     .with_lane_type(LaneType::TwoWay)
//!     .with_grid_resolution(1.0)
//!     .with_time_limit(10_000);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod exact;
pub mod geometry;
pub mod result;
pub mod robust;
pub mod rules;
pub mod solver;
pub mod vehicle;

// Re-exports
pub use error::{Error, GeometryError, Result};
pub use exact::{ExactConfig, ExactResult, SolutionStatus};
pub use geometry::{OrientedRect, Point2, Polygon2D, AABB2D};
pub use result::{
    LaneLayout, Layout, OptimizationResult, OptimizationStatus, ParkingSpace, SolveStats,
};
pub use rules::ComplianceRules;
pub use solver::{
    Goal, LaneMode, LaneSpec, LaneType, MixBound, OptimizationConfig, ProgressCallback,
    VehicleMix,
};
pub use vehicle::{VehicleCatalog, VehicleSpec};
