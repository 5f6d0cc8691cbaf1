//! Error types for lotplan.

use thiserror::Error;

/// Result type alias for lotplan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the geometry kernel when an input shape is malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A ring has fewer than three distinct vertices.
    #[error("polygon must have at least 3 distinct vertices, found {found}")]
    TooFewVertices { found: usize },

    /// A coordinate is NaN or infinite.
    #[error("vertex {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    /// The ring encloses no area.
    #[error("polygon has zero area (all vertices are collinear)")]
    ZeroArea,

    /// Two non-adjacent edges cross.
    #[error("polygon is self-intersecting: edge {first} crosses edge {second}")]
    SelfIntersecting { first: usize, second: usize },

    /// A numeric parameter is out of range.
    #[error("invalid geometry parameter: {0}")]
    InvalidParameter(String),
}

/// Errors that abort an optimization run.
#[derive(Debug, Error)]
pub enum Error {
    /// The request or configuration is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The boundary or a derived polygon is geometrically invalid.
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// An entry or exit point is too far from the boundary to be snapped onto it.
    #[error(
        "{role} point {point:.2?} is {distance:.2} units from the lot boundary \
         (snap tolerance {tolerance:.2}); move it onto a boundary edge"
    )]
    UnreachableEntry {
        role: &'static str,
        point: (f64, f64),
        distance: f64,
        tolerance: f64,
    },

    /// The selection solver failed in a way that cannot be degraded to a warning.
    #[error("solver error: {0}")]
    Solver(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_converts() {
        let err: Error = GeometryError::TooFewVertices { found: 2 }.into();
        assert!(matches!(err, Error::Geometry(_)));
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_unreachable_entry_message_names_fix() {
        let err = Error::UnreachableEntry {
            role: "entry",
            point: (100.0, 100.0),
            distance: 42.0,
            tolerance: 5.0,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("entry point (100.00, 100.00)"));
        assert!(msg.contains("move it onto a boundary edge"));
    }
}
