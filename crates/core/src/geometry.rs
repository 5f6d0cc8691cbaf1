//! Core geometry value types.
//!
//! Rings are stored open (the closing vertex is not repeated). A validated
//! [`Polygon2D`] always has a counter-clockwise exterior and clockwise holes,
//! so downstream boolean operations can use a non-zero fill rule without
//! re-orienting anything.

use crate::error::GeometryError;
use crate::robust::find_self_intersection;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point `(x, y)`.
pub type Point2 = (f64, f64);

/// Distance below which two coordinates are treated as the same point.
pub const DUPLICATE_EPSILON: f64 = 1e-9;

/// Computes the signed area of an open ring (positive when counter-clockwise).
pub fn signed_area(ring: &[Point2]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        area += x1 * y2 - x2 * y1;
    }
    area / 2.0
}

/// Removes consecutive duplicates and a repeated closing vertex.
pub fn normalize_ring(ring: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(ring.len());
    for &p in ring {
        let dup = out.last().is_some_and(|&q| {
            (q.0 - p.0).abs() <= DUPLICATE_EPSILON && (q.1 - p.1).abs() <= DUPLICATE_EPSILON
        });
        if !dup {
            out.push(p);
        }
    }
    while out.len() > 1 {
        let first = out[0];
        let last = out[out.len() - 1];
        if (first.0 - last.0).abs() <= DUPLICATE_EPSILON
            && (first.1 - last.1).abs() <= DUPLICATE_EPSILON
        {
            out.pop();
        } else {
            break;
        }
    }
    out
}

/// Validates a single ring: finite coordinates, at least three distinct
/// vertices, non-zero area and no self-intersection.
pub fn validate_ring(ring: &[Point2]) -> std::result::Result<(), GeometryError> {
    for (index, &(x, y)) in ring.iter().enumerate() {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::NonFinite { index });
        }
    }

    let normalized = normalize_ring(ring);
    if normalized.len() < 3 {
        return Err(GeometryError::TooFewVertices {
            found: normalized.len(),
        });
    }

    if signed_area(&normalized).abs() <= DUPLICATE_EPSILON {
        return Err(GeometryError::ZeroArea);
    }

    if let Some((first, second)) = find_self_intersection(&normalized) {
        return Err(GeometryError::SelfIntersecting { first, second });
    }

    Ok(())
}

/// A simple polygon with optional holes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon2D {
    exterior: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
}

impl Polygon2D {
    /// Creates a validated polygon without holes.
    pub fn new(exterior: Vec<Point2>) -> std::result::Result<Self, GeometryError> {
        Self::with_holes(exterior, Vec::new())
    }

    /// Creates a validated polygon with holes.
    pub fn with_holes(
        exterior: Vec<Point2>,
        holes: Vec<Vec<Point2>>,
    ) -> std::result::Result<Self, GeometryError> {
        validate_ring(&exterior)?;
        for hole in &holes {
            validate_ring(hole)?;
        }
        Ok(Self::from_rings_unchecked(exterior, holes))
    }

    /// Builds a polygon from rings produced by a boolean operation.
    ///
    /// Rings are normalized and re-oriented but not checked for
    /// self-intersection. Degenerate holes are dropped.
    pub fn from_rings_unchecked(exterior: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        let mut exterior = normalize_ring(&exterior);
        if signed_area(&exterior) < 0.0 {
            exterior.reverse();
        }

        let holes = holes
            .iter()
            .map(|h| normalize_ring(h))
            .filter(|h| h.len() >= 3 && signed_area(h).abs() > DUPLICATE_EPSILON)
            .map(|mut h| {
                if signed_area(&h) > 0.0 {
                    h.reverse();
                }
                h
            })
            .collect();

        Self { exterior, holes }
    }

    /// Creates an axis-aligned rectangle with its lower-left corner at the origin.
    pub fn rectangle(width: f64, height: f64) -> std::result::Result<Self, GeometryError> {
        Self::new(vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)])
    }

    /// Returns the exterior ring (counter-clockwise, open).
    pub fn exterior(&self) -> &[Point2] {
        &self.exterior
    }

    /// Returns the holes (clockwise, open).
    pub fn holes(&self) -> &[Vec<Point2>] {
        &self.holes
    }

    /// Returns true if the polygon has holes.
    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Iterates over all rings, exterior first.
    pub fn rings(&self) -> impl Iterator<Item = &[Point2]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Iterates over every edge of every ring as `(start, end)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        self.rings().flat_map(|ring| {
            let n = ring.len();
            (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
        })
    }

    /// Net area: exterior minus holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        (signed_area(&self.exterior).abs() - holes).max(0.0)
    }

    /// Length of the exterior ring.
    pub fn perimeter(&self) -> f64 {
        let n = self.exterior.len();
        (0..n)
            .map(|i| {
                let (x1, y1) = self.exterior[i];
                let (x2, y2) = self.exterior[(i + 1) % n];
                ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
            })
            .sum()
    }

    /// Axis-aligned bounding box of the exterior.
    pub fn aabb(&self) -> AABB2D {
        AABB2D::from_points(&self.exterior).unwrap_or_default()
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl AABB2D {
    /// Creates a bounding box from explicit bounds.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Computes the bounding box of a set of points. Returns `None` when empty.
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let (&(x0, y0), rest) = points.split_first()?;
        let mut aabb = Self::new(x0, y0, x0, y0);
        for &(x, y) in rest {
            aabb.min_x = aabb.min_x.min(x);
            aabb.min_y = aabb.min_y.min(y);
            aabb.max_x = aabb.max_x.max(x);
            aabb.max_y = aabb.max_y.max(y);
        }
        Some(aabb)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grows the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    /// Returns true if the two boxes share any point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// A rectangle centered at `center`, rotated about its center.
///
/// `length` runs along the rotated x axis and `width` along the rotated y axis,
/// so a 0 degree footprint is `length` wide horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientedRect {
    pub center: Point2,
    pub length: f64,
    pub width: f64,
    /// Rotation in degrees, counter-clockwise.
    pub rotation: f64,
}

impl OrientedRect {
    pub fn new(center: Point2, length: f64, width: f64, rotation: f64) -> Self {
        Self {
            center,
            length,
            width,
            rotation,
        }
    }

    /// Corner points in counter-clockwise order.
    pub fn corners(&self) -> [Point2; 4] {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let hl = self.length / 2.0;
        let hw = self.width / 2.0;
        let (cx, cy) = self.center;
        let local = [(-hl, -hw), (hl, -hw), (hl, hw), (-hl, hw)];
        local.map(|(lx, ly)| (cx + lx * cos - ly * sin, cy + lx * sin + ly * cos))
    }

    /// Unit axes of the rectangle (length direction, width direction).
    pub fn axes(&self) -> [Point2; 2] {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        [(cos, sin), (-sin, cos)]
    }

    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    pub fn aabb(&self) -> AABB2D {
        AABB2D::from_points(&self.corners()).unwrap_or_default()
    }

    /// The footprint as a polygon.
    pub fn to_polygon(&self) -> Polygon2D {
        Polygon2D::from_rings_unchecked(self.corners().to_vec(), Vec::new())
    }
}
