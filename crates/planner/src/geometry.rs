//! Geometry kernel: polygon predicates, boolean operations, buffering and
//! rectangle tests.
//!
//! Boolean operations go through `i_overlay` with a non-zero fill rule;
//! [`Polygon2D`] guarantees counter-clockwise exteriors and clockwise holes so
//! subject and clip contours can be passed straight through. Results are
//! always a `Vec<Polygon2D>` because differences and negative buffers can
//! split a shape into several disjoint parts, or remove it entirely.

use geo::{Area, Centroid, ConvexHull, Coord, LineString, Polygon as GeoPolygon};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use lotplan_core::geometry::{OrientedRect, Point2, Polygon2D};
use lotplan_core::robust::{is_convex_robust, segments_cross_properly, segments_intersect};
use lotplan_core::GeometryError;

/// Tolerance for containment and distance comparisons, in working units.
pub const EPSILON: f64 = 1e-6;

/// Pieces smaller than this are dropped from boolean results.
const MIN_PIECE_AREA: f64 = 1e-6;

/// Segments used to approximate a full circle when buffering.
const ARC_SEGMENTS: usize = 24;

/// Builds a validated polygon from a boundary ring.
pub fn polygon_from_points(points: &[Point2]) -> Result<Polygon2D, GeometryError> {
    Polygon2D::new(points.to_vec())
}

// ============================================================================
// Conversions
// ============================================================================

fn to_geo(polygon: &Polygon2D) -> GeoPolygon<f64> {
    let ring = |r: &[Point2]| LineString::from(r.to_vec());
    GeoPolygon::new(
        ring(polygon.exterior()),
        polygon.holes().iter().map(|h| ring(h.as_slice())).collect(),
    )
}

fn to_contours(polygons: &[Polygon2D]) -> Vec<Vec<[f64; 2]>> {
    polygons
        .iter()
        .flat_map(|p| p.rings())
        .map(|ring| ring.iter().map(|&(x, y)| [x, y]).collect())
        .collect()
}

fn from_shapes(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Polygon2D> {
    shapes
        .into_iter()
        .filter_map(|shape| {
            let mut contours = shape
                .into_iter()
                .map(|c| c.into_iter().map(|[x, y]| (x, y)).collect::<Vec<Point2>>());
            let exterior = contours.next()?;
            let polygon = Polygon2D::from_rings_unchecked(exterior, contours.collect());
            (polygon.exterior().len() >= 3 && polygon.area() > MIN_PIECE_AREA).then_some(polygon)
        })
        .collect()
}

fn overlay(subject: &[Polygon2D], clip: &[Polygon2D], rule: OverlayRule) -> Vec<Polygon2D> {
    let subj = to_contours(subject);
    let clip = to_contours(clip);
    if subj.is_empty() && clip.is_empty() {
        return Vec::new();
    }
    from_shapes(subj.overlay(&clip, rule, FillRule::NonZero))
}

// ============================================================================
// Measures and predicates
// ============================================================================

/// Net area of a polygon (holes subtracted).
pub fn area(polygon: &Polygon2D) -> f64 {
    to_geo(polygon).unsigned_area()
}

/// Total area of a polygon set.
pub fn total_area(polygons: &[Polygon2D]) -> f64 {
    polygons.iter().map(area).sum()
}

/// Area centroid. Falls back to the first vertex for degenerate input.
pub fn centroid(polygon: &Polygon2D) -> Point2 {
    to_geo(polygon)
        .centroid()
        .map(|p| (p.x(), p.y()))
        .unwrap_or_else(|| polygon.exterior().first().copied().unwrap_or((0.0, 0.0)))
}

/// Returns true if the exterior is convex and there are no holes.
pub fn is_convex(polygon: &Polygon2D) -> bool {
    !polygon.has_holes() && is_convex_robust(polygon.exterior())
}

/// Point-in-polygon test. Points within [`EPSILON`] of any edge count as inside.
pub fn contains(polygon: &Polygon2D, point: Point2) -> bool {
    if distance_to_boundary(polygon, point) <= EPSILON {
        return true;
    }
    polygon
        .rings()
        .filter(|ring| ray_crosses_odd(ring, point))
        .count()
        % 2
        == 1
}

fn ray_crosses_odd(ring: &[Point2], (px, py): Point2) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > py) != (yj > py) {
            let x_cross = xi + (py - yi) * (xj - xi) / (yj - yi);
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// ============================================================================
// Distances
// ============================================================================

/// Closest point to `p` on segment `a -> b`.
pub fn closest_point_on_segment(p: Point2, a: Point2, b: Point2) -> Point2 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    (a.0 + t * dx, a.1 + t * dy)
}

#[inline]
pub fn distance(a: Point2, b: Point2) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

pub fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
    distance(p, closest_point_on_segment(p, a, b))
}

/// Shortest distance between two closed segments.
pub fn segment_distance(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    distance_to_segment(a1, b1, b2)
        .min(distance_to_segment(a2, b1, b2))
        .min(distance_to_segment(b1, a1, a2))
        .min(distance_to_segment(b2, a1, a2))
}

/// Distance from `p` to the nearest edge of any ring.
pub fn distance_to_boundary(polygon: &Polygon2D, p: Point2) -> f64 {
    polygon
        .edges()
        .map(|(a, b)| distance_to_segment(p, a, b))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from `p` to the exterior ring only.
pub fn distance_to_exterior(polygon: &Polygon2D, p: Point2) -> f64 {
    ring_edges(polygon.exterior())
        .map(|(a, b)| distance_to_segment(p, a, b))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from `p` to an open polyline.
pub fn distance_to_polyline(p: Point2, polyline: &[Point2]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [only] => distance(p, *only),
        _ => polyline
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Shortest distance from a rectangle footprint to an open polyline.
/// Zero when they touch or the polyline passes through the rectangle.
pub fn rect_polyline_distance(rect: &OrientedRect, polyline: &[Point2]) -> f64 {
    let corners = rect.corners();
    if polyline.iter().any(|&p| point_in_rect(&corners, p, 0.0)) {
        return 0.0;
    }
    if polyline.len() == 1 {
        return ring_edges(&corners)
            .map(|(a, b)| distance_to_segment(polyline[0], a, b))
            .fold(f64::INFINITY, f64::min);
    }
    let mut best = f64::INFINITY;
    for w in polyline.windows(2) {
        for (a, b) in ring_edges(&corners) {
            best = best.min(segment_distance(w[0], w[1], a, b));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}

fn ring_edges(ring: &[Point2]) -> impl Iterator<Item = (Point2, Point2)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Returns true if `p` lies inside the convex CCW quad `corners`, shrunk by `margin`.
fn point_in_rect(corners: &[Point2; 4], p: Point2, margin: f64) -> bool {
    ring_edges(corners).all(|(a, b)| {
        let len = distance(a, b);
        if len <= f64::EPSILON {
            return true;
        }
        let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
        cross / len > margin
    })
}

/// Returns true if the open segment `a -> b` stays inside the polygon: both
/// endpoints are contained, its midpoint is contained and it crosses no edge.
pub fn segment_inside(polygon: &Polygon2D, a: Point2, b: Point2) -> bool {
    let mid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
    contains(polygon, a)
        && contains(polygon, b)
        && contains(polygon, mid)
        && !polygon
            .edges()
            .any(|(e1, e2)| segments_cross_properly(a, b, e1, e2))
}

// ============================================================================
// Boolean operations
// ============================================================================

/// `a - b`. May return zero, one or several polygons.
pub fn difference(a: &[Polygon2D], b: &[Polygon2D]) -> Vec<Polygon2D> {
    if a.is_empty() {
        return Vec::new();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    overlay(a, b, OverlayRule::Difference)
}

/// `a ∩ b`. May return zero, one or several polygons.
pub fn intersection(a: &[Polygon2D], b: &[Polygon2D]) -> Vec<Polygon2D> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    overlay(a, b, OverlayRule::Intersect)
}

/// Union of a polygon set.
pub fn union(polygons: &[Polygon2D]) -> Vec<Polygon2D> {
    match polygons {
        [] => Vec::new(),
        [only] => vec![only.clone()],
        [first, rest @ ..] => overlay(std::slice::from_ref(first), rest, OverlayRule::Union),
    }
}

/// Rectangle of half-width `radius` around segment `a -> b` (flat ends).
pub fn segment_rectangle(a: Point2, b: Point2, radius: f64) -> Option<Polygon2D> {
    let len = distance(a, b);
    if len <= EPSILON || radius <= 0.0 {
        return None;
    }
    let (nx, ny) = (-(b.1 - a.1) / len * radius, (b.0 - a.0) / len * radius);
    Some(Polygon2D::from_rings_unchecked(
        vec![
            (a.0 - nx, a.1 - ny),
            (b.0 - nx, b.1 - ny),
            (b.0 + nx, b.1 + ny),
            (a.0 + nx, a.1 + ny),
        ],
        Vec::new(),
    ))
}

/// Regular polygon approximating a disc.
pub fn disc(center: Point2, radius: f64) -> Option<Polygon2D> {
    if radius <= 0.0 {
        return None;
    }
    let ring = (0..ARC_SEGMENTS)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / ARC_SEGMENTS as f64;
            (center.0 + radius * t.cos(), center.1 + radius * t.sin())
        })
        .collect();
    Some(Polygon2D::from_rings_unchecked(ring, Vec::new()))
}

/// Grows (`distance > 0`) or shrinks (`distance < 0`) a polygon.
///
/// The offset band is the union of a rectangle around every edge and a disc at
/// every vertex (round joins). Shrinking past collapse yields an empty set.
pub fn buffer(polygon: &Polygon2D, distance: f64) -> Result<Vec<Polygon2D>, GeometryError> {
    if !distance.is_finite() {
        return Err(GeometryError::InvalidParameter(format!(
            "buffer distance must be finite, got {}",
            distance
        )));
    }
    if distance.abs() <= EPSILON {
        return Ok(vec![polygon.clone()]);
    }

    let radius = distance.abs();
    let mut band: Vec<Polygon2D> = Vec::new();
    for (a, b) in polygon.edges() {
        band.extend(segment_rectangle(a, b, radius));
        band.extend(disc(a, radius));
    }

    let source = std::slice::from_ref(polygon);
    if distance > 0.0 {
        Ok(overlay(source, &band, OverlayRule::Union))
    } else {
        Ok(difference(source, &band))
    }
}

/// Buffers an open polyline into a corridor of total width `width`.
///
/// Segments get flat sides and interior joints are rounded. Both ends are
/// extended by `extend` along the end segments so the corridor reaches fully
/// across a boundary edge the polyline ends on.
pub fn polyline_corridor(polyline: &[Point2], width: f64, extend: f64) -> Vec<Polygon2D> {
    if polyline.len() < 2 || width <= 0.0 {
        return Vec::new();
    }
    let radius = width / 2.0;
    let mut points = polyline.to_vec();
    let last = points.len() - 1;
    points[0] = extend_point(points[1], points[0], extend);
    points[last] = extend_point(points[last - 1], points[last], extend);

    let mut pieces: Vec<Polygon2D> = points
        .windows(2)
        .filter_map(|w| segment_rectangle(w[0], w[1], radius))
        .collect();
    pieces.extend(points[1..last].iter().filter_map(|&p| disc(p, radius)));
    union(&pieces)
}

/// Moves `to` further along the direction `from -> to` by `amount`.
fn extend_point(from: Point2, to: Point2, amount: f64) -> Point2 {
    let len = distance(from, to);
    if len <= EPSILON || amount <= 0.0 {
        return to;
    }
    (
        to.0 + (to.0 - from.0) / len * amount,
        to.1 + (to.1 - from.1) / len * amount,
    )
}

// ============================================================================
// Rectangles
// ============================================================================

/// Minimum-area enclosing rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRect {
    /// Corner from which `width` and `height` extend.
    pub origin: Point2,
    /// Extent along `angle`.
    pub width: f64,
    /// Extent perpendicular to `angle`.
    pub height: f64,
    /// Orientation in degrees.
    pub angle: f64,
}

impl BoundingRect {
    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn max_dimension(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// Rotating calipers over the convex hull edges.
pub fn minimum_bounding_rectangle(polygon: &Polygon2D) -> BoundingRect {
    let hull = to_geo(polygon).convex_hull();
    let points: Vec<Coord<f64>> = hull.exterior().coords().copied().collect();

    let mut best: Option<(f64, BoundingRect)> = None;
    for w in points.windows(2) {
        let (dx, dy) = (w[1].x - w[0].x, w[1].y - w[0].y);
        if dx.hypot(dy) <= EPSILON {
            continue;
        }
        let theta = dy.atan2(dx);
        let (sin, cos) = theta.sin_cos();

        let (mut min_u, mut min_v) = (f64::INFINITY, f64::INFINITY);
        let (mut max_u, mut max_v) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for c in &points {
            let u = c.x * cos + c.y * sin;
            let v = -c.x * sin + c.y * cos;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let rect_area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().map_or(true, |(a, _)| rect_area < *a - EPSILON) {
            let origin = (min_u * cos - min_v * sin, min_u * sin + min_v * cos);
            best = Some((
                rect_area,
                BoundingRect {
                    origin,
                    width: max_u - min_u,
                    height: max_v - min_v,
                    angle: theta.to_degrees(),
                },
            ));
        }
    }

    best.map(|(_, r)| r).unwrap_or_else(|| {
        let aabb = polygon.aabb();
        BoundingRect {
            origin: (aabb.min_x, aabb.min_y),
            width: aabb.width(),
            height: aabb.height(),
            angle: 0.0,
        }
    })
}

/// Rectangle centered at `(x, y)` rotated about its center.
pub fn oriented_rectangle(x: f64, y: f64, length: f64, width: f64, rotation: f64) -> OrientedRect {
    OrientedRect::new((x, y), length, width, rotation)
}

/// Returns true if the rectangles, each grown by `min_gap / 2`, intersect.
///
/// Equivalently: the rectangles overlap or are closer than `min_gap`.
/// Rectangles exactly `min_gap` apart do not conflict.
pub fn overlap(r1: &OrientedRect, r2: &OrientedRect, min_gap: f64) -> bool {
    let gap = min_gap.max(0.0);
    if !r1.aabb().expand(gap / 2.0).intersects(&r2.aabb().expand(gap / 2.0)) {
        return false;
    }

    let c1 = r1.corners();
    let c2 = r2.corners();
    if interiors_overlap(r1, &c1, r2, &c2) {
        return true;
    }
    gap > 0.0 && rect_distance(&c1, &c2) < gap - EPSILON
}

/// Separating axis test. Touching rectangles do not overlap.
fn interiors_overlap(r1: &OrientedRect, c1: &[Point2; 4], r2: &OrientedRect, c2: &[Point2; 4]) -> bool {
    let project = |corners: &[Point2; 4], (ax, ay): Point2| {
        corners.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, y)| {
            let d = x * ax + y * ay;
            (lo.min(d), hi.max(d))
        })
    };
    r1.axes().into_iter().chain(r2.axes()).all(|axis| {
        let (min1, max1) = project(c1, axis);
        let (min2, max2) = project(c2, axis);
        max1 > min2 + EPSILON && max2 > min1 + EPSILON
    })
}

/// Distance between two disjoint convex quads.
fn rect_distance(c1: &[Point2; 4], c2: &[Point2; 4]) -> f64 {
    let mut best = f64::INFINITY;
    for (a1, a2) in ring_edges(c1) {
        for (b1, b2) in ring_edges(c2) {
            best = best.min(segment_distance(a1, a2, b1, b2));
        }
    }
    best
}

/// Returns true if `rect` lies entirely within `polygon`.
///
/// Every corner and the center must be contained. Additionally no rectangle
/// edge may cross a polygon edge and no polygon vertex may sit strictly inside
/// the rectangle, which catches notches and holes narrower than the footprint.
pub fn fully_contained(rect: &OrientedRect, polygon: &Polygon2D) -> bool {
    let corners = rect.corners();
    if !corners.iter().all(|&c| contains(polygon, c)) || !contains(polygon, rect.center) {
        return false;
    }

    let crosses = ring_edges(&corners).any(|(a, b)| {
        polygon
            .edges()
            .any(|(e1, e2)| segments_cross_properly(a, b, e1, e2))
    });
    if crosses {
        return false;
    }

    !polygon
        .rings()
        .flat_map(|r| r.iter())
        .any(|&v| point_in_rect(&corners, v, EPSILON))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(w: f64, h: f64) -> Polygon2D {
        Polygon2D::rectangle(w, h).unwrap()
    }

    fn l_shape() -> Polygon2D {
        polygon_from_points(&[
            (0.0, 0.0),
            (60.0, 0.0),
            (60.0, 60.0),
            (30.0, 60.0),
            (30.0, 100.0),
            (0.0, 100.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_contains_boundary_counts() {
        let poly = rect(10.0, 10.0);
        assert!(contains(&poly, (5.0, 5.0)));
        assert!(contains(&poly, (10.0, 5.0)));
        assert!(contains(&poly, (10.0 + 5e-7, 5.0)));
        assert!(contains(&poly, (0.0, 0.0)));
        assert!(!contains(&poly, (10.01, 5.0)));
        assert!(!contains(&poly, (-1.0, 5.0)));
    }

    #[test]
    fn test_contains_concave_and_holes() {
        let l = l_shape();
        assert!(contains(&l, (15.0, 90.0)));
        assert!(!contains(&l, (45.0, 90.0)));

        let holed = Polygon2D::with_holes(
            vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
            vec![vec![(40.0, 40.0), (60.0, 40.0), (60.0, 60.0), (40.0, 60.0)]],
        )
        .unwrap();
        assert!(!contains(&holed, (50.0, 50.0)));
        assert!(contains(&holed, (40.0, 50.0)));
        assert!(contains(&holed, (20.0, 50.0)));
    }

    #[test]
    fn test_area_and_centroid() {
        assert_relative_eq!(area(&rect(50.0, 100.0)), 5000.0);
        assert_relative_eq!(area(&l_shape()), 60.0 * 60.0 + 30.0 * 40.0);
        let (cx, cy) = centroid(&rect(50.0, 100.0));
        assert_relative_eq!(cx, 25.0);
        assert_relative_eq!(cy, 50.0);
    }

    #[test]
    fn test_difference_splits_into_parts() {
        let lot = rect(50.0, 100.0);
        let strip = Polygon2D::new(vec![(22.0, -1.0), (28.0, -1.0), (28.0, 101.0), (22.0, 101.0)])
            .unwrap();
        let parts = difference(&[lot], &[strip]);
        assert_eq!(parts.len(), 2);
        assert_relative_eq!(total_area(&parts), 2.0 * 22.0 * 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_can_be_empty() {
        let small = rect(10.0, 10.0);
        let big = Polygon2D::new(vec![(-1.0, -1.0), (11.0, -1.0), (11.0, 11.0), (-1.0, 11.0)])
            .unwrap();
        assert!(difference(&[small], &[big]).is_empty());
    }

    #[test]
    fn test_intersection() {
        let a = rect(10.0, 10.0);
        let b = Polygon2D::new(vec![(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)]).unwrap();
        let parts = intersection(&[a.clone()], &[b]);
        assert_eq!(parts.len(), 1);
        assert_relative_eq!(area(&parts[0]), 25.0, epsilon = 1e-6);

        let far = Polygon2D::new(vec![(20.0, 20.0), (30.0, 20.0), (30.0, 30.0)]).unwrap();
        assert!(intersection(&[a], &[far]).is_empty());
    }

    #[test]
    fn test_buffer_grow_and_shrink() {
        let square = rect(10.0, 10.0);

        let grown = buffer(&square, 1.0).unwrap();
        assert_eq!(grown.len(), 1);
        let grown_area = total_area(&grown);
        // 100 + perimeter * 1 + pi * 1^2, slightly less for the polygonal arcs.
        assert!(grown_area > 140.0 && grown_area < 100.0 + 40.0 + std::f64::consts::PI);

        let shrunk = buffer(&square, -2.0).unwrap();
        assert_relative_eq!(total_area(&shrunk), 36.0, epsilon = 1e-6);

        let collapsed = buffer(&square, -6.0).unwrap();
        assert!(collapsed.is_empty());

        assert!(buffer(&square, f64::NAN).is_err());
    }

    #[test]
    fn test_minimum_bounding_rectangle_rotated_square() {
        let diamond =
            polygon_from_points(&[(5.0, 0.0), (10.0, 5.0), (5.0, 10.0), (0.0, 5.0)]).unwrap();
        let mbr = minimum_bounding_rectangle(&diamond);
        let side = 50.0_f64.sqrt();
        assert_relative_eq!(mbr.width, side, epsilon = 1e-9);
        assert_relative_eq!(mbr.height, side, epsilon = 1e-9);
        assert_relative_eq!(mbr.angle.rem_euclid(90.0), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_minimum_bounding_rectangle_axis_aligned() {
        let mbr = minimum_bounding_rectangle(&rect(5.0, 100.0));
        assert_relative_eq!(mbr.min_dimension(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(mbr.max_dimension(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_overlap_with_gap() {
        let a = oriented_rectangle(0.0, 0.0, 10.0, 2.0, 0.0);
        let touching = oriented_rectangle(10.0, 0.0, 10.0, 2.0, 0.0);
        let one_apart = oriented_rectangle(11.0, 0.0, 10.0, 2.0, 0.0);
        let half_apart = oriented_rectangle(10.5, 0.0, 10.0, 2.0, 0.0);
        let crossing = oriented_rectangle(0.0, 0.0, 10.0, 2.0, 90.0);

        assert!(!overlap(&a, &touching, 0.0));
        assert!(overlap(&a, &touching, 1.0));
        assert!(!overlap(&a, &one_apart, 1.0));
        assert!(overlap(&a, &half_apart, 1.0));
        assert!(overlap(&a, &crossing, 0.0));
    }

    #[test]
    fn test_overlap_rotated_corner_gap() {
        // Diagonal neighbours: corner-to-corner distance decides.
        let a = oriented_rectangle(0.0, 0.0, 2.0, 2.0, 0.0);
        let b = oriented_rectangle(2.5, 2.5, 2.0, 2.0, 0.0);
        // Corners (1,1) and (1.5,1.5) are ~0.707 apart.
        assert!(overlap(&a, &b, 1.0));
        assert!(!overlap(&a, &b, 0.5));
    }

    #[test]
    fn test_fully_contained() {
        let lot = rect(50.0, 100.0);
        let inside = oriented_rectangle(10.0, 10.0, 18.5, 3.5, 0.0);
        let sticking_out = oriented_rectangle(45.0, 10.0, 18.5, 3.5, 0.0);
        let flush = oriented_rectangle(9.25, 1.75, 18.5, 3.5, 0.0);

        assert!(fully_contained(&inside, &lot));
        assert!(!fully_contained(&sticking_out, &lot));
        assert!(fully_contained(&flush, &lot));
    }

    #[test]
    fn test_fully_contained_rejects_concave_notch() {
        // Corners and center inside the L but the rectangle spans the notch.
        let l = l_shape();
        let across = oriented_rectangle(35.0, 65.0, 40.0, 4.0, 45.0);
        assert!(!fully_contained(&across, &l));

        let holed = Polygon2D::with_holes(
            vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
            vec![vec![(48.0, 48.0), (52.0, 48.0), (52.0, 52.0), (48.0, 52.0)]],
        )
        .unwrap();
        let over_hole = oriented_rectangle(50.0, 45.0, 30.0, 20.0, 0.0);
        assert!(!fully_contained(&over_hole, &holed));
    }

    #[test]
    fn test_rect_polyline_distance() {
        let r = oriented_rectangle(0.0, 0.0, 10.0, 2.0, 0.0);
        let line = vec![(-20.0, 5.0), (20.0, 5.0)];
        assert_relative_eq!(rect_polyline_distance(&r, &line), 4.0, epsilon = 1e-9);

        let through = vec![(-20.0, 0.0), (20.0, 0.0)];
        assert_eq!(rect_polyline_distance(&r, &through), 0.0);
    }

    #[test]
    fn test_segment_inside() {
        let l = l_shape();
        assert!(segment_inside(&l, (10.0, 10.0), (10.0, 90.0)));
        // Both ends inside, but the segment cuts across the notch.
        assert!(!segment_inside(&l, (50.0, 50.0), (15.0, 95.0)));
        // Runs along an edge: still inside.
        assert!(segment_inside(&l, (0.0, 0.0), (0.0, 100.0)));
    }

    #[test]
    fn test_polyline_corridor_width() {
        let corridor = polyline_corridor(&[(25.0, 0.0), (25.0, 100.0)], 6.0, 3.0);
        assert_eq!(corridor.len(), 1);
        assert_relative_eq!(total_area(&corridor), 6.0 * 106.0, epsilon = 1e-6);
    }

    #[test]
    fn test_is_convex() {
        assert!(is_convex(&rect(3.0, 4.0)));
        assert!(!is_convex(&l_shape()));
    }
}
