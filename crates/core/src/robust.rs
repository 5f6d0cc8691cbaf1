//! Robust geometric predicates for boundary validation.
//!
//! Lot boundaries come from surveyed coordinates and hand-drawn sketches, so
//! nearly collinear vertices are common. Orientation tests here use Shewchuk's
//! adaptive precision arithmetic (via the `robust` crate) so that convexity and
//! self-intersection checks give the same answer regardless of rounding.
//!
//! ## Example
//!
//! ```rust
//! use lotplan_core::robust::is_convex_robust;
//!
//! // A survey point on the south fence does not make the lot concave.
//! let lot = [(0.0, 0.0), (25.0, 0.0), (50.0, 0.0), (50.0, 80.0), (0.0, 80.0)];
//! assert!(is_convex_robust(&lot));
//! ```

use robust::{orient2d as robust_orient2d, Coord};
use std::cmp::Ordering;

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Points are arranged counter-clockwise (left turn).
    CounterClockwise,
    /// Points are arranged clockwise (right turn).
    Clockwise,
    /// Points are collinear.
    Collinear,
}

impl Orientation {
    #[inline]
    pub fn is_collinear(self) -> bool {
        self == Orientation::Collinear
    }
}

/// Determines the orientation of three 2D points.
///
/// - `CounterClockwise` if `pc` lies to the left of the directed line `pa -> pb`
/// - `Clockwise` if `pc` lies to the right
/// - `Collinear` if the three points are collinear
#[inline]
pub fn orient2d(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> Orientation {
    match robust_orient2d(coord(pa), coord(pb), coord(pc)).partial_cmp(&0.0) {
        Some(Ordering::Greater) => Orientation::CounterClockwise,
        Some(Ordering::Less) => Orientation::Clockwise,
        _ => Orientation::Collinear,
    }
}

#[inline]
fn coord(p: (f64, f64)) -> Coord<f64> {
    Coord { x: p.0, y: p.1 }
}

/// Returns true if `p` lies on the closed segment `a -> b`.
///
/// Assumes the three points are already known to be collinear.
#[inline]
fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

/// Checks whether two segments cross at a single point interior to both.
///
/// Touching at an endpoint and collinear overlap do not count. This is the
/// predicate used to decide whether a segment leaves a polygon: a segment that
/// merely runs along or ends on an edge stays inside.
pub fn segments_cross_properly(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> bool {
    let d1 = orient2d(b1, b2, a1);
    let d2 = orient2d(b1, b2, a2);
    let d3 = orient2d(a1, a2, b1);
    let d4 = orient2d(a1, a2, b2);

    if d1.is_collinear() || d2.is_collinear() || d3.is_collinear() || d4.is_collinear() {
        return false;
    }

    d1 != d2 && d3 != d4
}

/// Checks whether two closed segments share at least one point.
pub fn segments_intersect(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> bool {
    let d1 = orient2d(b1, b2, a1);
    let d2 = orient2d(b1, b2, a2);
    let d3 = orient2d(a1, a2, b1);
    let d4 = orient2d(a1, a2, b2);

    if !d1.is_collinear() && !d2.is_collinear() && !d3.is_collinear() && !d4.is_collinear() {
        return d1 != d2 && d3 != d4;
    }

    (d1.is_collinear() && on_segment(b1, b2, a1))
        || (d2.is_collinear() && on_segment(b1, b2, a2))
        || (d3.is_collinear() && on_segment(a1, a2, b1))
        || (d4.is_collinear() && on_segment(a1, a2, b2))
}

/// True if every non-degenerate corner of the ring turns the same way.
///
/// Collinear vertices are ignored, so a lot edge split by a survey point still
/// counts as straight. Rings with fewer than three vertices are not convex.
pub fn is_convex_robust(ring: &[(f64, f64)]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut turns = (0..n)
        .map(|i| orient2d(ring[i], ring[(i + 1) % n], ring[(i + 2) % n]))
        .filter(|o| !o.is_collinear());
    match turns.next() {
        Some(first) => turns.all(|o| o == first),
        None => false,
    }
}

/// Finds the first pair of non-adjacent edges of a closed ring that intersect.
///
/// Returns the edge indices `(i, j)` with `i < j`, where edge `i` runs from
/// vertex `i` to vertex `i + 1`. Adjacent edges only share their common vertex
/// and are skipped unless they fold back onto each other.
pub fn find_self_intersection(ring: &[(f64, f64)]) -> Option<(usize, usize)> {
    let n = ring.len();
    if n < 4 {
        return None;
    }

    for i in 0..n {
        let a1 = ring[i];
        let a2 = ring[(i + 1) % n];
        for j in (i + 1)..n {
            let b1 = ring[j];
            let b2 = ring[(j + 1) % n];

            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                // Adjacent edges that double back over each other.
                let shared = if j == i + 1 { a2 } else { a1 };
                let (p, q) = if j == i + 1 { (a1, b2) } else { (a2, b1) };
                if orient2d(p, shared, q).is_collinear() {
                    let back = (p.0 - shared.0) * (q.0 - shared.0)
                        + (p.1 - shared.1) * (q.1 - shared.1);
                    if back > 0.0 {
                        return Some((i, j));
                    }
                }
                continue;
            }

            if segments_intersect(a1, a2, b1, b2) {
                return Some((i, j));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_of_lot_corners() {
        let gate = (0.0, 0.0);
        let far_corner = (40.0, 0.0);

        assert_eq!(orient2d(gate, far_corner, (20.0, 15.0)), Orientation::CounterClockwise);
        assert_eq!(orient2d(gate, far_corner, (20.0, -15.0)), Orientation::Clockwise);
        // Survey point on the fence line
        assert!(orient2d(gate, far_corner, (12.5, 0.0)).is_collinear());
    }

    #[test]
    fn test_segments_cross_properly() {
        // X shape
        assert!(segments_cross_properly(
            (0.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (10.0, 0.0)
        ));
        // T junction: endpoint touches, not a proper crossing
        assert!(!segments_cross_properly(
            (0.0, 0.0),
            (10.0, 0.0),
            (5.0, 0.0),
            (5.0, 5.0)
        ));
        // Collinear overlap
        assert!(!segments_cross_properly(
            (0.0, 0.0),
            (10.0, 0.0),
            (5.0, 0.0),
            (15.0, 0.0)
        ));
    }

    #[test]
    fn test_segments_intersect_touching() {
        assert!(segments_intersect(
            (0.0, 0.0),
            (10.0, 0.0),
            (5.0, 0.0),
            (5.0, 5.0)
        ));
        assert!(!segments_intersect(
            (0.0, 0.0),
            (10.0, 0.0),
            (0.0, 1.0),
            (10.0, 1.0)
        ));
    }

    #[test]
    fn test_is_convex_robust() {
        assert!(is_convex_robust(&[(0.0, 0.0), (50.0, 0.0), (50.0, 100.0), (0.0, 100.0)]));

        let l_shape = vec![
            (0.0, 0.0),
            (60.0, 0.0),
            (60.0, 60.0),
            (30.0, 60.0),
            (30.0, 100.0),
            (0.0, 100.0),
        ];
        assert!(!is_convex_robust(&l_shape));

        // Collinear midpoint does not break convexity
        let with_midpoint = vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(is_convex_robust(&with_midpoint));
    }

    #[test]
    fn test_find_self_intersection_bowtie() {
        let bowtie = vec![(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)];
        assert!(find_self_intersection(&bowtie).is_some());

        let square = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert_eq!(find_self_intersection(&square), None);
    }

    #[test]
    fn test_find_self_intersection_spike() {
        // Edge 1 doubles back over edge 0
        let spike = vec![(0.0, 0.0), (10.0, 0.0), (5.0, 0.0), (5.0, 5.0)];
        assert!(find_self_intersection(&spike).is_some());
    }
}
