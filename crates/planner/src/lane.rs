//! Access lane generation.
//!
//! Produces the lane centerline, the corridor polygon around it and the
//! parking zones left over once the corridor is subtracted from the lot.
//!
//! Convex lots get a straight lane from entry to exit. Concave lots are routed
//! along an approximation of the medial axis: a grid over the lot interior is
//! searched with Dijkstra, with step costs that grow as clearance to the
//! boundary shrinks, and the resulting path is shortened wherever a straight
//! segment keeps enough clearance.

use crate::geometry::{
    buffer, closest_point_on_segment, contains, difference, distance, distance_to_boundary,
    intersection, is_convex, minimum_bounding_rectangle, polyline_corridor, segment_inside,
    total_area,
};
use lotplan_core::geometry::{Point2, Polygon2D};
use lotplan_core::{Error, LaneLayout, LaneMode, LaneSpec, OptimizationConfig, Result};
use pathfinding::prelude::dijkstra;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid cells along the longer side of the lot when routing concave lots.
const ROUTING_GRID_CELLS: f64 = 120.0;

/// Smallest routing cell.
const MIN_ROUTING_CELL: f64 = 0.25;

/// Fixed-point scale for Dijkstra edge costs.
const COST_SCALE: f64 = 1000.0;

/// Perimeter mode needs at least this much inner area.
const MIN_PERIMETER_INNER_AREA: f64 = 50.0;

/// Result of lane generation.
#[derive(Debug, Clone)]
pub struct LanePlan {
    pub spec: LaneSpec,
    pub mode: LaneMode,
    /// Entry after snapping onto the boundary.
    pub entry: Point2,
    /// Exit after snapping or auto-placement.
    pub exit: Point2,
    pub centerline: Vec<Point2>,
    /// Corridor clipped to the lot.
    pub corridor: Vec<Polygon2D>,
    /// Usable parking zones, each processed independently downstream.
    pub zones: Vec<Polygon2D>,
    pub warnings: Vec<String>,
}

impl LanePlan {
    pub fn width(&self) -> f64 {
        self.spec.total_width()
    }

    pub fn parking_area(&self) -> f64 {
        total_area(&self.zones)
    }

    pub fn lane_area(&self) -> f64 {
        total_area(&self.corridor)
    }

    pub fn has_zones(&self) -> bool {
        !self.zones.is_empty()
    }

    /// The lane as it appears in a finished layout.
    pub fn to_layout(&self) -> LaneLayout {
        LaneLayout {
            lane_type: self.spec.lane_type,
            width: self.width(),
            centerline: self.centerline.clone(),
            corridor: self.corridor.clone(),
        }
    }
}

/// Lane generator configuration and entry point.
#[derive(Debug, Clone)]
pub struct LaneGenerator {
    spec: LaneSpec,
    mode: LaneMode,
    snap_tolerance: f64,
    min_zone_area: f64,
}

impl LaneGenerator {
    pub fn new(spec: LaneSpec) -> Self {
        Self {
            spec,
            mode: LaneMode::Central,
            snap_tolerance: 5.0,
            min_zone_area: 30.0,
        }
    }

    pub fn from_config(config: &OptimizationConfig) -> Self {
        Self::new(config.lane)
            .with_mode(config.lane_mode)
            .with_snap_tolerance(config.snap_tolerance)
            .with_min_zone_area(config.rules.min_zone_area)
    }

    pub fn with_mode(mut self, mode: LaneMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance.max(0.0);
        self
    }

    pub fn with_min_zone_area(mut self, area: f64) -> Self {
        self.min_zone_area = area.max(0.0);
        self
    }

    /// Generates the lane and parking zones for a lot.
    ///
    /// Fails if an entry or exit point cannot be snapped onto the boundary or
    /// if entry and exit coincide. A lot narrower than the corridor is not an
    /// error: the plan comes back with no zones and a warning.
    pub fn generate(&self, boundary: &Polygon2D, entry: Point2, exit: Option<Point2>) -> Result<LanePlan> {
        let mut warnings = Vec::new();
        let width = self.spec.total_width();

        let entry = self.snap("entry", boundary, entry, &mut warnings)?;
        let exit = match exit {
            Some(p) => self.snap("exit", boundary, p, &mut warnings)?,
            None => {
                let p = opposite_boundary_point(boundary.exterior(), entry);
                warnings.push(format!(
                    "Exit point auto-generated at ({:.2}, {:.2})",
                    p.0, p.1
                ));
                p
            }
        };

        let mut plan = match self.mode {
            LaneMode::Central => {
                if distance(entry, exit) < width {
                    return Err(Error::InvalidInput(format!(
                        "entry ({:.2}, {:.2}) and exit ({:.2}, {:.2}) are closer than the lane \
                         width {:.2}; place the exit point further along the boundary",
                        entry.0, entry.1, exit.0, exit.1, width
                    )));
                }
                self.central(boundary, entry, exit, warnings)?
            }
            LaneMode::Perimeter => self.perimeter(boundary, entry, exit, warnings)?,
        };

        let lot_area = boundary.area();
        let lane_area = plan.lane_area();
        let parking_area = plan.parking_area();
        log::info!(
            "Lane generated: {} zones, lot {:.0}, lane {:.0}, parking {:.0}",
            plan.zones.len(),
            lot_area,
            lane_area,
            parking_area
        );
        plan.warnings.push(format!(
            "Area distribution: Total={:.0}m², Lanes={:.0}m², Parking={:.0}m²",
            lot_area, lane_area, parking_area
        ));
        Ok(plan)
    }

    fn central(
        &self,
        boundary: &Polygon2D,
        entry: Point2,
        exit: Point2,
        mut warnings: Vec<String>,
    ) -> Result<LanePlan> {
        let width = self.spec.total_width();
        let mbr = minimum_bounding_rectangle(boundary);

        if width > mbr.min_dimension() {
            log::warn!(
                "Corridor width {:.2} exceeds narrowest lot dimension {:.2}",
                width,
                mbr.min_dimension()
            );
            warnings.push(format!(
                "Lot too narrow: lane corridor width {:.1} exceeds the narrowest lot dimension {:.1}",
                width,
                mbr.min_dimension()
            ));
            let centerline = vec![entry, exit];
            let corridor = clip_corridor(boundary, &centerline, width);
            return Ok(self.plan(entry, exit, centerline, corridor, Vec::new(), warnings));
        }

        let centerline = if is_convex(boundary) {
            vec![entry, exit]
        } else {
            log::debug!("Concave lot, routing lane along the interior skeleton");
            skeleton_path(boundary, entry, exit, width / 2.0)?
        };

        let corridor = clip_corridor(boundary, &centerline, width);
        let zones = self.usable_zones(difference(std::slice::from_ref(boundary), &corridor), &mut warnings);
        Ok(self.plan(entry, exit, centerline, corridor, zones, warnings))
    }

    fn perimeter(
        &self,
        boundary: &Polygon2D,
        entry: Point2,
        exit: Point2,
        mut warnings: Vec<String>,
    ) -> Result<LanePlan> {
        let width = self.spec.total_width();
        let inner = buffer(boundary, -width)?;

        let mut centerline: Vec<Point2> = buffer(boundary, -width / 2.0)?
            .into_iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
            .map(|p| p.exterior().to_vec())
            .unwrap_or_else(|| boundary.exterior().to_vec());
        rotate_to_nearest(&mut centerline, entry);
        if let Some(&first) = centerline.first() {
            centerline.push(first);
        }

        if inner.is_empty() || total_area(&inner) < MIN_PERIMETER_INNER_AREA {
            warnings.push("Lot too small for perimeter lanes".to_string());
            let corridor = vec![boundary.clone()];
            return Ok(self.plan(entry, exit, centerline, corridor, Vec::new(), warnings));
        }

        let corridor = difference(std::slice::from_ref(boundary), &inner);
        let zones = self.usable_zones(inner, &mut warnings);
        Ok(self.plan(entry, exit, centerline, corridor, zones, warnings))
    }

    fn plan(
        &self,
        entry: Point2,
        exit: Point2,
        centerline: Vec<Point2>,
        corridor: Vec<Polygon2D>,
        zones: Vec<Polygon2D>,
        warnings: Vec<String>,
    ) -> LanePlan {
        LanePlan {
            spec: self.spec,
            mode: self.mode,
            entry,
            exit,
            centerline,
            corridor,
            zones,
            warnings,
        }
    }

    fn usable_zones(&self, parts: Vec<Polygon2D>, warnings: &mut Vec<String>) -> Vec<Polygon2D> {
        let total = parts.len();
        let zones: Vec<Polygon2D> = parts
            .into_iter()
            .filter(|z| z.area() >= self.min_zone_area)
            .collect();
        if zones.len() < total {
            log::debug!(
                "Dropped {} parking fragments below {:.1}",
                total - zones.len(),
                self.min_zone_area
            );
        }
        if zones.is_empty() {
            warnings.push("No usable parking zones after lane generation".to_string());
        }
        zones
    }

    fn snap(&self, role: &'static str, boundary: &Polygon2D, point: Point2, warnings: &mut Vec<String>) -> Result<Point2> {
        let (snapped, dist) = nearest_boundary_point(boundary.exterior(), point);
        if dist <= 1e-6 {
            return Ok(point);
        }
        if dist > self.snap_tolerance {
            return Err(Error::UnreachableEntry {
                role,
                point,
                distance: dist,
                tolerance: self.snap_tolerance,
            });
        }
        warnings.push(format!(
            "{}{} point snapped to boundary: ({:.2}, {:.2}) -> ({:.2}, {:.2})",
            role[..1].to_uppercase(),
            &role[1..],
            point.0,
            point.1,
            snapped.0,
            snapped.1
        ));
        Ok(snapped)
    }
}

fn clip_corridor(boundary: &Polygon2D, centerline: &[Point2], width: f64) -> Vec<Polygon2D> {
    let raw = polyline_corridor(centerline, width, width / 2.0);
    intersection(std::slice::from_ref(boundary), &raw)
}

// ============================================================================
// Boundary parametrization
// ============================================================================

/// Nearest point on a closed ring and its distance.
fn nearest_boundary_point(ring: &[Point2], p: Point2) -> (Point2, f64) {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let q = closest_point_on_segment(p, ring[i], ring[(i + 1) % n]);
            (q, distance(p, q))
        })
        .fold((p, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Arc-length position of the point on the ring closest to `p`.
fn perimeter_position(ring: &[Point2], p: Point2) -> f64 {
    let n = ring.len();
    let mut walked = 0.0;
    let mut best = (f64::INFINITY, 0.0);
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        let q = closest_point_on_segment(p, a, b);
        let d = distance(p, q);
        if d < best.0 {
            best = (d, walked + distance(a, q));
        }
        walked += distance(a, b);
    }
    best.1
}

/// Point at arc-length `s` along the ring (wraps around).
fn point_at_position(ring: &[Point2], s: f64) -> Point2 {
    let n = ring.len();
    let perimeter: f64 = (0..n).map(|i| distance(ring[i], ring[(i + 1) % n])).sum();
    if perimeter <= 0.0 {
        return ring.first().copied().unwrap_or((0.0, 0.0));
    }
    let mut s = s.rem_euclid(perimeter);
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        let len = distance(a, b);
        if s <= len && len > 0.0 {
            let t = s / len;
            return (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1));
        }
        s -= len;
    }
    ring[0]
}

/// The boundary point farthest from `entry` measured along the boundary.
pub fn opposite_boundary_point(ring: &[Point2], entry: Point2) -> Point2 {
    let n = ring.len();
    let perimeter: f64 = (0..n).map(|i| distance(ring[i], ring[(i + 1) % n])).sum();
    point_at_position(ring, perimeter_position(ring, entry) + perimeter / 2.0)
}

fn rotate_to_nearest(ring: &mut [Point2], p: Point2) {
    if let Some(start) = (0..ring.len()).min_by(|&i, &j| distance(ring[i], p).total_cmp(&distance(ring[j], p))) {
        ring.rotate_left(start);
    }
}

// ============================================================================
// Skeleton routing
// ============================================================================

type Cell = (usize, usize);

struct RoutingGrid {
    origin: Point2,
    cell: f64,
    cols: usize,
    rows: usize,
    /// Clearance per cell, `None` outside the lot.
    clearance: Vec<Option<f64>>,
    max_clearance: f64,
}

impl RoutingGrid {
    fn build(boundary: &Polygon2D) -> Self {
        let aabb = boundary.aabb();
        let cell = (aabb.width().max(aabb.height()) / ROUTING_GRID_CELLS).max(MIN_ROUTING_CELL);
        let cols = (aabb.width() / cell).ceil().max(1.0) as usize;
        let rows = (aabb.height() / cell).ceil().max(1.0) as usize;
        let origin = (aabb.min_x, aabb.min_y);

        let mut clearance = Vec::with_capacity(cols * rows);
        let mut max_clearance: f64 = 0.0;
        for r in 0..rows {
            for c in 0..cols {
                let p = (origin.0 + (c as f64 + 0.5) * cell, origin.1 + (r as f64 + 0.5) * cell);
                let inside = contains(boundary, p);
                let d = distance_to_boundary(boundary, p);
                if inside && d > 1e-9 {
                    max_clearance = max_clearance.max(d);
                    clearance.push(Some(d));
                } else {
                    clearance.push(None);
                }
            }
        }

        Self {
            origin,
            cell,
            cols,
            rows,
            clearance,
            max_clearance,
        }
    }

    fn center(&self, (c, r): Cell) -> Point2 {
        (
            self.origin.0 + (c as f64 + 0.5) * self.cell,
            self.origin.1 + (r as f64 + 0.5) * self.cell,
        )
    }

    fn clearance(&self, (c, r): Cell) -> Option<f64> {
        self.clearance[r * self.cols + c]
    }

    fn successors(&self, boundary: &Polygon2D, cell: Cell) -> Vec<(Cell, u64)> {
        let Some(here) = self.clearance(cell) else {
            return Vec::new();
        };
        let (c, r) = (cell.0 as isize, cell.1 as isize);
        let mut out = Vec::with_capacity(8);
        for (dc, dr) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, -1), (-1, 1), (1, 1)] {
            let (nc, nr) = (c + dc, r + dr);
            if nc < 0 || nr < 0 || nc as usize >= self.cols || nr as usize >= self.rows {
                continue;
            }
            let next = (nc as usize, nr as usize);
            let Some(there) = self.clearance(next) else {
                continue;
            };
            if dc != 0 && dr != 0 && !segment_inside(boundary, self.center(cell), self.center(next)) {
                continue;
            }
            let step = if dc != 0 && dr != 0 { std::f64::consts::SQRT_2 } else { 1.0 };
            let tightness = self.max_clearance / here.min(there);
            let cost = step * (1.0 + tightness * tightness);
            out.push((next, (cost * COST_SCALE).round() as u64));
        }
        out
    }

    /// Interior cells ordered by distance to `p`, restricted to those with a
    /// straight line of sight to it.
    fn attach(&self, boundary: &Polygon2D, p: Point2) -> Option<Cell> {
        let mut cells: Vec<(f64, Cell)> = (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (c, r)))
            .filter(|&cell| self.clearance(cell).is_some())
            .map(|cell| (distance(self.center(cell), p), cell))
            .collect();
        cells.sort_by(|a, b| a.0.total_cmp(&b.0));
        cells
            .into_iter()
            .take(64)
            .find(|&(_, cell)| segment_inside(boundary, p, self.center(cell)))
            .map(|(_, cell)| cell)
    }
}

/// Routes a centerline from `entry` to `exit` through a concave lot.
fn skeleton_path(boundary: &Polygon2D, entry: Point2, exit: Point2, half_width: f64) -> Result<Vec<Point2>> {
    if segment_inside(boundary, entry, exit) && clearance_along(boundary, entry, exit, entry, exit, half_width, half_width) {
        return Ok(vec![entry, exit]);
    }

    let grid = RoutingGrid::build(boundary);
    let no_route = || {
        Error::InvalidInput(format!(
            "no interior route from entry ({:.2}, {:.2}) to exit ({:.2}, {:.2}); \
             check that both points lie on the same lot boundary",
            entry.0, entry.1, exit.0, exit.1
        ))
    };
    let start = grid.attach(boundary, entry).ok_or_else(no_route)?;
    let goal = grid.attach(boundary, exit).ok_or_else(no_route)?;

    let (cells, _) = dijkstra(&start, |&cell| grid.successors(boundary, cell), |&cell| cell == goal)
        .ok_or_else(no_route)?;

    // Cells next to the terminals hug the boundary and say nothing about the
    // width of the passage.
    let guard = half_width + grid.cell;
    let min_clearance = cells
        .iter()
        .filter(|&&c| distance(grid.center(c), entry) >= guard && distance(grid.center(c), exit) >= guard)
        .filter_map(|&c| grid.clearance(c))
        .fold(f64::INFINITY, f64::min);
    let required = if min_clearance.is_finite() {
        half_width.min(min_clearance * 0.5)
    } else {
        half_width
    };

    let mut raw = Vec::with_capacity(cells.len() + 2);
    raw.push(entry);
    raw.extend(cells.iter().map(|&c| grid.center(c)));
    raw.push(exit);

    Ok(smooth_path(boundary, &raw, required, guard))
}

/// Shortcut the path wherever a straight segment stays inside with at least
/// `required` clearance. Points within `guard` of the path ends are exempt
/// because the lane necessarily meets the boundary there.
fn smooth_path(boundary: &Polygon2D, path: &[Point2], required: f64, guard: f64) -> Vec<Point2> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let (entry, exit) = (path[0], path[path.len() - 1]);

    let mut smoothed = vec![entry];
    let mut i = 0;
    while i < path.len() - 1 {
        let mut j = path.len() - 1;
        while j > i + 1 {
            if segment_inside(boundary, path[i], path[j])
                && clearance_along(boundary, path[i], path[j], entry, exit, required, guard)
            {
                break;
            }
            j -= 1;
        }
        smoothed.push(path[j]);
        i = j;
    }
    smoothed
}

fn clearance_along(
    boundary: &Polygon2D,
    a: Point2,
    b: Point2,
    entry: Point2,
    exit: Point2,
    required: f64,
    guard: f64,
) -> bool {
    let len = distance(a, b);
    let samples = ((len / (required.max(0.5))).ceil() as usize).max(1);
    (0..=samples).all(|k| {
        let t = k as f64 / samples as f64;
        let p = (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1));
        distance(p, entry) < guard
            || distance(p, exit) < guard
            || distance_to_boundary(boundary, p) >= required - 1e-9
    })
}

// ============================================================================
// Planning helpers
// ============================================================================

/// Lane direction (degrees) along the longer side of the minimum bounding
/// rectangle, which leaves room for rows of spaces on both sides.
pub fn optimal_lane_direction(boundary: &Polygon2D) -> f64 {
    let mbr = minimum_bounding_rectangle(boundary);
    if mbr.width >= mbr.height {
        mbr.angle
    } else {
        mbr.angle + 90.0
    }
}

/// Rough lane sizing for a lot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneRequirements {
    pub recommended_width: f64,
    /// Parking rows that fit across the short side.
    pub possible_rows: usize,
    pub lot_width: f64,
    pub lot_length: f64,
    pub optimal_angle: f64,
}

/// Estimates how many parking rows fit across the lot, each row needing a
/// space width plus half a lane.
pub fn estimate_lane_requirements(boundary: &Polygon2D, lane: &LaneSpec, space_width: f64) -> LaneRequirements {
    let mbr = minimum_bounding_rectangle(boundary);
    let lane_width = lane.total_width();
    let short = mbr.min_dimension();
    let row_width = space_width + lane_width / 2.0;
    let available = short - lane_width;
    let rows = if row_width > 0.0 && available > 0.0 {
        (available / row_width).floor() as usize
    } else {
        0
    };

    LaneRequirements {
        recommended_width: lane_width,
        possible_rows: rows.max(1),
        lot_width: short,
        lot_length: mbr.max_dimension(),
        optimal_angle: optimal_lane_direction(boundary),
    }
}
