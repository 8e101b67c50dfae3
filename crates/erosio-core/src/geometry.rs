//! Static node-set geometry: sample points, symmetric adjacency, per-node
//! representative area, and the boundary (drain-candidate) classification.
//!
//! The geometry is built once and never mutated across erosion cycles. Nodes
//! are addressed by `u32` ids indexing flat per-node vectors.

use crate::error::ErosionError;
use crate::point::Point;

/// Axis-aligned bounding rectangle for geometry constructors.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// The immutable substrate of an erosion run.
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Node coordinates, indexed by node id.
    pub points: Vec<Point>,
    /// Symmetric adjacency: if `b ∈ neighbors[a]` then `a ∈ neighbors[b]`.
    pub neighbors: Vec<Vec<u32>>,
    /// Surface area represented by each node; positive.
    pub area: Vec<f64>,
    /// Minimum inter-node distance; stands in for the distance to the
    /// unmodeled external base level at system outlets.
    pub min_distance: f64,
    /// True for nodes lying on the convex hull of the node set; these are
    /// always legitimate drains regardless of local height.
    pub boundary: Vec<bool>,
}

// Forgiving cutoff when converting a bound extent to a lattice count, so that
// exact-multiple extents keep their last row/column.
const COUNT_EPS: f64 = 1e-9;

impl Geometry {
    /// Wrap an externally-built node set and adjacency.
    ///
    /// `neighbors` must be symmetric and index-valid; `area` must hold one
    /// positive entry per node. Boundary nodes are classified internally from
    /// the convex hull of `points`.
    pub fn new(
        points: Vec<Point>,
        neighbors: Vec<Vec<u32>>,
        area: Vec<f64>,
        min_distance: f64,
    ) -> Result<Self, ErosionError> {
        if min_distance <= 0.0 || !min_distance.is_finite() {
            return Err(ErosionError::DegenerateSpacing { spacing: min_distance });
        }
        if points.is_empty() {
            return Err(ErosionError::EmptyGeometry);
        }
        debug_assert_eq!(points.len(), neighbors.len());
        debug_assert_eq!(points.len(), area.len());

        let boundary = classify_boundary(&points, min_distance);
        Ok(Self { points, neighbors, area, min_distance, boundary })
    }

    /// A simple and fast lattice geometry over `bounds`.
    ///
    /// Nodes sit at `spacing` intervals with the leftover extent split into
    /// equal margins. Adjacency is the triangulated 6-neighborhood (the four
    /// orthogonal neighbors plus one diagonal pair), each node representing
    /// `spacing²` of surface area.
    pub fn grid(bounds: Bounds, spacing: f64) -> Result<Self, ErosionError> {
        if spacing <= 0.0 || !spacing.is_finite() {
            return Err(ErosionError::DegenerateSpacing { spacing });
        }

        let nx = (bounds.width() / spacing + COUNT_EPS).floor() as usize + 1;
        let ny = (bounds.height() / spacing + COUNT_EPS).floor() as usize + 1;
        let margin_x = (bounds.width() - (nx - 1) as f64 * spacing) / 2.0;
        let margin_y = (bounds.height() - (ny - 1) as f64 * spacing) / 2.0;

        let mut points = Vec::with_capacity(nx * ny);
        for y in 0..ny {
            for x in 0..nx {
                points.push(Point::new(
                    bounds.min.x + margin_x + x as f64 * spacing,
                    bounds.min.y + margin_y + y as f64 * spacing,
                ));
            }
        }

        // Orthogonal neighbors plus the (+1,−1)/(−1,+1) diagonal pair: a
        // consistent triangulation of the lattice.
        const OFFSETS: [(isize, isize); 6] =
            [(-1, 0), (1, 0), (0, -1), (0, 1), (1, -1), (-1, 1)];

        let mut neighbors = vec![Vec::with_capacity(6); nx * ny];
        for y in 0..ny as isize {
            for x in 0..nx as isize {
                let id = (y * nx as isize + x) as usize;
                for (dx, dy) in OFFSETS {
                    let (qx, qy) = (x + dx, y + dy);
                    if qx < 0 || qy < 0 || qx >= nx as isize || qy >= ny as isize {
                        continue;
                    }
                    neighbors[id].push((qy * nx as isize + qx) as u32);
                }
            }
        }

        let area = vec![spacing * spacing; nx * ny];
        Self::new(points, neighbors, area, spacing)
    }

    pub fn node_count(&self) -> usize {
        self.points.len()
    }
}

// ── Convex-hull boundary classification ───────────────────────────────────────

/// Mark every node lying on the convex hull of the node set (hull vertices
/// and nodes on hull edges — grids put most of their rim on just four hull
/// vertices' segments).
fn classify_boundary(points: &[Point], min_distance: f64) -> Vec<bool> {
    let hull = convex_hull(points);
    let tol = min_distance * 1e-6;

    if hull.len() < 2 {
        // Degenerate set: a single (possibly repeated) location.
        return vec![true; points.len()];
    }

    points
        .iter()
        .map(|&p| {
            hull.windows(2)
                .any(|seg| segment_distance(p, seg[0], seg[1]) <= tol)
        })
        .collect()
}

/// Monotone-chain convex hull. Returns the hull closed (first point repeated
/// at the end) so callers can walk `windows(2)` over its segments.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        let mut hull = sorted;
        if let Some(&first) = hull.first() {
            hull.push(first);
        }
        return hull;
    }

    let cross = |o: Point, a: Point, b: Point| -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut hull: Vec<Point> = Vec::with_capacity(sorted.len() + 1);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point>> = if pass == 0 {
            Box::new(sorted.iter())
        } else {
            Box::new(sorted.iter().rev())
        };
        for &p in iter {
            while hull.len() >= start + 2
                && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop(); // endpoint repeats as the next chain's start
    }
    if let Some(&first) = hull.first() {
        hull.push(first);
    }
    hull
}

/// Distance from `p` to the segment `ab`.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let len_sq = a.distance_sq(b);
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len_sq;
    let t = t.clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)))
}
