//! Spatial queries over the eroded node field: turning the discrete
//! node→height result into a continuous surface for display.
//!
//! A uniform bucket grid stands in for a quadtree; node sets produced by the
//! geometry constructors are near-uniform in density, which is the best case
//! for bucketing.

use crate::eroder::EroderResults;
use crate::point::Point;

// ── Bucket index ──────────────────────────────────────────────────────────────

/// Uniform-cell spatial hash over a fixed point set.
struct SampleIndex {
    origin: Point,
    cell: f64,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<u32>>,
}

impl SampleIndex {
    fn new(points: &[Point], cell: f64) -> Self {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        let cols = ((max.x - min.x) / cell).floor() as usize + 1;
        let rows = ((max.y - min.y) / cell).floor() as usize + 1;
        let mut buckets = vec![Vec::new(); cols * rows];
        for (id, p) in points.iter().enumerate() {
            let cx = (((p.x - min.x) / cell) as usize).min(cols - 1);
            let cy = (((p.y - min.y) / cell) as usize).min(rows - 1);
            buckets[cy * cols + cx].push(id as u32);
        }
        Self { origin: min, cell, cols, rows, buckets }
    }

    /// Ids of all points within `radius` of `p`.
    fn within_radius(&self, points: &[Point], p: Point, radius: f64) -> Vec<u32> {
        let lo_x = (((p.x - radius - self.origin.x) / self.cell).floor().max(0.0)) as usize;
        let lo_y = (((p.y - radius - self.origin.y) / self.cell).floor().max(0.0)) as usize;
        let hi_x = ((((p.x + radius - self.origin.x) / self.cell).floor()).max(0.0) as usize)
            .min(self.cols - 1);
        let hi_y = ((((p.y + radius - self.origin.y) / self.cell).floor()).max(0.0) as usize)
            .min(self.rows - 1);

        let r_sq = radius * radius;
        let mut out = Vec::new();
        for cy in lo_y..=hi_y {
            for cx in lo_x..=hi_x {
                for &id in &self.buckets[cy * self.cols + cx] {
                    if points[id as usize].distance_sq(p) <= r_sq {
                        out.push(id);
                    }
                }
            }
        }
        out
    }

    /// Id of the closest point to `p`. The point set is non-empty, so the
    /// expanding search always terminates.
    fn nearest(&self, points: &[Point], p: Point) -> u32 {
        let mut radius = self.cell;
        loop {
            let hits = self.within_radius(points, p, radius);
            if let Some(&best) = hits.iter().min_by(|&&a, &&b| {
                points[a as usize]
                    .distance_sq(p)
                    .total_cmp(&points[b as usize].distance_sq(p))
            }) {
                // Everything closer than the best hit also fell inside the
                // search radius, so this minimum is global.
                return best;
            }
            radius *= 2.0;
        }
    }
}

// ── Interpolators ─────────────────────────────────────────────────────────────

/// Height interpolation over [`EroderResults`].
pub struct HeightSampler<'a> {
    results: &'a EroderResults,
    index: SampleIndex,
    /// Mean adjacency edge length; the kernel-width reference scale.
    mean_edge: f64,
}

impl<'a> HeightSampler<'a> {
    pub fn new(results: &'a EroderResults) -> Self {
        let geometry = &results.geometry;
        let mut total = 0.0;
        let mut count = 0u64;
        for (u, nbrs) in geometry.neighbors.iter().enumerate() {
            for &v in nbrs {
                total += geometry.points[u].distance(geometry.points[v as usize]);
                count += 1;
            }
        }
        let mean_edge = if count == 0 {
            geometry.min_distance
        } else {
            total / count as f64
        };
        let index = SampleIndex::new(&geometry.points, 2.0 * mean_edge);
        Self { results, index, mean_edge }
    }

    /// Height of the node closest to `p`.
    pub fn nearest(&self, p: Point) -> f64 {
        let id = self.index.nearest(&self.results.geometry.points, p);
        self.results.heights[id as usize]
    }

    /// Inverse-distance-weighted height over the nodes within `radius`.
    ///
    /// Falls back to nearest-neighbor when the disk is empty (or when `p`
    /// coincides with a node, where the weight diverges).
    pub fn idw(&self, p: Point, exponent: f64, radius: f64) -> f64 {
        let points = &self.results.geometry.points;
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let hits = self.index.within_radius(points, p, radius);
        for &id in &hits {
            let d_sq = points[id as usize].distance_sq(p);
            if d_sq == 0.0 {
                return self.results.heights[id as usize];
            }
            let weight = d_sq.powf(exponent * -0.5);
            numerator += self.results.heights[id as usize] * weight;
            denominator += weight;
        }
        if denominator == 0.0 {
            return self.nearest(p);
        }
        numerator / denominator
    }

    /// Gaussian-kernel smoothed height.
    ///
    /// The kernel width is `mean edge length / inv_stddev`; support is cut
    /// off where the normalized weight drops below `tolerance`.
    pub fn gaussian(&self, p: Point, inv_stddev: f64, tolerance: f64) -> f64 {
        let points = &self.results.geometry.points;
        let sigma = self.mean_edge / inv_stddev;
        let radius = sigma * (2.0 * (1.0 / tolerance).ln()).sqrt();

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for &id in &self.index.within_radius(points, p, radius) {
            let d_sq = points[id as usize].distance_sq(p);
            let weight = (-d_sq / (2.0 * sigma * sigma)).exp();
            numerator += self.results.heights[id as usize] * weight;
            denominator += weight;
        }
        if denominator == 0.0 {
            return self.nearest(p);
        }
        numerator / denominator
    }
}
