//! Closed-basin resolution ("delakefying").
//!
//! Every stream network must terminate at a boundary drain rather than at an
//! interior local minimum. This module merges endorheic basins into the
//! connected network by repeatedly spilling each basin through its cheapest
//! mountain pass into an already-connected neighbor — a priority-flood over
//! inter-basin passes rather than individual cells.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::geometry::Geometry;
use crate::stream_graph::StreamGraph;

/// The cheapest crossing between two adjacent drainage basins.
///
/// `pass_from`/`pass_to` are the adjacent nodes realising the crossing;
/// `height` is `max(height[pass_from], height[pass_to])` — the water level at
/// which the from-basin spills into the to-basin. Both orientations of a
/// basin pair are stored as separate records.
#[derive(Debug, Clone, Copy)]
pub struct LakePass {
    /// Root of the basin under consideration for absorption.
    pub root_from: u32,
    /// Root of the basin being spilled into.
    pub root_to: u32,
    /// Node on the from-basin side of the pass.
    pub pass_from: u32,
    /// Node on the to-basin side of the pass.
    pub pass_to: u32,
    pub height: f64,
}

impl LakePass {
    fn reversed(self) -> Self {
        Self {
            root_from: self.root_to,
            root_to: self.root_from,
            pass_from: self.pass_to,
            pass_to: self.pass_from,
            height: self.height,
        }
    }
}

// Candidate ordering: cheapest pass first, then a deterministic total order
// over the ids. Exact height ties are a measure-zero edge case; any fixed
// tie-break keeps the topology correct.
impl Ord for LakePass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.height
            .total_cmp(&other.height)
            .then_with(|| {
                (self.root_from, self.root_to, self.pass_from, self.pass_to).cmp(&(
                    other.root_from,
                    other.root_to,
                    other.pass_from,
                    other.pass_to,
                ))
            })
    }
}

impl PartialOrd for LakePass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for LakePass {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LakePass {}

// ── Pass index ────────────────────────────────────────────────────────────────

/// Two-directional index over lake passes, keyed independently by from-basin
/// and to-basin. Merging a basin invalidates every pass that originates at
/// it, so removal is a bulk operation on the from-key.
#[derive(Default)]
struct PassTable {
    by_from: HashMap<u32, HashMap<u32, LakePass>>,
    by_to: HashMap<u32, HashMap<u32, LakePass>>,
}

impl PassTable {
    fn get(&self, from: u32, to: u32) -> Option<&LakePass> {
        self.by_from.get(&from).and_then(|m| m.get(&to))
    }

    fn insert(&mut self, pass: LakePass) {
        self.by_from
            .entry(pass.root_from)
            .or_default()
            .insert(pass.root_to, pass);
        self.by_to
            .entry(pass.root_to)
            .or_default()
            .insert(pass.root_from, pass);
    }

    /// All passes terminating at `basin` (neighbors that could spill into it).
    fn passes_into(&self, basin: u32) -> impl Iterator<Item = LakePass> + '_ {
        self.by_to.get(&basin).into_iter().flat_map(|m| m.values().copied())
    }

    /// Drop and return every pass originating at `basin`, scrubbing both
    /// indices.
    fn drain_from(&mut self, basin: u32) -> Vec<LakePass> {
        let removed: Vec<LakePass> = self
            .by_from
            .remove(&basin)
            .map(|m| m.into_values().collect())
            .unwrap_or_default();
        for pass in &removed {
            if let Some(m) = self.by_to.get_mut(&pass.root_to) {
                m.remove(&basin);
            }
        }
        removed
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Merge every interior-root basin into the drain-connected network.
///
/// Basins whose component never touches a boundary drain stay unresolved;
/// their roots simply remain in `graph.roots` (closed lakes, reported by the
/// controller rather than treated as an error).
pub fn resolve_basins(graph: &mut StreamGraph, geometry: &Geometry, heights: &[f64]) {
    let drains: HashSet<u32> = graph
        .roots
        .iter()
        .copied()
        .filter(|&r| geometry.boundary[r as usize])
        .collect();

    // Fast path: every root already exits the system.
    if drains.len() == graph.roots.len() {
        return;
    }

    let mut passes = discover_passes(graph, geometry, heights);

    // A drain is never absorbed: scrub every pass originating at one before
    // collecting candidates, so no drain→drain pass can enter the frontier.
    for &drain in &drains {
        passes.drain_from(drain);
    }

    // Seed with every pass spilling into a valid drain.
    let mut candidates: BTreeSet<LakePass> = BTreeSet::new();
    for &drain in &drains {
        candidates.extend(passes.passes_into(drain));
    }

    let mut merged: HashSet<u32> = HashSet::new();
    while let Some(active) = candidates.pop_first() {
        let basin = active.root_from;

        // The absorbed basin is now connected: its inbound passes become
        // frontier candidates, its outbound passes are consumed.
        let inbound: Vec<LakePass> = passes.passes_into(basin).collect();
        candidates.extend(inbound);
        for pass in passes.drain_from(basin) {
            candidates.remove(&pass);
        }

        // Redirect the whole absorbed subtree out through the pass.
        graph.upstream[active.pass_to as usize].push(basin);
        graph.downstream[basin as usize] = Some(active.pass_to);
        merged.insert(basin);
    }

    graph.roots.retain(|r| !merged.contains(r));
}

/// Scan every undirected geometry edge crossing a basin border and keep the
/// lowest pass per unordered basin pair, in both orientations.
fn discover_passes(graph: &StreamGraph, geometry: &Geometry, heights: &[f64]) -> PassTable {
    let basin = graph.basin_of();
    let mut passes = PassTable::default();
    for (u, nbrs) in geometry.neighbors.iter().enumerate() {
        let basin_u = basin[u];
        for &v in nbrs {
            let basin_v = basin[v as usize];
            if basin_u == basin_v {
                continue;
            }
            let height = heights[u].max(heights[v as usize]);
            let dominated = passes
                .get(basin_u, basin_v)
                .is_some_and(|best| best.height <= height);
            if dominated {
                continue;
            }
            let pass = LakePass {
                root_from: basin_u,
                root_to: basin_v,
                pass_from: u as u32,
                pass_to: v,
                height,
            };
            passes.insert(pass);
            passes.insert(pass.reversed());
        }
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bounds, Geometry};
    use crate::point::Point;

    fn grid(n: usize) -> Geometry {
        let max = (n - 1) as f64;
        Geometry::grid(
            Bounds::new(Point::new(0.0, 0.0), Point::new(max, max)),
            1.0,
        )
        .unwrap()
    }

    /// Follow downstream pointers to the terminal root.
    fn root_of(graph: &StreamGraph, mut node: usize) -> usize {
        while let Some(d) = graph.downstream[node] {
            node = d as usize;
        }
        node
    }

    #[test]
    fn all_boundary_roots_is_a_no_op() {
        // Monotone ramp: a single drain chain per column, roots on the rim.
        let g = grid(4);
        let heights: Vec<f64> = g.points.iter().map(|p| p.x).collect();
        let mut graph = StreamGraph::build(&g, &heights);
        let roots_before = graph.roots.clone();
        resolve_basins(&mut graph, &g, &heights);
        assert_eq!(graph.roots, roots_before);
    }

    #[test]
    fn interior_pit_merges_into_boundary_drain() {
        let g = grid(5);
        // Bowl rim at the center: interior depression walled by higher ground.
        let heights: Vec<f64> = g
            .points
            .iter()
            .map(|p| {
                let (dx, dy) = (p.x - 2.0, p.y - 2.0);
                let r = (dx * dx + dy * dy).sqrt();
                if r < 0.5 {
                    -1.0 // the pit
                } else if r < 1.5 {
                    3.0 // the crater wall
                } else {
                    0.0
                }
            })
            .collect();
        let mut graph = StreamGraph::build(&g, &heights);
        assert!(
            graph.roots.iter().any(|&r| !g.boundary[r as usize]),
            "test terrain must start with an interior lake"
        );
        resolve_basins(&mut graph, &g, &heights);
        for &r in &graph.roots {
            assert!(g.boundary[r as usize], "root {r} is not a boundary drain");
        }
        // Every node now reaches a boundary drain.
        for u in 0..g.node_count() {
            assert!(g.boundary[root_of(&graph, u)]);
        }
    }

    #[test]
    fn merged_lake_exits_through_lowest_wall() {
        // Trench at x=2 walled by 5.0 on the west and 2.0 on the east: the
        // cheap eastern passes must carry the trench out; no trench node may
        // ever drain westward across the expensive wall.
        let g = grid(5);
        let profile = |x: f64| match x as i64 {
            0 => 0.0,
            1 => 5.0,
            2 => -2.0,
            3 => 2.0,
            _ => 0.0,
        };
        let heights: Vec<f64> = g.points.iter().map(|p| profile(p.x)).collect();
        let mut graph = StreamGraph::build(&g, &heights);
        resolve_basins(&mut graph, &g, &heights);

        for u in 0..g.node_count() {
            assert!(g.boundary[root_of(&graph, u)], "node {u} lands in a lake");
            if heights[u] == -2.0 {
                let exit = graph.downstream[u].expect("trench node must drain") as usize;
                assert!(
                    g.points[exit].x >= 2.0,
                    "trench node {u} exited west through the 5.0 wall at {:?}",
                    g.points[exit]
                );
            }
        }
    }

    #[test]
    fn pass_table_bulk_invalidation() {
        let mk = |from, to, h| LakePass {
            root_from: from,
            root_to: to,
            pass_from: from,
            pass_to: to,
            height: h,
        };
        let mut table = PassTable::default();
        for pass in [mk(1, 2, 0.5), mk(1, 3, 0.25), mk(2, 1, 0.5), mk(3, 1, 0.25)] {
            table.insert(pass);
        }
        let removed = table.drain_from(1);
        assert_eq!(removed.len(), 2);
        assert!(table.get(1, 2).is_none());
        assert!(table.get(1, 3).is_none());
        // Reverse orientations survive, and their to-index no longer lists 1.
        assert!(table.get(2, 1).is_some());
        assert_eq!(table.passes_into(1).count(), 0);
    }

    #[test]
    fn candidate_order_is_cheapest_first() {
        let mk = |from, h| LakePass {
            root_from: from,
            root_to: 99,
            pass_from: from,
            pass_to: 99,
            height: h,
        };
        let mut set = BTreeSet::new();
        set.insert(mk(1, 3.0));
        set.insert(mk(2, 0.5));
        set.insert(mk(3, 1.25));
        assert_eq!(set.iter().next().unwrap().root_from, 2);
    }
}
