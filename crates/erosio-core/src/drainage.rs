//! Cumulative drainage-area accumulation over the resolved stream forest.

use crate::stream_graph::StreamGraph;

/// Sum each node's own area plus everything upstream of it.
///
/// Post-order over the forest, done as a pre-order worklist pass followed by
/// a reverse sweep pushing subtree totals into the downstream parent; every
/// node is visited exactly once and no call stack is consumed.
pub fn accumulate(graph: &StreamGraph, area: &[f64]) -> Vec<f64> {
    let mut order: Vec<u32> = Vec::with_capacity(graph.node_count());
    let mut stack: Vec<u32> = graph.roots.clone();
    while let Some(u) = stack.pop() {
        order.push(u);
        stack.extend_from_slice(&graph.upstream[u as usize]);
    }
    debug_assert_eq!(order.len(), graph.node_count());

    let mut drainage = area.to_vec();
    for &u in order.iter().rev() {
        if let Some(d) = graph.downstream[u as usize] {
            drainage[d as usize] += drainage[u as usize];
        }
    }
    drainage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bounds, Geometry};
    use crate::point::Point;
    use crate::stream_graph::StreamGraph;
    use approx::assert_relative_eq;

    #[test]
    fn chain_accumulates_linearly() {
        // Ramp along x: every row is an independent west-flowing chain.
        let g = Geometry::grid(
            Bounds::new(Point::new(0.0, 0.0), Point::new(3.0, 0.0)),
            1.0,
        )
        .unwrap();
        let heights: Vec<f64> = g.points.iter().map(|p| p.x).collect();
        let graph = StreamGraph::build(&g, &heights);
        let drainage = accumulate(&graph, &g.area);
        // Node at x=0 is the root of a 4-node chain.
        for (id, p) in g.points.iter().enumerate() {
            let upstream_nodes = 4.0 - p.x;
            assert_relative_eq!(drainage[id], upstream_nodes, epsilon = 1e-12);
        }
    }

    #[test]
    fn conservation_over_roots() {
        let g = Geometry::grid(
            Bounds::new(Point::new(0.0, 0.0), Point::new(5.0, 5.0)),
            1.0,
        )
        .unwrap();
        let heights: Vec<f64> = g
            .points
            .iter()
            .map(|p| (p.x * 1.3).sin() + (p.y * 0.7).cos())
            .collect();
        let graph = StreamGraph::build(&g, &heights);
        let drainage = accumulate(&graph, &g.area);

        // Every node carries at least its own area.
        for id in 0..g.node_count() {
            assert!(drainage[id] >= g.area[id] - 1e-12);
        }
        // Root totals sum to the total surface area.
        let root_total: f64 = graph.roots.iter().map(|&r| drainage[r as usize]).sum();
        let total: f64 = g.area.iter().sum();
        assert_relative_eq!(root_total, total, epsilon = 1e-9);
    }
}
