//! Steepest-descent stream forest, rebuilt from the height field every
//! erosion cycle.

use crate::geometry::Geometry;

/// A directed forest over the node set: each node drains to at most one
/// downstream neighbor, and `upstream` holds the reverse edges.
///
/// Roots have no downstream target — either valid system drains (boundary
/// nodes) or unresolved lake bottoms awaiting basin resolution.
pub struct StreamGraph {
    /// Nodes draining into each node.
    pub upstream: Vec<Vec<u32>>,
    /// The single downstream target of each node, if any.
    pub downstream: Vec<Option<u32>>,
    /// Nodes with no downstream target.
    pub roots: Vec<u32>,
}

impl StreamGraph {
    /// Link every node to its strictly lowest neighbor under `heights`.
    ///
    /// A node with no strictly lower neighbor (pit or flat plateau) becomes a
    /// root. Exact height ties between neighbors resolve to the first minimum
    /// in adjacency iteration order; which one wins is implementation-defined
    /// and numerically negligible.
    pub fn build(geometry: &Geometry, heights: &[f64]) -> Self {
        let n = geometry.node_count();
        let mut upstream = vec![Vec::new(); n];
        let mut downstream = vec![None; n];
        let mut roots = Vec::new();

        for u in 0..n {
            let mut lowest = u;
            for &v in &geometry.neighbors[u] {
                if heights[v as usize] < heights[lowest] {
                    lowest = v as usize;
                }
            }
            if lowest == u {
                roots.push(u as u32);
            } else {
                upstream[lowest].push(u as u32);
                downstream[u] = Some(lowest as u32);
            }
        }

        Self { upstream, downstream, roots }
    }

    pub fn node_count(&self) -> usize {
        self.upstream.len()
    }

    /// Label every node with the root of its drainage basin, propagating root
    /// ids outward through the upstream edges with an explicit worklist.
    pub fn basin_of(&self) -> Vec<u32> {
        let mut basin = vec![u32::MAX; self.node_count()];
        let mut stack: Vec<u32> = Vec::with_capacity(self.roots.len());
        for &r in &self.roots {
            basin[r as usize] = r;
            stack.push(r);
        }
        while let Some(u) = stack.pop() {
            let label = basin[u as usize];
            for &c in &self.upstream[u as usize] {
                basin[c as usize] = label;
                stack.push(c);
            }
        }
        basin
    }
}
