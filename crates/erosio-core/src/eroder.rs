//! The erosion orchestrator: field sampling, the per-cycle pipeline
//! (stream graph → basin resolution → drainage → implicit solve), and the
//! convergence/iteration contract.

use serde::{Deserialize, Serialize};

use crate::drainage::accumulate;
use crate::error::ErosionError;
use crate::fields::Fields;
use crate::geometry::Geometry;
use crate::lakes::resolve_basins;
use crate::point::Point;
use crate::solver::solve;
use crate::stream_graph::StreamGraph;

/// A point-to-scalar surface function.
pub type SurfaceFn = Box<dyn Fn(Point) -> f64>;

/// Erosion parameters.
///
/// The three surface functions are sampled once per node before the first
/// cycle; `max_slope_degrees` is re-evaluated every cycle at the candidate
/// new height (thermal-erosion stability may be rock-type- and therefore
/// elevation-dependent). All values are scale-free; unit consistency is the
/// caller's responsibility.
pub struct EroderSettings {
    /// Tectonic uplift rate at a point.
    pub uplift: SurfaceFn,
    /// Starting elevation at a point.
    pub initial_height: SurfaceFn,
    /// Stream-power erosion coefficient `k` at a point.
    pub erosion_rate: SurfaceFn,
    /// Stream-power area exponent `m`, in `[0, 1]`.
    pub exponent: f64,
    /// Maximum stable slope (degrees) at a point and candidate height.
    pub max_slope_degrees: Box<dyn Fn(Point, f64) -> f64>,
    /// Simulated time between erosion cycles; positive.
    pub time_step: f64,
    /// Hard budget of erosion cycles; at least 1.
    pub max_iterations: u32,
    /// Per-node height delta under which a cycle counts as converged.
    pub convergence_threshold: f64,
}

impl Default for EroderSettings {
    fn default() -> Self {
        Self {
            uplift: Box::new(|_| 1.0),
            initial_height: Box::new(|_| 0.0),
            erosion_rate: Box::new(|_| 2.0),
            exponent: 0.5,
            max_slope_degrees: Box::new(|_, _| 30.0),
            time_step: 1.0,
            max_iterations: 10,
            convergence_threshold: 1e-2,
        }
    }
}

impl EroderSettings {
    fn validate(&self) -> Result<(), ErosionError> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(ErosionError::NonPositiveTimeStep { time_step: self.time_step });
        }
        if !(0.0..=1.0).contains(&self.exponent) {
            return Err(ErosionError::ExponentOutOfRange { exponent: self.exponent });
        }
        if self.max_iterations == 0 {
            return Err(ErosionError::ZeroIterationBudget);
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(ErosionError::InvalidThreshold {
                threshold: self.convergence_threshold,
            });
        }
        Ok(())
    }
}

/// A river segment of the final fluvial network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EroderEdge {
    /// Where water flows from.
    pub origin: Point,
    /// Where water flows to.
    pub destination: Point,
    /// Drainage volume passing through the origin.
    pub volume_origin: f64,
    /// Drainage volume passing through the destination.
    pub volume_destination: f64,
}

/// The output of [`erode`].
pub struct EroderResults {
    /// Final per-node elevation, indexed by geometry node id.
    pub heights: Vec<f64>,
    pub min_height: f64,
    pub max_height: f64,
    /// The final fluvial network, one edge per stream-forest link.
    pub edges: Vec<EroderEdge>,
    /// 1-based cycle count at which per-node deltas first fell within the
    /// convergence threshold; `None` when the iteration budget ran out first
    /// (a normal, reportable outcome).
    pub converged_after: Option<u32>,
    /// Nodes whose final root is not a boundary drain — only non-empty when
    /// the geometry graph has a component with no boundary access.
    pub landlocked: Vec<u32>,
    /// The geometry the run was computed over.
    pub geometry: Geometry,
}

/// Run the full erosion loop over `geometry`.
///
/// Each cycle rebuilds the steepest-descent stream forest, merges closed
/// basins into the drain-connected network, accumulates drainage area, and
/// applies the implicit stream-power update, until every per-node height
/// delta is within `settings.convergence_threshold` or the iteration budget
/// is exhausted.
pub fn erode(settings: EroderSettings, geometry: Geometry) -> Result<EroderResults, ErosionError> {
    settings.validate()?;
    if geometry.min_distance <= 0.0 || !geometry.min_distance.is_finite() {
        return Err(ErosionError::DegenerateSpacing { spacing: geometry.min_distance });
    }
    if geometry.node_count() == 0 {
        return Err(ErosionError::EmptyGeometry);
    }

    let mut fields = Fields::sample(&geometry, &settings);

    let mut converged_after = None;
    let mut final_graph: Option<StreamGraph> = None;
    let mut final_drainage: Vec<f64> = Vec::new();

    for cycle in 1..=settings.max_iterations {
        let mut graph = StreamGraph::build(&geometry, &fields.height);
        resolve_basins(&mut graph, &geometry, &fields.height);
        let drainage = accumulate(&graph, &geometry.area);
        let new_height = solve(
            &graph,
            &geometry,
            &fields.height,
            &fields.uplift,
            &fields.erosion_rate,
            &drainage,
            &settings,
        );

        let converged = fields
            .height
            .iter()
            .zip(new_height.iter())
            .all(|(&old, &new)| (new - old).abs() <= settings.convergence_threshold);

        fields.height = new_height;
        final_graph = Some(graph);
        final_drainage = drainage;

        if converged {
            converged_after = Some(cycle);
            break;
        }
    }

    // max_iterations ≥ 1, so the loop body ran at least once.
    let graph = final_graph.ok_or(ErosionError::ZeroIterationBudget)?;

    let edges = collect_edges(&graph, &geometry, &final_drainage);
    let landlocked = collect_landlocked(&graph, &geometry);

    let (mut min_height, mut max_height) = (f64::INFINITY, f64::NEG_INFINITY);
    for &h in &fields.height {
        min_height = min_height.min(h);
        max_height = max_height.max(h);
    }

    Ok(EroderResults {
        heights: fields.height,
        min_height,
        max_height,
        edges,
        converged_after,
        landlocked,
        geometry,
    })
}

/// One output edge per forest link, annotated with the drainage volume at
/// both endpoints for downstream rendering.
fn collect_edges(graph: &StreamGraph, geometry: &Geometry, drainage: &[f64]) -> Vec<EroderEdge> {
    let mut edges = Vec::with_capacity(graph.node_count() - graph.roots.len());
    for (u, &down) in graph.downstream.iter().enumerate() {
        if let Some(d) = down {
            edges.push(EroderEdge {
                origin: geometry.points[u],
                destination: geometry.points[d as usize],
                volume_origin: drainage[u],
                volume_destination: drainage[d as usize],
            });
        }
    }
    edges
}

/// Nodes left under a non-boundary root: drainage that never reaches a
/// system outlet because its component is disconnected from every drain.
fn collect_landlocked(graph: &StreamGraph, geometry: &Geometry) -> Vec<u32> {
    if graph
        .roots
        .iter()
        .all(|&r| geometry.boundary[r as usize])
    {
        return Vec::new();
    }
    let basin = graph.basin_of();
    (0..graph.node_count() as u32)
        .filter(|&u| !geometry.boundary[basin[u as usize] as usize])
        .collect()
}
