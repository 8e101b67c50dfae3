//! Fluvial erosion over irregular 2D sample sets.
//!
//! Simulates tectonic uplift competing against stream-power incision and
//! slope-limited thermal erosion, iterated to convergence, after the implicit
//! formulation of Cordonnier et al., *Large Scale Terrain Generation from
//! Tectonic Uplift and Fluvial Erosion* (2016).
//!
//! Each erosion cycle:
//!   1. links every node to its steepest-descending neighbor
//!      ([`StreamGraph::build`]),
//!   2. merges closed drainage basins into the boundary-connected network
//!      through their cheapest mountain passes (`lakes`),
//!   3. accumulates upstream drainage area (`drainage`),
//!   4. solves the backward-Euler stream-power balance root-to-leaf
//!      (`solver`).
//!
//! [`erode`] drives the loop and reports the eroded heightfield, the river
//! network, and the convergence outcome; [`HeightSampler`] turns the discrete
//! result into a continuous field for rendering.

pub mod drainage;
pub mod eroder;
pub mod error;
pub mod fields;
pub mod geometry;
pub mod interp;
pub mod lakes;
pub mod point;
pub mod solver;
pub mod stream_graph;

pub use eroder::{erode, EroderEdge, EroderResults, EroderSettings, SurfaceFn};
pub use error::ErosionError;
pub use geometry::{Bounds, Geometry};
pub use interp::HeightSampler;
pub use point::Point;
pub use stream_graph::StreamGraph;
