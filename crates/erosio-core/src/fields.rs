//! Per-node scalar fields sampled once from the caller-supplied surface
//! functions before the first erosion cycle.

use crate::eroder::EroderSettings;
use crate::geometry::Geometry;

/// The sampled input fields plus the evolving height field.
///
/// `uplift` and `erosion_rate` are static for the whole run; `height` is the
/// only field that evolves, and it is replaced wholesale each cycle.
pub struct Fields {
    pub uplift: Vec<f64>,
    pub erosion_rate: Vec<f64>,
    pub height: Vec<f64>,
}

impl Fields {
    /// Evaluate the settings' surface functions at every node. One entry per
    /// node, no missing keys; panics from caller closures propagate.
    pub fn sample(geometry: &Geometry, settings: &EroderSettings) -> Self {
        let n = geometry.node_count();
        let mut uplift = Vec::with_capacity(n);
        let mut erosion_rate = Vec::with_capacity(n);
        let mut height = Vec::with_capacity(n);
        for &p in &geometry.points {
            uplift.push((settings.uplift)(p));
            erosion_rate.push((settings.erosion_rate)(p));
            height.push((settings.initial_height)(p));
        }
        Self { uplift, erosion_rate, height }
    }
}
