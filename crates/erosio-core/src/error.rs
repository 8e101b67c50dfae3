use thiserror::Error;

/// Fail-fast validation errors for erosion inputs.
///
/// The core itself is a pure numerical transform with no recoverable error
/// taxonomy; everything here is caught before the first cycle runs.
#[derive(Debug, Error)]
pub enum ErosionError {
    /// Zero or near-zero inter-node spacing would divide by zero in the
    /// stream-power term.
    #[error("minimum node spacing must be positive and finite, got {spacing}")]
    DegenerateSpacing { spacing: f64 },

    #[error("time step must be positive and finite, got {time_step}")]
    NonPositiveTimeStep { time_step: f64 },

    #[error("stream-power exponent must lie in [0, 1], got {exponent}")]
    ExponentOutOfRange { exponent: f64 },

    #[error("at least one erosion cycle is required")]
    ZeroIterationBudget,

    #[error("convergence threshold must be non-negative and finite, got {threshold}")]
    InvalidThreshold { threshold: f64 },

    #[error("geometry has no nodes")]
    EmptyGeometry,
}
