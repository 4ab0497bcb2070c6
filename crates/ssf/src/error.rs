//! Error types for the strata-ssf crate.

/// Error type for all fallible operations in the strata-ssf crate.
///
/// Covers composition failures, dimension mismatches between dynamics and
/// measurement, and numerical breakdowns of the diffuse filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SsfError {
    /// Returned when a composite is built from an empty component list.
    #[error("composite dynamics requires at least one component")]
    EmptyComposite,

    /// Returned when the joint state dimension is zero.
    #[error("state dimension is zero")]
    ZeroStateDim,

    /// Returned when a measurement loading does not match the state dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension required by the dynamics.
        expected: usize,
        /// Dimension actually supplied.
        got: usize,
    },

    /// Returned when the dynamics report `is_valid() == false`.
    #[error("state-space model is not valid")]
    InvalidModel,

    /// Returned when the initial state mean or covariance cannot be computed.
    #[error("initial state could not be computed")]
    InvalidInitialization,

    /// Returned when a forecast variance is non-positive or non-finite.
    #[error("singular forecast variance at position {pos}")]
    SingularVariance {
        /// Observation index at which the breakdown happened.
        pos: usize,
    },

    /// Returned when too few observations remain after the diffuse phase.
    #[error("insufficient data: {n} observations, {nd} absorbed by diffuse initialisation")]
    InsufficientData {
        /// Number of non-missing observations.
        n: usize,
        /// Number of diffuse steps.
        nd: usize,
    },

    /// Returned when the prediction errors carry no information on the scale.
    #[error("degenerate likelihood: sum of squared residuals is {ssq}")]
    DegenerateResiduals {
        /// Offending sum of squares.
        ssq: f64,
    },

    /// Returned when the observed series is empty.
    #[error("observed series is empty")]
    EmptyData,
}
