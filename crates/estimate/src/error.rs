//! Error types for the strata-estimate crate.

use strata_components::ComponentError;
use strata_ssf::SsfError;

/// Error type for all fallible operations in the strata-estimate crate.
///
/// A parameter point that maps to an unusable model is not an error: it
/// evaluates to a NaN objective. Only failures that stop an estimation
/// surface here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimationError {
    /// State-space construction or filtering failed.
    #[error(transparent)]
    Ssf(#[from] SsfError),

    /// A model component was misspecified.
    #[error(transparent)]
    Component(#[from] ComponentError),

    /// Returned when [`EstimationConfig::validate`](crate::EstimationConfig::validate) fails.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Returned when the minimizer itself fails.
    #[error("minimizer failed: {0}")]
    Minimizer(String),

    /// Returned when the best point found has no likelihood.
    #[error("no valid likelihood at the optimum")]
    NoLikelihood,

    /// Returned when the observed series has no observation.
    #[error("observed series is empty")]
    EmptySeries,

    /// Returned when a TOML configuration cannot be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(String),
}
