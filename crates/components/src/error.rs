//! Error types for the strata-components crate.

/// Error type for invalid component specifications.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComponentError {
    /// Returned when a variance is negative or not finite.
    #[error("invalid variance: {value}")]
    InvalidVariance {
        /// Offending value.
        value: f64,
    },

    /// Returned when a seasonal period is zero.
    #[error("invalid period: {period}")]
    InvalidPeriod {
        /// Offending period.
        period: usize,
    },

    /// Returned when a noisy position does not fall inside the period.
    #[error("noisy period {noisy} out of range for period {period}")]
    NoisyPeriodOutOfRange {
        /// Offending position.
        noisy: usize,
        /// Length of the period.
        period: usize,
    },
}

pub(crate) fn check_variance(value: f64) -> Result<f64, ComponentError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ComponentError::InvalidVariance { value })
    }
}
