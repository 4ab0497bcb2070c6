//! Univariate state-space form: dynamics plus a linear measurement.
//!
//! ```text
//! y[t]   = Z * a[t] + e[t]        e[t] ~ N(0, h)
//! a[t+1] = T * a[t] + S * u[t]
//! ```

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::composite::CompositeDynamics;
use crate::dynamics::Dynamics;
use crate::error::SsfError;

/// Time-invariant measurement equation `y = Z a + e`, `var(e) = h`.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    loading: Array1<f64>,
    variance: f64,
}

impl Measurement {
    pub fn new(loading: Array1<f64>, variance: f64) -> Self {
        Self { loading, variance }
    }

    /// Observes the first state element without measurement error.
    pub fn first(dim: usize) -> Self {
        let mut loading = Array1::zeros(dim);
        if dim > 0 {
            loading[0] = 1.0;
        }
        Self::new(loading, 0.0)
    }

    /// Returns the loading vector `Z`.
    pub fn loading(&self) -> ArrayView1<'_, f64> {
        self.loading.view()
    }

    /// Returns the measurement error variance `h`.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// `Z * x`.
    pub fn zx(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.loading.dot(&x)
    }

    /// `m * Z'`, with `m` an `n × n` matrix.
    pub fn mz(&self, m: ArrayView2<'_, f64>) -> Array1<f64> {
        m.dot(&self.loading)
    }
}

/// A dynamics block together with its measurement.
#[derive(Debug)]
pub struct Ssf {
    dynamics: Box<dyn Dynamics>,
    measurement: Measurement,
}

impl Ssf {
    /// Pairs `dynamics` with `measurement`.
    ///
    /// # Errors
    ///
    /// Returns [`SsfError::DimensionMismatch`] if the loading length differs
    /// from the state dimension.
    pub fn new(dynamics: Box<dyn Dynamics>, measurement: Measurement) -> Result<Self, SsfError> {
        let n = dynamics.state_dim();
        if measurement.loading.len() != n {
            return Err(SsfError::DimensionMismatch {
                expected: n,
                got: measurement.loading.len(),
            });
        }
        Ok(Self {
            dynamics,
            measurement,
        })
    }

    /// Juxtaposes several state-space forms: the state is the concatenation
    /// of the component states, the observation is the sum of the component
    /// observations.
    ///
    /// # Errors
    ///
    /// Propagates [`CompositeDynamics::new`] failures.
    pub fn composite(parts: Vec<Ssf>) -> Result<Self, SsfError> {
        let mut dynamics = Vec::with_capacity(parts.len());
        let mut loading = Vec::new();
        let mut variance = 0.0;
        for part in parts {
            loading.extend(part.measurement.loading.iter().copied());
            variance += part.measurement.variance;
            dynamics.push(part.dynamics);
        }
        let composite = CompositeDynamics::new(dynamics)?;
        Self::new(
            Box::new(composite),
            Measurement::new(Array1::from(loading), variance),
        )
    }

    pub fn dynamics(&self) -> &dyn Dynamics {
        self.dynamics.as_ref()
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn state_dim(&self) -> usize {
        self.dynamics.state_dim()
    }

    pub fn is_valid(&self) -> bool {
        self.dynamics.is_valid()
            && self.measurement.variance.is_finite()
            && self.measurement.variance >= 0.0
    }
}

/// Observed series. Missing observations are stored as NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct SsfData {
    values: Vec<f64>,
}

impl SsfData {
    /// Wraps `values`; any non-finite entry is treated as missing.
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v } else { f64::NAN })
            .collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observation at `pos`, or `None` when missing.
    pub fn get(&self, pos: usize) -> Option<f64> {
        self.values.get(pos).copied().filter(|v| !v.is_nan())
    }

    pub fn is_missing(&self, pos: usize) -> bool {
        self.get(pos).is_none()
    }

    /// Number of non-missing observations.
    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl From<&[f64]> for SsfData {
    fn from(values: &[f64]) -> Self {
        Self::new(values.to_vec())
    }
}
