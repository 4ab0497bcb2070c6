//! One evaluated point of an [`SsfFunction`].

use std::sync::OnceLock;

use ndarray::Array1;
use strata_ssf::{DiffuseLikelihood, Ssf};
use tracing::debug;

use crate::function::{Mapper, SsfFunction};

/// Immutable result of evaluating an [`SsfFunction`] at a parameter vector.
///
/// A point whose parameters do not map to a valid model, or whose filter
/// pass fails, has no likelihood; every objective value is then NaN.
#[derive(Debug)]
pub struct SsfFunctionInstance<'a, M: Mapper> {
    function: &'a SsfFunction<M>,
    parameters: Array1<f64>,
    ssf: Option<Ssf>,
    likelihood: Option<DiffuseLikelihood>,
    e: OnceLock<Vec<f64>>,
}

impl<'a, M: Mapper> SsfFunctionInstance<'a, M> {
    pub(crate) fn new(function: &'a SsfFunction<M>, parameters: Array1<f64>) -> Self {
        let p = parameters.to_vec();
        let (ssf, likelihood) = match function.mapper().map(&p) {
            Ok(ssf) if ssf.is_valid() => {
                match function.filter().filter(&ssf, function.data()) {
                    Ok(out) => {
                        let likelihood = out.likelihood;
                        (Some(ssf), Some(likelihood))
                    }
                    Err(err) => {
                        debug!(%err, ?p, "likelihood evaluation failed");
                        (Some(ssf), None)
                    }
                }
            }
            Ok(ssf) => {
                debug!(?p, "parameters map to an invalid model");
                (Some(ssf), None)
            }
            Err(err) => {
                debug!(%err, ?p, "parameters rejected by mapper");
                (None, None)
            }
        };
        Self {
            function,
            parameters,
            ssf,
            likelihood,
            e: OnceLock::new(),
        }
    }

    pub fn parameters(&self) -> &Array1<f64> {
        &self.parameters
    }

    /// Mapped model, `None` when the mapper rejected the parameters.
    pub fn ssf(&self) -> Option<&Ssf> {
        self.ssf.as_ref()
    }

    pub fn likelihood(&self) -> Option<&DiffuseLikelihood> {
        self.likelihood.as_ref()
    }

    /// Objective this point belongs to.
    pub fn function(&self) -> &'a SsfFunction<M> {
        self.function
    }

    /// Defined residuals, scaled by the square root of the determinantal
    /// factor for a maximum-likelihood objective, so that their sum of
    /// squares shares the likelihood optimum. Computed on first access.
    pub fn e(&self) -> Option<&[f64]> {
        let likelihood = self.likelihood.as_ref()?;
        let residuals = self.e.get_or_init(|| {
            let scale = if self.function.is_ml() {
                likelihood.factor().sqrt()
            } else {
                1.0
            };
            likelihood
                .residuals()
                .iter()
                .filter(|r| !r.is_nan())
                .map(|r| r * scale)
                .collect()
        });
        Some(residuals.as_slice())
    }

    /// Scalar objective to minimise.
    pub fn value(&self) -> f64 {
        let Some(likelihood) = &self.likelihood else {
            return f64::NAN;
        };
        if self.function.is_ml() {
            -likelihood.log_likelihood()
        } else if self.function.is_log() {
            likelihood.ssq_err().ln()
        } else {
            likelihood.ssq_err()
        }
    }

    /// Sum of squares of [`e`](Self::e); under `ml` a monotone transform of
    /// the negative log-likelihood.
    pub fn ssq_e(&self) -> f64 {
        let Some(likelihood) = &self.likelihood else {
            return f64::NAN;
        };
        if self.function.is_ml() {
            likelihood.ssq_err() * likelihood.factor()
        } else {
            likelihood.ssq_err()
        }
    }
}
