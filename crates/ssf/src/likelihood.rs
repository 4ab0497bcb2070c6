//! Concentrated Gaussian likelihood produced by the diffuse filter.

use std::f64::consts::PI;

use crate::error::SsfError;

/// Sufficient statistics of one filter pass, with the scale `σ²`
/// concentrated out.
///
/// ```text
/// m       = n - nd
/// sigma2  = ssq / m
/// factor  = exp((ldet + dcorr) / m)
/// loglik  = -0.5 * [m * (ln 2π + 1 + ln sigma2) + ldet + dcorr]
/// ```
///
/// `ssq * factor = m * exp(-2 * loglik / m - ln 2π - 1)` is increasing in
/// `-loglik`, so minimising the scaled sum of squares maximises the
/// likelihood.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffuseLikelihood {
    n: usize,
    nd: usize,
    ssq_err: f64,
    ldet: f64,
    dcorr: f64,
    residuals: Vec<f64>,
}

impl DiffuseLikelihood {
    /// Assembles the statistics of a completed pass.
    ///
    /// `residuals` holds one entry per position, NaN where the residual is
    /// undefined (missing observation or diffuse step).
    ///
    /// # Errors
    ///
    /// - [`SsfError::InsufficientData`] when no observation is left once
    ///   the diffuse steps are removed.
    /// - [`SsfError::DegenerateResiduals`] when `ssq_err` is not finite and
    ///   strictly positive.
    pub fn new(
        n: usize,
        nd: usize,
        ssq_err: f64,
        ldet: f64,
        dcorr: f64,
        residuals: Vec<f64>,
    ) -> Result<Self, SsfError> {
        if n <= nd {
            return Err(SsfError::InsufficientData { n, nd });
        }
        if !(ssq_err.is_finite() && ssq_err > 0.0) {
            return Err(SsfError::DegenerateResiduals { ssq: ssq_err });
        }
        Ok(Self {
            n,
            nd,
            ssq_err,
            ldet,
            dcorr,
            residuals,
        })
    }

    /// Number of non-missing observations.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Number of observations absorbed by the diffuse initialisation.
    pub fn diffuse_count(&self) -> usize {
        self.nd
    }

    /// Sum of squared standardised prediction errors.
    pub fn ssq_err(&self) -> f64 {
        self.ssq_err
    }

    /// `Σ ln f` over the standard updates.
    pub fn ldet(&self) -> f64 {
        self.ldet
    }

    /// `Σ ln fi` over the diffuse updates.
    pub fn diffuse_correction(&self) -> f64 {
        self.dcorr
    }

    /// Standardised residuals `e / √f`, NaN where undefined.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Maximum likelihood estimate of the scale, `ssq / (n - nd)`.
    pub fn sigma2(&self) -> f64 {
        self.ssq_err / self.effective_dim()
    }

    /// Determinantal factor `exp((ldet + dcorr) / (n - nd))`.
    pub fn factor(&self) -> f64 {
        ((self.ldet + self.dcorr) / self.effective_dim()).exp()
    }

    pub fn log_likelihood(&self) -> f64 {
        let m = self.effective_dim();
        -0.5 * (m * ((2.0 * PI).ln() + 1.0 + self.sigma2().ln()) + self.ldet + self.dcorr)
    }

    fn effective_dim(&self) -> f64 {
        (self.n - self.nd) as f64
    }
}
