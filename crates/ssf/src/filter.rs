//! Exact initial (diffuse) Kalman filter for univariate observations.
//!
//! The initial state covariance is split as `Pf0 + k * Pi0` with
//! `k -> infinity`. While the diffuse part `Pi` is non-zero, each
//! observation that loads on it is absorbed into `Pi` and contributes
//! `ln fi` to the diffuse correction instead of a prediction error. Once
//! `Pi` vanishes the filter continues with the ordinary recursion.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::trace;

use crate::diffuse::DiffuseUpdateInformation;
use crate::error::SsfError;
use crate::likelihood::DiffuseLikelihood;
use crate::matrix::symmetrize;
use crate::ssf::{Ssf, SsfData};

/// Magnitude below which a diffuse norm or covariance entry is zero.
pub const DEFAULT_DIFFUSE_EPSILON: f64 = 1e-9;

/// Result of one filter pass.
#[derive(Clone, Debug)]
pub struct FilterOutput {
    pub likelihood: DiffuseLikelihood,
    /// Number of positions (missing included) spent in the diffuse phase.
    pub diffuse_steps: usize,
    /// Update records of the diffuse phase, when requested.
    pub diffuse_trace: Option<Vec<DiffuseUpdateInformation>>,
}

/// Configurable diffuse Kalman filter.
#[derive(Clone, Debug)]
pub struct DiffuseFilter {
    epsilon: f64,
    trace: bool,
}

impl Default for DiffuseFilter {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_DIFFUSE_EPSILON,
            trace: false,
        }
    }
}

impl DiffuseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the per-observation records of the diffuse phase.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Runs the filter over `data`.
    ///
    /// # Errors
    ///
    /// - [`SsfError::EmptyData`] if `data` is empty.
    /// - [`SsfError::InvalidModel`] if the model reports itself invalid.
    /// - [`SsfError::InvalidInitialization`] if `a0` or `Pf0` cannot be computed.
    /// - [`SsfError::SingularVariance`] on a non-positive forecast variance.
    /// - [`SsfError::InsufficientData`] if every observation is diffuse.
    /// - [`SsfError::DegenerateResiduals`] if every standardised prediction
    ///   error is zero.
    pub fn filter(&self, ssf: &Ssf, data: &SsfData) -> Result<FilterOutput, SsfError> {
        if data.is_empty() {
            return Err(SsfError::EmptyData);
        }
        if !ssf.is_valid() {
            return Err(SsfError::InvalidModel);
        }

        let dynamics = ssf.dynamics();
        let measurement = ssf.measurement();
        let dim = ssf.state_dim();
        let h = measurement.variance();
        let z = measurement.loading();

        let mut a = Array1::zeros(dim);
        let mut p = Array2::zeros((dim, dim));
        if !dynamics.a0(a.view_mut()) || !dynamics.pf0(p.view_mut()) {
            return Err(SsfError::InvalidInitialization);
        }
        let mut pi = Array2::zeros((dim, dim));
        dynamics.pi0(pi.view_mut());

        let nsd = dynamics.non_stationary_dim();
        let mut diffuse = nsd > 0 && max_abs(pi.view()) > self.epsilon;
        let mut diffuse_steps = 0;
        let mut records = self.trace.then(Vec::new);

        let mut n = 0;
        let mut nd = 0;
        let mut ssq = 0.0;
        let mut ldet = 0.0;
        let mut dcorr = 0.0;
        let mut residuals = vec![f64::NAN; data.len()];

        for pos in 0..data.len() {
            if let Some(y) = data.get(pos) {
                n += 1;
                let e = y - measurement.zx(a.view());
                let m = measurement.mz(p.view());
                let f = z.dot(&m) + h;

                if diffuse {
                    let mut info = DiffuseUpdateInformation::new(dim);
                    let mi = measurement.mz(pi.view());
                    let mut fi = z.dot(&mi);
                    if fi.abs() < self.epsilon {
                        fi = 0.0;
                    }
                    info.set_prediction_error(e);
                    info.set_variance(f);
                    info.set_diffuse_norm2(fi);
                    info.m_mut().assign(&m);
                    info.mi_mut().assign(&mi);

                    if info.is_diffuse() {
                        diffuse_update(&info, &mut a, &mut p, &mut pi);
                        dcorr += fi.ln();
                        nd += 1;
                    } else {
                        check_variance(f, pos)?;
                        residuals[pos] = standard_update(e, m.view(), f, &mut a, &mut p);
                        ssq += e * e / f;
                        ldet += f.ln();
                    }
                    if let Some(records) = records.as_mut() {
                        records.push(info);
                    }
                } else {
                    check_variance(f, pos)?;
                    residuals[pos] = standard_update(e, m.view(), f, &mut a, &mut p);
                    ssq += e * e / f;
                    ldet += f.ln();
                }
            }

            dynamics.tx(pos, a.view_mut());
            dynamics.tvt(pos, p.view_mut());
            dynamics.add_v(pos, p.view_mut());
            symmetrize(p.view_mut());

            if diffuse {
                dynamics.tvt(pos, pi.view_mut());
                symmetrize(pi.view_mut());
                diffuse_steps = pos + 1;
                if nd == nsd || max_abs(pi.view()) <= self.epsilon {
                    diffuse = false;
                    trace!(pos, nd, "diffuse phase closed");
                }
            }
        }

        let likelihood = DiffuseLikelihood::new(n, nd, ssq, ldet, dcorr, residuals)?;
        Ok(FilterOutput {
            likelihood,
            diffuse_steps,
            diffuse_trace: records,
        })
    }
}

fn check_variance(f: f64, pos: usize) -> Result<(), SsfError> {
    if f > 0.0 && f.is_finite() {
        Ok(())
    } else {
        Err(SsfError::SingularVariance { pos })
    }
}

/// `a += e m / f`, `P -= m m' / f`. Returns the standardised residual.
fn standard_update(
    e: f64,
    m: ArrayView1<'_, f64>,
    f: f64,
    a: &mut Array1<f64>,
    p: &mut Array2<f64>,
) -> f64 {
    a.scaled_add(e / f, &m);
    let n = m.len();
    for i in 0..n {
        for j in 0..n {
            p[[i, j]] -= m[i] * m[j] / f;
        }
    }
    e / f.sqrt()
}

fn diffuse_update(
    info: &DiffuseUpdateInformation,
    a: &mut Array1<f64>,
    p: &mut Array2<f64>,
    pi: &mut Array2<f64>,
) {
    let e = info.prediction_error();
    let f = info.variance();
    let fi = info.diffuse_norm2();
    let m = info.m();
    let mi = info.mi();

    a.scaled_add(e / fi, &mi);
    let c = f / (fi * fi);
    let n = mi.len();
    for i in 0..n {
        for j in 0..n {
            p[[i, j]] += c * mi[i] * mi[j] - (mi[i] * m[j] + m[i] * mi[j]) / fi;
            pi[[i, j]] -= mi[i] * mi[j] / fi;
        }
    }
}

fn max_abs(m: ArrayView2<'_, f64>) -> f64 {
    m.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}
