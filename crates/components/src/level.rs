//! Random-walk level and local linear trend blocks.
//!
//! Both have a fully diffuse initial state.
//!
//! ```text
//! level:  l[t+1] = l[t] + u[t]                      var(u) = s2_l
//! trend:  l[t+1] = l[t] + d[t] + u[t]
//!         d[t+1] = d[t] + w[t]                      var(w) = s2_d
//! ```

use ndarray::{ArrayView1, ArrayViewMut1, ArrayViewMut2};
use strata_ssf::{Dynamics, Measurement, Ssf, SsfError};

use crate::error::{ComponentError, check_variance};

/// Random walk with a diffuse start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalLevel {
    variance: f64,
}

impl LocalLevel {
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidVariance`] for a negative or
    /// non-finite variance.
    pub fn new(variance: f64) -> Result<Self, ComponentError> {
        Ok(Self {
            variance: check_variance(variance)?,
        })
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn into_ssf(self) -> Result<Ssf, SsfError> {
        Ssf::new(Box::new(self), Measurement::first(1))
    }
}

impl Dynamics for LocalLevel {
    fn state_dim(&self) -> usize {
        1
    }

    fn is_time_invariant(&self) -> bool {
        true
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn innovations_dim(&self) -> usize {
        usize::from(self.variance > 0.0)
    }

    fn v(&self, _pos: usize, mut qm: ArrayViewMut2<'_, f64>) {
        qm[[0, 0]] = self.variance;
    }

    fn s(&self, _pos: usize, mut sm: ArrayViewMut2<'_, f64>) {
        if self.variance > 0.0 {
            sm[[0, 0]] = self.variance.sqrt();
        }
    }

    fn add_su(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>, u: ArrayView1<'_, f64>) {
        if self.variance > 0.0 {
            x[0] += self.variance.sqrt() * u[0];
        }
    }

    fn xs(&self, _pos: usize, x: ArrayView1<'_, f64>, mut xs: ArrayViewMut1<'_, f64>) {
        if self.variance > 0.0 {
            xs[0] = x[0] * self.variance.sqrt();
        }
    }

    fn t(&self, _pos: usize, mut tr: ArrayViewMut2<'_, f64>) {
        tr[[0, 0]] = 1.0;
    }

    fn non_stationary_dim(&self) -> usize {
        1
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b[[0, 0]] = 1.0;
    }

    fn a0(&self, mut a0: ArrayViewMut1<'_, f64>) -> bool {
        a0[0] = 0.0;
        true
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) -> bool {
        p[[0, 0]] = 0.0;
        true
    }

    fn pi0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] = 1.0;
    }

    fn tx(&self, _pos: usize, _x: ArrayViewMut1<'_, f64>) {}

    fn xt(&self, _pos: usize, _x: ArrayViewMut1<'_, f64>) {}

    fn tvt(&self, _pos: usize, _v: ArrayViewMut2<'_, f64>) {}

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.variance;
    }
}

/// Level plus slope, both diffuse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalLinearTrend {
    level_variance: f64,
    slope_variance: f64,
}

impl LocalLinearTrend {
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidVariance`] if either variance is
    /// negative or non-finite.
    pub fn new(level_variance: f64, slope_variance: f64) -> Result<Self, ComponentError> {
        Ok(Self {
            level_variance: check_variance(level_variance)?,
            slope_variance: check_variance(slope_variance)?,
        })
    }

    pub fn level_variance(&self) -> f64 {
        self.level_variance
    }

    pub fn slope_variance(&self) -> f64 {
        self.slope_variance
    }

    pub fn into_ssf(self) -> Result<Ssf, SsfError> {
        Ssf::new(Box::new(self), Measurement::first(2))
    }

    /// `(state row, standard deviation)` of every active disturbance.
    fn disturbances(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        [self.level_variance, self.slope_variance]
            .into_iter()
            .enumerate()
            .filter(|(_, v)| *v > 0.0)
            .map(|(row, v)| (row, v.sqrt()))
    }
}

impl Dynamics for LocalLinearTrend {
    fn state_dim(&self) -> usize {
        2
    }

    fn is_time_invariant(&self) -> bool {
        true
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn innovations_dim(&self) -> usize {
        self.disturbances().count()
    }

    fn v(&self, _pos: usize, mut qm: ArrayViewMut2<'_, f64>) {
        qm.fill(0.0);
        qm[[0, 0]] = self.level_variance;
        qm[[1, 1]] = self.slope_variance;
    }

    fn s(&self, _pos: usize, mut sm: ArrayViewMut2<'_, f64>) {
        sm.fill(0.0);
        for (col, (row, sd)) in self.disturbances().enumerate() {
            sm[[row, col]] = sd;
        }
    }

    fn add_su(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>, u: ArrayView1<'_, f64>) {
        for (col, (row, sd)) in self.disturbances().enumerate() {
            x[row] += sd * u[col];
        }
    }

    fn xs(&self, _pos: usize, x: ArrayView1<'_, f64>, mut xs: ArrayViewMut1<'_, f64>) {
        for (col, (row, sd)) in self.disturbances().enumerate() {
            xs[col] = x[row] * sd;
        }
    }

    fn t(&self, _pos: usize, mut tr: ArrayViewMut2<'_, f64>) {
        tr[[0, 0]] = 1.0;
        tr[[0, 1]] = 1.0;
        tr[[1, 0]] = 0.0;
        tr[[1, 1]] = 1.0;
    }

    fn non_stationary_dim(&self) -> usize {
        2
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b.fill(0.0);
        b[[0, 0]] = 1.0;
        b[[1, 1]] = 1.0;
    }

    fn a0(&self, mut a0: ArrayViewMut1<'_, f64>) -> bool {
        a0.fill(0.0);
        true
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) -> bool {
        p.fill(0.0);
        true
    }

    fn pi0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p.fill(0.0);
        p[[0, 0]] = 1.0;
        p[[1, 1]] = 1.0;
    }

    fn tx(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[0] += x[1];
    }

    fn xt(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[1] += x[0];
    }

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.level_variance;
        p[[1, 1]] += self.slope_variance;
    }
}
