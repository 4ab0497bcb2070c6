//! Stationary ARMA(p,q) block in companion form.
//!
//! ```text
//! x[t+1] = T * x[t] + R * e[t]      e[t] ~ N(0, sigma2)
//! y[t]   = x[t][0]
//! ```
//!
//! `T` has the AR coefficients in its first column and ones on the
//! super-diagonal; `R = [1, theta_1, ..., theta_q, 0, ...]`.

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, ArrayViewMut2, Axis};
use strata_ssf::{Dynamics, Measurement, Ssf, SsfError, stationary_covariance};

use crate::error::{ComponentError, check_variance};
use crate::params::is_stationary;

/// ARMA dynamics with the stationary initial covariance precomputed.
///
/// A non-stationary AR polynomial is accepted at construction and
/// reported through [`Dynamics::is_valid`].
#[derive(Clone, Debug)]
pub struct ArmaDynamics {
    ar: Vec<f64>,
    ma: Vec<f64>,
    variance: f64,
    r: Array1<f64>,
    rrt: Array2<f64>,
    pf0: Option<Array2<f64>>,
}

impl ArmaDynamics {
    /// ARMA block with unit innovation variance.
    pub fn new(ar: &[f64], ma: &[f64]) -> Self {
        let p = ar.len();
        let q = ma.len();
        let dim = p.max(q + 1).max(1);

        let mut r = Array1::zeros(dim);
        r[0] = 1.0;
        for (j, theta) in ma.iter().enumerate() {
            r[j + 1] = *theta;
        }
        let rrt = r.view().insert_axis(Axis(1)).dot(&r.view().insert_axis(Axis(0)));

        let mut arma = Self {
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            variance: 1.0,
            r,
            rrt,
            pf0: None,
        };
        arma.pf0 = arma.initial_covariance();
        arma
    }

    /// Sets the innovation variance.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidVariance`] for a negative or
    /// non-finite variance.
    pub fn with_variance(mut self, variance: f64) -> Result<Self, ComponentError> {
        self.variance = check_variance(variance)?;
        let unit = self.r.view().insert_axis(Axis(1)).dot(&self.r.view().insert_axis(Axis(0)));
        self.rrt = unit * variance;
        self.pf0 = self.initial_covariance();
        Ok(self)
    }

    /// Stationary covariance, `None` when the AR polynomial has a root on
    /// or inside the unit circle.
    fn initial_covariance(&self) -> Option<Array2<f64>> {
        if !is_stationary(&self.ar) {
            return None;
        }
        stationary_covariance(self.transition().view(), self.rrt.view())
    }

    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Companion transition matrix.
    pub fn transition(&self) -> Array2<f64> {
        let dim = self.r.len();
        let mut t = Array2::zeros((dim, dim));
        for (i, phi) in self.ar.iter().enumerate() {
            t[[i, 0]] = *phi;
        }
        for i in 0..dim - 1 {
            t[[i, i + 1]] = 1.0;
        }
        t
    }

    /// State-space form observing the first state element.
    pub fn into_ssf(self) -> Result<Ssf, SsfError> {
        let dim = self.state_dim();
        Ssf::new(Box::new(self), Measurement::first(dim))
    }
}

impl Dynamics for ArmaDynamics {
    fn state_dim(&self) -> usize {
        self.r.len()
    }

    fn is_time_invariant(&self) -> bool {
        true
    }

    fn is_valid(&self) -> bool {
        self.pf0.is_some() && self.ma.iter().all(|x| x.is_finite())
    }

    fn innovations_dim(&self) -> usize {
        1
    }

    fn v(&self, _pos: usize, mut qm: ArrayViewMut2<'_, f64>) {
        qm.assign(&self.rrt);
    }

    fn s(&self, _pos: usize, mut sm: ArrayViewMut2<'_, f64>) {
        let sd = self.variance.sqrt();
        sm.column_mut(0).assign(&(&self.r * sd));
    }

    fn add_su(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>, u: ArrayView1<'_, f64>) {
        x.scaled_add(u[0] * self.variance.sqrt(), &self.r);
    }

    fn xs(&self, _pos: usize, x: ArrayView1<'_, f64>, mut xs: ArrayViewMut1<'_, f64>) {
        xs[0] = x.dot(&self.r) * self.variance.sqrt();
    }

    fn t(&self, _pos: usize, mut tr: ArrayViewMut2<'_, f64>) {
        tr.assign(&self.transition());
    }

    fn non_stationary_dim(&self) -> usize {
        0
    }

    fn diffuse_constraints(&self, _b: ArrayViewMut2<'_, f64>) {}

    fn a0(&self, mut a0: ArrayViewMut1<'_, f64>) -> bool {
        a0.fill(0.0);
        true
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) -> bool {
        match &self.pf0 {
            Some(pf0) => {
                p.assign(pf0);
                true
            }
            None => false,
        }
    }

    fn pi0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p.fill(0.0);
    }

    fn tx(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let dim = x.len();
        let x0 = x[0];
        for i in 0..dim {
            let shifted = if i + 1 < dim { x[i + 1] } else { 0.0 };
            let phi = self.ar.get(i).copied().unwrap_or(0.0);
            x[i] = phi * x0 + shifted;
        }
    }

    fn xt(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let dim = x.len();
        let first: f64 = self.ar.iter().zip(x.iter()).map(|(phi, xi)| phi * xi).sum();
        for j in (1..dim).rev() {
            x[j] = x[j - 1];
        }
        x[0] = first;
    }

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        p += &self.rrt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn ar1_companion() {
        let arma = ArmaDynamics::new(&[0.5], &[]);
        assert_eq!(arma.state_dim(), 1);
        assert_eq!(arma.transition(), array![[0.5]]);
        let mut p = Array2::zeros((1, 1));
        assert!(arma.pf0(p.view_mut()));
        assert_abs_diff_eq!(p[[0, 0]], 1.0 / 0.75, epsilon = 1e-12);
    }

    #[test]
    fn ma1_companion() {
        let arma = ArmaDynamics::new(&[], &[0.8]);
        assert_eq!(arma.state_dim(), 2);
        assert_eq!(arma.transition(), array![[0.0, 1.0], [0.0, 0.0]]);
        let mut v = Array2::zeros((2, 2));
        arma.v(0, v.view_mut());
        assert_abs_diff_eq!(v, array![[1.0, 0.8], [0.8, 0.64]], epsilon = 1e-12);
    }

    #[test]
    fn arma22_companion() {
        let arma = ArmaDynamics::new(&[0.5, -0.3], &[0.4, 0.2]);
        assert_eq!(arma.state_dim(), 3);
        assert_eq!(
            arma.transition(),
            array![[0.5, 1.0, 0.0], [-0.3, 0.0, 1.0], [0.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn arma00_is_white_noise() {
        let arma = ArmaDynamics::new(&[], &[]);
        assert_eq!(arma.state_dim(), 1);
        let mut p = Array2::zeros((1, 1));
        assert!(arma.pf0(p.view_mut()));
        assert_abs_diff_eq!(p[[0, 0]], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn tx_and_xt_match_dense() {
        let arma = ArmaDynamics::new(&[0.5, -0.3, 0.1], &[0.4]);
        let t = arma.transition();
        let x = array![1.0, -2.0, 0.5];

        let mut tx = x.clone();
        arma.tx(0, tx.view_mut());
        assert_abs_diff_eq!(tx, t.dot(&x), epsilon = 1e-15);

        let mut xt = x.clone();
        arma.xt(0, xt.view_mut());
        assert_abs_diff_eq!(xt, x.dot(&t), epsilon = 1e-15);
    }

    #[test]
    fn tvt_matches_dense() {
        let arma = ArmaDynamics::new(&[0.6, 0.2], &[0.3, -0.1]);
        let t = arma.transition();
        let v = array![[2.0, 0.3, 0.1], [0.3, 1.0, -0.2], [0.1, -0.2, 0.5]];
        let mut got = v.clone();
        arma.tvt(0, got.view_mut());
        assert_abs_diff_eq!(got, t.dot(&v).dot(&t.t()), epsilon = 1e-14);
    }

    #[test]
    fn pf0_solves_lyapunov() {
        let arma = ArmaDynamics::new(&[0.7, -0.2], &[0.5]).with_variance(2.0).unwrap();
        let t = arma.transition();
        let mut p = Array2::zeros((2, 2));
        assert!(arma.pf0(p.view_mut()));
        let mut v = Array2::zeros((2, 2));
        arma.v(0, v.view_mut());
        let rhs = t.dot(&p).dot(&t.t()) + &v;
        assert_abs_diff_eq!(p, rhs, epsilon = 1e-10);
    }

    #[test]
    fn validity_follows_ar_stationarity() {
        for ar in [vec![1.0], vec![-1.0], vec![f64::NAN], vec![0.2, 0.8]] {
            assert!(!ArmaDynamics::new(&ar, &[0.4]).is_valid(), "ar = {ar:?}");
        }
        for ar in [vec![0.99], vec![0.5, -0.3], vec![]] {
            assert!(ArmaDynamics::new(&ar, &[0.4]).is_valid(), "ar = {ar:?}");
        }
    }

    #[test]
    fn non_stationary_is_invalid() {
        let arma = ArmaDynamics::new(&[1.0], &[]);
        assert!(!arma.is_valid());
        let mut p = Array2::zeros((1, 1));
        assert!(!arma.pf0(p.view_mut()));
        assert!(!ArmaDynamics::new(&[0.5, 0.6], &[]).is_valid());
        assert!(!ArmaDynamics::new(&[1.2], &[0.3]).is_valid());
    }

    #[test]
    fn with_variance_scales_covariances() {
        let arma = ArmaDynamics::new(&[0.5], &[]).with_variance(4.0).unwrap();
        let mut p = Array2::zeros((1, 1));
        assert!(arma.pf0(p.view_mut()));
        assert_abs_diff_eq!(p[[0, 0]], 4.0 / 0.75, epsilon = 1e-12);
        let mut s = Array2::zeros((1, 1));
        arma.s(0, s.view_mut());
        assert_abs_diff_eq!(s[[0, 0]], 2.0, epsilon = 1e-15);
        assert!(ArmaDynamics::new(&[0.5], &[]).with_variance(-1.0).is_err());
    }

    #[test]
    fn into_ssf_observes_first_element() {
        let ssf = ArmaDynamics::new(&[0.5], &[0.4]).into_ssf().unwrap();
        assert_eq!(ssf.measurement().loading(), array![1.0, 0.0].view());
        assert!(ssf.is_valid());
    }
}
