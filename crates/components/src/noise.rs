//! White noise restricted to a subset of the periods of a cycle.
//!
//! The state at time `t` is the irregular of observation `t`. Its variance
//! is `variance` when `t mod period` is listed as noisy and zero otherwise,
//! so the block is time-varying.

use ndarray::{ArrayView1, ArrayViewMut1, ArrayViewMut2};
use strata_ssf::{Dynamics, Measurement, Ssf, SsfError};

use crate::error::{ComponentError, check_variance};

/// Extra irregular injected at selected periods (e.g. months).
#[derive(Clone, Debug, PartialEq)]
pub struct NoisyPeriods {
    period: usize,
    noisy: Vec<bool>,
    variance: f64,
}

impl NoisyPeriods {
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ComponentError::InvalidPeriod`] | `period == 0` |
    /// | [`ComponentError::NoisyPeriodOutOfRange`] | an entry of `noisy` is `>= period` |
    /// | [`ComponentError::InvalidVariance`] | negative or non-finite `variance` |
    pub fn new(period: usize, noisy: &[usize], variance: f64) -> Result<Self, ComponentError> {
        if period == 0 {
            return Err(ComponentError::InvalidPeriod { period });
        }
        let mut mask = vec![false; period];
        for &pos in noisy {
            if pos >= period {
                return Err(ComponentError::NoisyPeriodOutOfRange { noisy: pos, period });
            }
            mask[pos] = true;
        }
        Ok(Self {
            period,
            noisy: mask,
            variance: check_variance(variance)?,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Sorted noisy positions within the period.
    pub fn noisy(&self) -> Vec<usize> {
        self.noisy
            .iter()
            .enumerate()
            .filter_map(|(i, &n)| n.then_some(i))
            .collect()
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// `true` when observation `pos` carries the extra noise.
    pub fn is_noisy(&self, pos: usize) -> bool {
        self.noisy[pos % self.period]
    }

    pub fn into_ssf(self) -> Result<Ssf, SsfError> {
        Ssf::new(Box::new(self), Measurement::first(1))
    }

    /// Variance entering the state during the transition from `pos` to `pos + 1`.
    fn transition_variance(&self, pos: usize) -> f64 {
        if self.is_noisy(pos + 1) {
            self.variance
        } else {
            0.0
        }
    }
}

impl Dynamics for NoisyPeriods {
    fn state_dim(&self) -> usize {
        1
    }

    fn is_time_invariant(&self) -> bool {
        false
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn innovations_dim(&self) -> usize {
        1
    }

    fn has_innovations(&self, pos: usize) -> bool {
        self.transition_variance(pos) > 0.0
    }

    fn v(&self, pos: usize, mut qm: ArrayViewMut2<'_, f64>) {
        qm[[0, 0]] = self.transition_variance(pos);
    }

    fn s(&self, pos: usize, mut sm: ArrayViewMut2<'_, f64>) {
        sm[[0, 0]] = self.transition_variance(pos).sqrt();
    }

    fn add_su(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>, u: ArrayView1<'_, f64>) {
        x[0] += self.transition_variance(pos).sqrt() * u[0];
    }

    fn xs(&self, pos: usize, x: ArrayView1<'_, f64>, mut xs: ArrayViewMut1<'_, f64>) {
        xs[0] = x[0] * self.transition_variance(pos).sqrt();
    }

    fn t(&self, _pos: usize, mut tr: ArrayViewMut2<'_, f64>) {
        tr[[0, 0]] = 0.0;
    }

    fn non_stationary_dim(&self) -> usize {
        0
    }

    fn diffuse_constraints(&self, _b: ArrayViewMut2<'_, f64>) {}

    fn a0(&self, mut a0: ArrayViewMut1<'_, f64>) -> bool {
        a0[0] = 0.0;
        true
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) -> bool {
        p[[0, 0]] = if self.is_noisy(0) { self.variance } else { 0.0 };
        true
    }

    fn pi0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] = 0.0;
    }

    fn tx(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[0] = 0.0;
    }

    fn xt(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[0] = 0.0;
    }

    fn tvt(&self, _pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        v[[0, 0]] = 0.0;
    }

    fn add_v(&self, pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.transition_variance(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    #[test]
    fn rejects_bad_specification() {
        assert_eq!(
            NoisyPeriods::new(0, &[], 1.0).unwrap_err(),
            ComponentError::InvalidPeriod { period: 0 }
        );
        assert_eq!(
            NoisyPeriods::new(4, &[1, 4], 1.0).unwrap_err(),
            ComponentError::NoisyPeriodOutOfRange {
                noisy: 4,
                period: 4
            }
        );
        assert!(NoisyPeriods::new(4, &[1], f64::NAN).is_err());
    }

    #[test]
    fn noisy_positions_are_sorted_and_unique() {
        let noise = NoisyPeriods::new(12, &[11, 0, 11, 5], 1.0).unwrap();
        assert_eq!(noise.noisy(), vec![0, 5, 11]);
        assert!(noise.is_noisy(12));
        assert!(noise.is_noisy(17));
        assert!(!noise.is_noisy(13));
    }

    #[test]
    fn variance_follows_next_observation() {
        let noise = NoisyPeriods::new(4, &[2], 3.0).unwrap();
        assert!(!noise.is_time_invariant());

        let mut v = Array2::zeros((1, 1));
        // Transition 1 -> 2 feeds observation 2.
        noise.v(1, v.view_mut());
        assert_eq!(v, array![[3.0]]);
        assert!(noise.has_innovations(1));
        noise.v(2, v.view_mut());
        assert_eq!(v, array![[0.0]]);
        assert!(!noise.has_innovations(2));
        noise.v(5, v.view_mut());
        assert_eq!(v, array![[3.0]]);
    }

    #[test]
    fn initial_variance_depends_on_first_period() {
        let mut p = Array2::zeros((1, 1));
        assert!(NoisyPeriods::new(4, &[0], 2.0).unwrap().pf0(p.view_mut()));
        assert_eq!(p, array![[2.0]]);
        assert!(NoisyPeriods::new(4, &[1], 2.0).unwrap().pf0(p.view_mut()));
        assert_eq!(p, array![[0.0]]);
    }

    #[test]
    fn transition_forgets_state() {
        let noise = NoisyPeriods::new(2, &[1], 1.0).unwrap();
        let mut p = array![[5.0]];
        noise.tvt(0, p.view_mut());
        noise.add_v(0, p.view_mut());
        assert_eq!(p, array![[1.0]]);
    }
}
