//! Time-invariant dynamics given by explicit matrices, and dense helpers.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::dynamics::Dynamics;
use crate::error::SsfError;

/// Time-invariant dynamics defined by dense `T` and `S` matrices.
///
/// `V = S * S'`. The initial state defaults to a zero mean, a zero
/// stationary covariance and no diffuse directions; use the builder
/// methods to change them.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use strata_ssf::{Dynamics, MatrixDynamics};
///
/// let dynamics = MatrixDynamics::new(array![[0.5]], array![[1.0]]).unwrap();
/// assert_eq!(dynamics.state_dim(), 1);
/// assert_eq!(dynamics.innovations_dim(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct MatrixDynamics {
    t: Array2<f64>,
    s: Array2<f64>,
    v: Array2<f64>,
    a0: Array1<f64>,
    pf0: Array2<f64>,
    b: Array2<f64>,
}

impl MatrixDynamics {
    /// Builds dynamics from a square transition `t` (`n × n`) and a
    /// disturbance loading `s` (`n × k`).
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsfError::ZeroStateDim`] | `t` is empty |
    /// | [`SsfError::DimensionMismatch`] | `t` not square or `s` has the wrong row count |
    pub fn new(t: Array2<f64>, s: Array2<f64>) -> Result<Self, SsfError> {
        let n = t.nrows();
        if n == 0 {
            return Err(SsfError::ZeroStateDim);
        }
        if t.ncols() != n {
            return Err(SsfError::DimensionMismatch {
                expected: n,
                got: t.ncols(),
            });
        }
        if s.nrows() != n {
            return Err(SsfError::DimensionMismatch {
                expected: n,
                got: s.nrows(),
            });
        }
        let v = s.dot(&s.t());
        Ok(Self {
            t,
            s,
            v,
            a0: Array1::zeros(n),
            pf0: Array2::zeros((n, n)),
            b: Array2::zeros((n, 0)),
        })
    }

    /// Sets the stationary part of the initial covariance.
    pub fn with_pf0(mut self, pf0: Array2<f64>) -> Self {
        self.pf0 = pf0;
        self
    }

    /// Sets the initial state mean.
    pub fn with_a0(mut self, a0: Array1<f64>) -> Self {
        self.a0 = a0;
        self
    }

    /// Sets the diffuse constraints `B` (`n × d`); `Pi0 = B * B'`.
    pub fn with_diffuse(mut self, b: Array2<f64>) -> Self {
        self.b = b;
        self
    }

    /// Sets `Pf0` to the stationary covariance of the process, if it exists.
    pub fn with_stationary_pf0(mut self) -> Option<Self> {
        self.pf0 = stationary_covariance(self.t.view(), self.v.view())?;
        Some(self)
    }

    pub fn transition(&self) -> ArrayView2<'_, f64> {
        self.t.view()
    }

    pub fn covariance(&self) -> ArrayView2<'_, f64> {
        self.v.view()
    }
}

impl Dynamics for MatrixDynamics {
    fn state_dim(&self) -> usize {
        self.t.nrows()
    }

    fn is_time_invariant(&self) -> bool {
        true
    }

    fn is_valid(&self) -> bool {
        let n = self.state_dim();
        self.pf0.dim() == (n, n)
            && self.a0.len() == n
            && self.b.nrows() == n
            && self.t.iter().chain(self.s.iter()).all(|x| x.is_finite())
    }

    fn innovations_dim(&self) -> usize {
        self.s.ncols()
    }

    fn v(&self, _pos: usize, mut qm: ArrayViewMut2<'_, f64>) {
        qm.assign(&self.v);
    }

    fn s(&self, _pos: usize, mut sm: ArrayViewMut2<'_, f64>) {
        sm.assign(&self.s);
    }

    fn add_su(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>, u: ArrayView1<'_, f64>) {
        x += &self.s.dot(&u);
    }

    fn xs(&self, _pos: usize, x: ArrayView1<'_, f64>, mut xs: ArrayViewMut1<'_, f64>) {
        xs.assign(&x.dot(&self.s));
    }

    fn t(&self, _pos: usize, mut tr: ArrayViewMut2<'_, f64>) {
        tr.assign(&self.t);
    }

    fn non_stationary_dim(&self) -> usize {
        self.b.ncols()
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b.assign(&self.b);
    }

    fn a0(&self, mut a0: ArrayViewMut1<'_, f64>) -> bool {
        a0.assign(&self.a0);
        true
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) -> bool {
        p.assign(&self.pf0);
        true
    }

    fn pi0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p.assign(&self.b.dot(&self.b.t()));
    }

    fn tx(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let y = self.t.dot(&x);
        x.assign(&y);
    }

    fn xt(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let y = x.dot(&self.t);
        x.assign(&y);
    }

    fn tvt(&self, _pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        let tvt = self.t.dot(&v).dot(&self.t.t());
        v.assign(&tvt);
    }

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        p += &self.v;
    }
}

/// Solves `P = T P T' + V` with the doubling algorithm.
///
/// Returns `None` when the iteration does not converge, i.e. when `T` has
/// an eigenvalue on or outside the unit circle.
pub fn stationary_covariance(t: ArrayView2<'_, f64>, v: ArrayView2<'_, f64>) -> Option<Array2<f64>> {
    const MAX_ITER: usize = 64;
    const TOL: f64 = 1e-15;

    let mut a = t.to_owned();
    let mut p = v.to_owned();
    for _ in 0..MAX_ITER {
        let apa = a.dot(&p).dot(&a.t());
        p += &apa;
        a = a.dot(&a);
        if p.iter().any(|x| !x.is_finite()) {
            return None;
        }
        let norm = a.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        if !norm.is_finite() {
            return None;
        }
        if norm < TOL {
            symmetrize(p.view_mut());
            return Some(p);
        }
    }
    None
}

/// Replaces `m` by `(m + m') / 2`.
pub(crate) fn symmetrize(mut m: ArrayViewMut2<'_, f64>) {
    let n = m.nrows();
    for i in 0..n {
        for j in 0..i {
            let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
            m[[i, j]] = avg;
            m[[j, i]] = avg;
        }
    }
}
