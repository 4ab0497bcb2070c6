//! The state-dynamics capability set shared by every state-space block.
//!
//! ```text
//! a[t+1] = T(t) * a[t] + S(t) * u[t]      u[t] ~ N(0, I)
//! V(t)   = S(t) * S(t)'
//! a[0]   ~ N(a0, Pf0 + k * Pi0),  k -> infinity
//! ```
//!
//! All operators write into caller-owned buffers. Sizes are a caller
//! contract: passing a view of the wrong shape panics inside `ndarray`.

use std::fmt;

use ndarray::{Array2, ArrayView1, ArrayViewMut1, ArrayViewMut2};

/// Transition, disturbance and initial-state description of one
/// state-space block.
///
/// Implementors must keep every covariance update symmetric and positive
/// semi-definite so that blocks can be freely composed by
/// [`CompositeDynamics`](crate::CompositeDynamics).
pub trait Dynamics: fmt::Debug + Send + Sync {
    /// Dimension of the state vector.
    fn state_dim(&self) -> usize;

    /// `true` when `T`, `V` and `S` do not depend on the time index.
    fn is_time_invariant(&self) -> bool;

    /// `false` when the block parameters do not describe a usable model.
    fn is_valid(&self) -> bool;

    /// Number of independent disturbances (columns of `S`).
    fn innovations_dim(&self) -> usize;

    /// Whether any disturbance enters the state at `pos`.
    fn has_innovations(&self, _pos: usize) -> bool {
        self.innovations_dim() > 0
    }

    /// Writes the disturbance covariance `V(pos)` into `qm` (`n × n`).
    fn v(&self, pos: usize, qm: ArrayViewMut2<'_, f64>);

    /// Writes the square-root factor `S(pos)` into `sm` (`n × innovations_dim`).
    fn s(&self, pos: usize, sm: ArrayViewMut2<'_, f64>);

    /// `x += S(pos) * u`.
    fn add_su(&self, pos: usize, x: ArrayViewMut1<'_, f64>, u: ArrayView1<'_, f64>);

    /// `xs = x * S(pos)`.
    fn xs(&self, pos: usize, x: ArrayView1<'_, f64>, xs: ArrayViewMut1<'_, f64>);

    /// Writes the transition matrix `T(pos)` into `tr` (`n × n`).
    fn t(&self, pos: usize, tr: ArrayViewMut2<'_, f64>);

    /// Number of diffuse (non-stationary) directions of the initial state.
    fn non_stationary_dim(&self) -> usize;

    fn is_diffuse(&self) -> bool {
        self.non_stationary_dim() > 0
    }

    /// Writes the diffuse constraint matrix `B` (`n × non_stationary_dim`),
    /// with `Pi0 = B * B'`.
    fn diffuse_constraints(&self, b: ArrayViewMut2<'_, f64>);

    /// Writes the initial state mean. Returns `false` if it cannot be computed.
    fn a0(&self, a0: ArrayViewMut1<'_, f64>) -> bool;

    /// Writes the stationary part of the initial covariance.
    /// Returns `false` if it cannot be computed.
    fn pf0(&self, p: ArrayViewMut2<'_, f64>) -> bool;

    /// Writes the diffuse part of the initial covariance.
    fn pi0(&self, p: ArrayViewMut2<'_, f64>);

    /// `x = T(pos) * x`.
    fn tx(&self, pos: usize, x: ArrayViewMut1<'_, f64>);

    /// `x = x * T(pos)`.
    fn xt(&self, pos: usize, x: ArrayViewMut1<'_, f64>);

    /// `m = T(pos) * m`, column by column.
    fn tm(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        for col in m.columns_mut() {
            self.tx(pos, col);
        }
    }

    /// `v = T(pos) * v * T(pos)'`, in place.
    fn tvt(&self, pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        self.tm(pos, v.view_mut());
        self.tm(pos, v.view_mut().reversed_axes());
    }

    /// `p += V(pos)`.
    fn add_v(&self, pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        let n = self.state_dim();
        let mut q = Array2::zeros((n, n));
        self.v(pos, q.view_mut());
        p += &q;
    }
}
