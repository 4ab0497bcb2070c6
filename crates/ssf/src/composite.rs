//! Juxtaposition of several dynamics into one block-diagonal state.
//!
//! The joint state is the concatenation of the component states. `T`, `V`
//! and the initial covariances are block diagonal, so almost every operator
//! is forwarded to the diagonal block of each component. The exception is
//! [`Dynamics::tvt`], which must also propagate the cross-component blocks
//! of a full covariance matrix.

use ndarray::{ArrayView1, ArrayViewMut1, ArrayViewMut2, s};

use crate::block::{BlockCursor, SegmentCursor};
use crate::dynamics::Dynamics;
use crate::error::SsfError;

/// Dynamics generated by a juxtaposition of several dynamics.
#[derive(Debug)]
pub struct CompositeDynamics {
    components: Vec<Box<dyn Dynamics>>,
    dims: Vec<usize>,
    state_dim: usize,
}

impl CompositeDynamics {
    /// Builds the composite of `components`, in order.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsfError::EmptyComposite`] | `components` is empty |
    /// | [`SsfError::ZeroStateDim`] | all components have a zero state dimension |
    pub fn new(components: Vec<Box<dyn Dynamics>>) -> Result<Self, SsfError> {
        if components.is_empty() {
            return Err(SsfError::EmptyComposite);
        }
        let dims: Vec<usize> = components.iter().map(|c| c.state_dim()).collect();
        let state_dim = dims.iter().sum();
        if state_dim == 0 {
            return Err(SsfError::ZeroStateDim);
        }
        Ok(Self {
            components,
            dims,
            state_dim,
        })
    }

    pub fn components_count(&self) -> usize {
        self.components.len()
    }

    /// Returns the component at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= components_count()`.
    pub fn component(&self, pos: usize) -> &dyn Dynamics {
        self.components[pos].as_ref()
    }

    /// State dimension of each component, in order.
    pub fn component_dims(&self) -> &[usize] {
        &self.dims
    }

    fn iter(&self) -> impl Iterator<Item = (&(dyn Dynamics + 'static), usize)> + '_ {
        self.components
            .iter()
            .map(|c| &**c)
            .zip(self.dims.iter().copied())
    }
}

impl Dynamics for CompositeDynamics {
    fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn is_time_invariant(&self) -> bool {
        self.components.iter().all(|c| c.is_time_invariant())
    }

    fn is_valid(&self) -> bool {
        self.components.iter().all(|c| c.is_valid())
    }

    fn innovations_dim(&self) -> usize {
        self.components.iter().map(|c| c.innovations_dim()).sum()
    }

    fn has_innovations(&self, pos: usize) -> bool {
        self.components.iter().any(|c| c.has_innovations(pos))
    }

    fn v(&self, pos: usize, mut qm: ArrayViewMut2<'_, f64>) {
        let mut cur = BlockCursor::top_left();
        for (c, n) in self.iter() {
            cur = cur.next(n, n);
            c.v(pos, cur.view_mut(&mut qm));
        }
    }

    fn s(&self, pos: usize, mut sm: ArrayViewMut2<'_, f64>) {
        // rows follow the state, columns follow the innovations
        let mut cur = BlockCursor::top_left();
        for (c, n) in self.iter() {
            let nu = c.innovations_dim();
            cur = cur.next(n, nu);
            if nu > 0 {
                c.s(pos, cur.view_mut(&mut sm));
            }
        }
    }

    fn add_su(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>, u: ArrayView1<'_, f64>) {
        let mut xcur = SegmentCursor::start();
        let mut ucur = SegmentCursor::start();
        for (c, n) in self.iter() {
            let nu = c.innovations_dim();
            xcur = xcur.next(n);
            if nu > 0 {
                ucur = ucur.next(nu);
                c.add_su(pos, xcur.view_mut(&mut x), ucur.view(&u));
            }
        }
    }

    fn xs(&self, pos: usize, x: ArrayView1<'_, f64>, mut xs: ArrayViewMut1<'_, f64>) {
        let mut xcur = SegmentCursor::start();
        let mut ycur = SegmentCursor::start();
        for (c, n) in self.iter() {
            let nu = c.innovations_dim();
            xcur = xcur.next(n);
            if nu > 0 {
                ycur = ycur.next(nu);
                c.xs(pos, xcur.view(&x), ycur.view_mut(&mut xs));
            }
        }
    }

    fn t(&self, pos: usize, mut tr: ArrayViewMut2<'_, f64>) {
        let mut cur = BlockCursor::top_left();
        for (c, n) in self.iter() {
            cur = cur.next(n, n);
            c.t(pos, cur.view_mut(&mut tr));
        }
    }

    fn non_stationary_dim(&self) -> usize {
        self.components.iter().map(|c| c.non_stationary_dim()).sum()
    }

    fn is_diffuse(&self) -> bool {
        self.components.iter().any(|c| c.is_diffuse())
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        // state_dim x non_stationary_dim
        let mut cur = BlockCursor::top_left();
        for (c, n) in self.iter() {
            let nst = c.non_stationary_dim();
            if nst != 0 {
                cur = cur.next(n, nst);
                c.diffuse_constraints(cur.view_mut(&mut b));
            } else {
                cur = cur.vnext(n);
            }
        }
    }

    fn a0(&self, mut a0: ArrayViewMut1<'_, f64>) -> bool {
        let mut cur = SegmentCursor::start();
        for (c, n) in self.iter() {
            cur = cur.next(n);
            if !c.a0(cur.view_mut(&mut a0)) {
                return false;
            }
        }
        true
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) -> bool {
        let mut cur = BlockCursor::top_left();
        for (c, n) in self.iter() {
            cur = cur.next(n, n);
            if !c.pf0(cur.view_mut(&mut p)) {
                return false;
            }
        }
        true
    }

    fn pi0(&self, mut p: ArrayViewMut2<'_, f64>) {
        let mut cur = BlockCursor::top_left();
        for (c, n) in self.iter() {
            cur = cur.next(n, n);
            c.pi0(cur.view_mut(&mut p));
        }
    }

    fn tx(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let mut cur = SegmentCursor::start();
        for (c, n) in self.iter() {
            cur = cur.next(n);
            c.tx(pos, cur.view_mut(&mut x));
        }
    }

    fn xt(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let mut cur = SegmentCursor::start();
        for (c, n) in self.iter() {
            cur = cur.next(n);
            c.xt(pos, cur.view_mut(&mut x));
        }
    }

    fn tm(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        // T is block diagonal: each component transforms its own rows
        let mut cur = 0;
        for (c, n) in self.iter() {
            c.tm(pos, m.slice_mut(s![cur..cur + n, ..]));
            cur += n;
        }
    }

    fn tvt(&self, pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        let count = self.components.len();
        let mut d = BlockCursor::top_left();
        for i in 0..count {
            let ni = self.dims[i];
            d = d.next(ni, ni);
            self.components[i].tvt(pos, d.view_mut(&mut v));
            // c walks down the block column i (blocks (j, i)), r walks along
            // the block row i (blocks (i, j)), for j > i.
            let mut c = d;
            let mut r = d;
            for j in i + 1..count {
                let nj = self.dims[j];
                c = c.vnext(nj);
                r = r.hnext(nj);
                let (mut lower, mut upper) =
                    v.multi_slice_mut((s![c.rows(), c.cols()], s![r.rows(), r.cols()]));
                // lower = T_j * P_ji, then lower' = T_i * lower' = T_i * P_ij * T_j'
                self.components[j].tm(pos, lower.view_mut());
                self.components[i].tm(pos, lower.view_mut().reversed_axes());
                upper.assign(&lower.t());
            }
        }
    }

    fn add_v(&self, pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        let mut cur = BlockCursor::top_left();
        for (c, n) in self.iter() {
            cur = cur.next(n, n);
            c.add_v(pos, cur.view_mut(&mut p));
        }
    }
}
