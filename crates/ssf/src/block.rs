//! Cursor types for walking the diagonal blocks of a joint state.
//!
//! A cursor is a plain value describing a rectangular window of a matrix
//! (or a segment of a vector). Navigation returns a new cursor; the buffer
//! itself is only borrowed when a view is requested, so a cursor never
//! outlives or aliases the caller's storage.

use std::ops::Range;

use ndarray::{ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Data, DataMut};
use ndarray::{Ix1, Ix2, s};

/// Rectangular window `{row, col, nrows, ncols}` into a matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockCursor {
    row: usize,
    col: usize,
    nrows: usize,
    ncols: usize,
}

impl BlockCursor {
    /// Creates a window with explicit position and size.
    pub fn new(row: usize, col: usize, nrows: usize, ncols: usize) -> Self {
        Self {
            row,
            col,
            nrows,
            ncols,
        }
    }

    /// Empty window anchored at `(0, 0)`. The first call to [`next`](Self::next)
    /// yields the leading block.
    pub fn top_left() -> Self {
        Self::default()
    }

    /// Moves diagonally past the current window and resizes it to
    /// `nrows × ncols`.
    #[must_use]
    pub fn next(self, nrows: usize, ncols: usize) -> Self {
        Self {
            row: self.row + self.nrows,
            col: self.col + self.ncols,
            nrows,
            ncols,
        }
    }

    /// Moves down past the current rows; the column range is kept.
    #[must_use]
    pub fn vnext(self, nrows: usize) -> Self {
        Self {
            row: self.row + self.nrows,
            nrows,
            ..self
        }
    }

    /// Moves right past the current columns; the row range is kept.
    #[must_use]
    pub fn hnext(self, ncols: usize) -> Self {
        Self {
            col: self.col + self.ncols,
            ncols,
            ..self
        }
    }

    /// Mirror window across the main diagonal.
    #[must_use]
    pub fn transpose(self) -> Self {
        Self {
            row: self.col,
            col: self.row,
            nrows: self.ncols,
            ncols: self.nrows,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Row index range covered by the window.
    pub fn rows(&self) -> Range<usize> {
        self.row..self.row + self.nrows
    }

    /// Column index range covered by the window.
    pub fn cols(&self) -> Range<usize> {
        self.col..self.col + self.ncols
    }

    /// Read-only view of the window inside `m`.
    pub fn view<'a, S>(&self, m: &'a ArrayBase<S, Ix2>) -> ArrayView2<'a, f64>
    where
        S: Data<Elem = f64>,
    {
        m.slice(s![self.rows(), self.cols()])
    }

    /// Mutable view of the window inside `m`.
    ///
    /// # Panics
    ///
    /// Panics if the window extends beyond `m`.
    pub fn view_mut<'a, S>(&self, m: &'a mut ArrayBase<S, Ix2>) -> ArrayViewMut2<'a, f64>
    where
        S: DataMut<Elem = f64>,
    {
        m.slice_mut(s![self.rows(), self.cols()])
    }
}

/// Contiguous segment `{start, len}` of a vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SegmentCursor {
    start: usize,
    len: usize,
}

impl SegmentCursor {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Empty segment at index 0.
    pub fn start() -> Self {
        Self::default()
    }

    /// Moves past the current segment and resizes it to `len`.
    #[must_use]
    pub fn next(self, len: usize) -> Self {
        Self {
            start: self.start + self.len,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    pub fn view<'a, S>(&self, x: &'a ArrayBase<S, Ix1>) -> ArrayView1<'a, f64>
    where
        S: Data<Elem = f64>,
    {
        x.slice(s![self.range()])
    }

    pub fn view_mut<'a, S>(&self, x: &'a mut ArrayBase<S, Ix1>) -> ArrayViewMut1<'a, f64>
    where
        S: DataMut<Elem = f64>,
    {
        x.slice_mut(s![self.range()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn next_walks_the_diagonal() {
        let c = BlockCursor::top_left().next(1, 1).next(2, 2);
        assert_eq!(c, BlockCursor::new(1, 1, 2, 2));
        assert_eq!(c.rows(), 1..3);
        assert_eq!(c.cols(), 1..3);
    }

    #[test]
    fn vnext_keeps_columns() {
        let d = BlockCursor::new(1, 1, 2, 2);
        let c = d.vnext(3);
        assert_eq!(c, BlockCursor::new(3, 1, 3, 2));
    }

    #[test]
    fn hnext_keeps_rows() {
        let d = BlockCursor::new(1, 1, 2, 2);
        let r = d.hnext(3);
        assert_eq!(r, BlockCursor::new(1, 3, 2, 3));
    }

    #[test]
    fn navigation_is_pure() {
        let d = BlockCursor::new(0, 0, 2, 2);
        let _ = d.vnext(1);
        let _ = d.hnext(1);
        assert_eq!(d, BlockCursor::new(0, 0, 2, 2));
    }

    #[test]
    fn transpose_mirrors() {
        let c = BlockCursor::new(3, 1, 2, 4);
        assert_eq!(c.transpose(), BlockCursor::new(1, 3, 4, 2));
        assert_eq!(c.transpose().transpose(), c);
    }

    #[test]
    fn zero_width_next_does_not_advance_columns() {
        let c = BlockCursor::top_left().next(2, 0).next(1, 1);
        assert_eq!(c, BlockCursor::new(2, 0, 1, 1));
    }

    #[test]
    fn view_mut_writes_into_buffer() {
        let mut m = Array2::<f64>::zeros((3, 3));
        let c = BlockCursor::new(1, 1, 2, 2);
        c.view_mut(&mut m).fill(1.0);
        assert_eq!(m[[0, 0]], 0.0);
        assert_eq!(m[[1, 1]], 1.0);
        assert_eq!(m[[2, 2]], 1.0);
        assert_eq!(c.view(&m).sum(), 4.0);
    }

    #[test]
    fn segment_next() {
        let s = SegmentCursor::start().next(2).next(3);
        assert_eq!(s.range(), 2..5);
        assert!(SegmentCursor::start().is_empty());
    }
}
