//! Per-observation bookkeeping of the diffuse filter.

use ndarray::{Array1, ArrayView1, ArrayViewMut1};

/// Quantities produced by one update of the diffuse filter.
///
/// | Field | Meaning |
/// |-------|---------|
/// | `e`  | prediction error `y - Z a` |
/// | `m`  | `P Z'` (stationary part) |
/// | `mi` | `Pi Z'` (diffuse part) |
/// | `f`  | `Z P Z' + h` |
/// | `fi` | `Z Pi Z'` |
///
/// The record is filled once by the step that owns it and read afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffuseUpdateInformation {
    e: f64,
    m: Array1<f64>,
    mi: Array1<f64>,
    f: f64,
    fi: f64,
}

impl DiffuseUpdateInformation {
    /// Zeroed record for a state of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            e: 0.0,
            m: Array1::zeros(dim),
            mi: Array1::zeros(dim),
            f: 0.0,
            fi: 0.0,
        }
    }

    pub fn prediction_error(&self) -> f64 {
        self.e
    }

    pub fn set_prediction_error(&mut self, e: f64) {
        self.e = e;
    }

    pub fn m(&self) -> ArrayView1<'_, f64> {
        self.m.view()
    }

    pub fn m_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.m.view_mut()
    }

    /// `Pi Z'`.
    pub fn mi(&self) -> ArrayView1<'_, f64> {
        self.mi.view()
    }

    pub fn mi_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.mi.view_mut()
    }

    /// Stationary part of the forecast variance.
    pub fn variance(&self) -> f64 {
        self.f
    }

    pub fn set_variance(&mut self, f: f64) {
        self.f = f;
    }

    /// Diffuse part of the forecast variance.
    pub fn diffuse_norm2(&self) -> f64 {
        self.fi
    }

    pub fn set_diffuse_norm2(&mut self, fi: f64) {
        self.fi = fi;
    }

    /// `true` while this observation still resolves a diffuse direction.
    pub fn is_diffuse(&self) -> bool {
        self.fi != 0.0
    }
}
