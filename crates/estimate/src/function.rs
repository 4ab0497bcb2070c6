//! Likelihood objective over a parameter space.

use std::fmt;

use ndarray::Array1;
use rayon::prelude::*;
use strata_ssf::{DiffuseFilter, Ssf, SsfData, SsfError};

use crate::instance::SsfFunctionInstance;

/// Maps a real parameter vector to a state-space model.
///
/// Implementations must be deterministic and free of side effects so that
/// points can be evaluated in any order, concurrently.
pub trait Mapper {
    /// Domain model the parameters describe.
    type Model: Clone + fmt::Debug;

    /// Number of free parameters.
    fn dim(&self) -> usize;

    /// Builds the state-space form for `p`.
    fn map(&self, p: &[f64]) -> Result<Ssf, SsfError>;

    /// Decodes `p` into the domain model.
    fn to_model(&self, p: &[f64]) -> Self::Model;

    /// Encodes `model` back into a parameter vector.
    fn parameters(&self, model: &Self::Model) -> Array1<f64>;
}

/// Gaussian likelihood of a fixed series as a function of the mapper's
/// parameters.
///
/// With `ml` set the objective is the negative concentrated
/// log-likelihood; otherwise it is the sum of squared standardised
/// residuals, or its logarithm with `log` set.
#[derive(Debug)]
pub struct SsfFunction<M: Mapper> {
    data: SsfData,
    mapper: M,
    ml: bool,
    log: bool,
    filter: DiffuseFilter,
}

impl<M: Mapper> SsfFunction<M> {
    /// Maximum-likelihood objective for `data`.
    pub fn new(data: SsfData, mapper: M) -> Self {
        Self {
            data,
            mapper,
            ml: true,
            log: false,
            filter: DiffuseFilter::new(),
        }
    }

    pub fn with_ml(mut self, ml: bool) -> Self {
        self.ml = ml;
        self
    }

    /// Use `ln ssq` instead of `ssq` when `ml` is off.
    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn with_filter(mut self, filter: DiffuseFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn data(&self) -> &SsfData {
        &self.data
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn is_ml(&self) -> bool {
        self.ml
    }

    pub fn is_log(&self) -> bool {
        self.log
    }

    pub(crate) fn filter(&self) -> &DiffuseFilter {
        &self.filter
    }

    /// Evaluates the objective at `p`.
    pub fn evaluate(&self, p: &Array1<f64>) -> SsfFunctionInstance<'_, M> {
        SsfFunctionInstance::new(self, p.clone())
    }

    /// Evaluates independent points in parallel.
    pub fn evaluate_all(&self, points: &[Array1<f64>]) -> Vec<SsfFunctionInstance<'_, M>>
    where
        M: Sync,
    {
        points.par_iter().map(|p| self.evaluate(p)).collect()
    }
}
