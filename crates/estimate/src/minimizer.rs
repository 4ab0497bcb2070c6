//! Minimizer contract and its Nelder-Mead implementation.

use argmin::core::{CostFunction, Executor, State, TerminationReason, TerminationStatus};
use ndarray::Array1;
use tracing::debug_span;

use crate::error::EstimationError;
use crate::function::{Mapper, SsfFunction};
use crate::instance::SsfFunctionInstance;

/// Per-call settings of a minimisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizerOptions {
    /// Convergence threshold on the spread of the objective.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iter: u64,
    /// Edge length of the initial simplex.
    pub simplex_step: f64,
}

impl MinimizerOptions {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_simplex_step(mut self, step: f64) -> Self {
        self.simplex_step = step;
        self
    }
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iter: 2000,
            simplex_step: 0.5,
        }
    }
}

/// Outcome of a minimisation.
#[derive(Debug)]
pub struct Minimum<'a, M: Mapper> {
    /// `true` when the tolerance was met before the iteration cap.
    pub converged: bool,
    pub iterations: u64,
    /// Best evaluated point.
    pub best: SsfFunctionInstance<'a, M>,
}

/// Minimises an [`SsfFunction`] from a starting point.
///
/// Implementations hold no per-call state, so one minimizer can serve
/// several estimations concurrently.
pub trait Minimizer {
    /// # Errors
    ///
    /// [`EstimationError::Minimizer`] when the algorithm fails, and
    /// [`EstimationError::NoLikelihood`] when no evaluated point has a
    /// likelihood.
    fn minimize<'f, M: Mapper>(
        &self,
        function: &'f SsfFunction<M>,
        start: &Array1<f64>,
        options: &MinimizerOptions,
    ) -> Result<Minimum<'f, M>, EstimationError>;
}

/// Derivative-free simplex search backed by `argmin`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NelderMead;

impl NelderMead {
    pub fn new() -> Self {
        Self
    }
}

impl Minimizer for NelderMead {
    fn minimize<'f, M: Mapper>(
        &self,
        function: &'f SsfFunction<M>,
        start: &Array1<f64>,
        options: &MinimizerOptions,
    ) -> Result<Minimum<'f, M>, EstimationError> {
        let _span = debug_span!("nelder_mead", dim = start.len(), tolerance = options.tolerance)
            .entered();

        if start.is_empty() {
            let best = function.evaluate(start);
            return finish(best, true, 0);
        }

        // Simplex: start point plus one step along each axis.
        let origin = start.to_vec();
        let mut simplex = Vec::with_capacity(origin.len() + 1);
        simplex.push(origin.clone());
        for i in 0..origin.len() {
            let mut vertex = origin.clone();
            vertex[i] += options.simplex_step;
            simplex.push(vertex);
        }

        let solver = argmin::solver::neldermead::NelderMead::new(simplex)
            .with_sd_tolerance(options.tolerance)
            .map_err(|e| EstimationError::Minimizer(e.to_string()))?;
        let result = Executor::new(Objective { function }, solver)
            .configure(|state| state.max_iters(options.max_iter))
            .run()
            .map_err(|e| EstimationError::Minimizer(e.to_string()))?;

        let state = result.state();
        let converged = matches!(
            state.get_termination_status(),
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        );
        let iterations = state.get_iter();
        let best_param = state
            .get_best_param()
            .ok_or_else(|| EstimationError::Minimizer("no best parameter".to_string()))?;
        let best = function.evaluate(&Array1::from(best_param.clone()));
        finish(best, converged, iterations)
    }
}

fn finish<M: Mapper>(
    best: SsfFunctionInstance<'_, M>,
    converged: bool,
    iterations: u64,
) -> Result<Minimum<'_, M>, EstimationError> {
    if best.likelihood().is_none() {
        return Err(EstimationError::NoLikelihood);
    }
    Ok(Minimum {
        converged,
        iterations,
        best,
    })
}

/// Cost adapter: NaN objectives become `f64::MAX` so the simplex moves away.
struct Objective<'a, M: Mapper> {
    function: &'a SsfFunction<M>,
}

impl<M: Mapper> CostFunction for Objective<'_, M> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let value = self.function.evaluate(&Array1::from(param.clone())).value();
        Ok(if value.is_finite() { value } else { f64::MAX })
    }
}
