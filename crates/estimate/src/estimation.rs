//! Direct and staged maximum-likelihood estimation of a [`MixedModel`].

use strata_ssf::SsfData;
use tracing::{debug, info, info_span, warn};

use crate::config::{EstimationConfig, Strategy};
use crate::error::EstimationError;
use crate::function::{Mapper, SsfFunction};
use crate::minimizer::{Minimizer, NelderMead};
use crate::mixed::{MixedMapper, MixedModel, ParameterSubset};

/// One minimisation of an estimation run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    /// Round index; the closing joint stage of a staged run and the single
    /// stage of a direct run carry the number of completed rounds.
    pub round: usize,
    pub subset: ParameterSubset,
    pub tolerance: f64,
    pub converged: bool,
    pub iterations: u64,
    /// Objective at the best point.
    pub value: f64,
}

/// Fitted mixed model.
#[derive(Debug, Clone)]
pub struct MixedFit {
    model: MixedModel,
    log_likelihood: f64,
    sigma2: f64,
    residuals: Vec<f64>,
    stages: Vec<StageRecord>,
}

impl MixedFit {
    pub fn model(&self) -> &MixedModel {
        &self.model
    }

    /// Concentrated log-likelihood at the estimate.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Estimated innovation variance of the ARMA block, `ssq / (n - nd)`.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Defined standardised prediction errors `e / √f`; their mean square
    /// is [`sigma2`](Self::sigma2).
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    /// `true` when the last minimisation met its tolerance.
    pub fn converged(&self) -> bool {
        self.stages.last().is_some_and(|s| s.converged)
    }
}

/// Maximum-likelihood estimation driver for [`MixedModel`].
///
/// Holds no per-run state; [`estimate`](Self::estimate) can be called
/// from several threads on the same driver.
#[derive(Debug, Clone, Default)]
pub struct MixedEstimation<Z: Minimizer = NelderMead> {
    config: EstimationConfig,
    minimizer: Z,
}

impl MixedEstimation<NelderMead> {
    pub fn new(config: EstimationConfig) -> Self {
        Self {
            config,
            minimizer: NelderMead,
        }
    }
}

impl<Z: Minimizer> MixedEstimation<Z> {
    /// Driver with a custom minimizer.
    pub fn with_minimizer(config: EstimationConfig, minimizer: Z) -> Self {
        Self { config, minimizer }
    }

    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Estimates the free parameters of `start` on `data`.
    ///
    /// `start` fixes the structure (AR and MA orders, presence of a level,
    /// period and noisy periods) and supplies the starting values.
    ///
    /// # Errors
    ///
    /// - [`EstimationError::InvalidConfig`] for an invalid configuration.
    /// - [`EstimationError::EmptySeries`] when `data` has no observation.
    /// - Any minimisation failure; no partial model is returned.
    pub fn estimate(&self, data: &SsfData, start: &MixedModel) -> Result<MixedFit, EstimationError> {
        self.config.validate()?;
        if data.observed_count() == 0 {
            return Err(EstimationError::EmptySeries);
        }
        let _span = info_span!(
            "estimate",
            n = data.len(),
            p = start.ar().len(),
            q = start.ma().len(),
            period = start.period()
        )
        .entered();

        let result = self.run(data, start);
        match &result {
            Ok(fit) => info!(
                log_likelihood = fit.log_likelihood,
                sigma2 = fit.sigma2,
                stages = fit.stages.len(),
                "estimation finished"
            ),
            Err(err) => warn!(%err, "estimation failed"),
        }
        result
    }

    fn run(&self, data: &SsfData, start: &MixedModel) -> Result<MixedFit, EstimationError> {
        let mut model = start.clone();
        let mut stages = Vec::new();

        let rounds = match self.config.strategy() {
            Strategy::Direct => 0,
            Strategy::Staged { rounds } => {
                for round in 0..rounds {
                    if model.parameters_count(ParameterSubset::Base) > 0 {
                        model = self.stage(
                            data,
                            model,
                            ParameterSubset::Base,
                            round,
                            self.config.stage_tolerance(),
                            &mut stages,
                        )?
                        .0;
                    }
                    model = self
                        .stage(
                            data,
                            model,
                            ParameterSubset::Noise,
                            round,
                            self.config.stage_tolerance(),
                            &mut stages,
                        )?
                        .0;
                }
                rounds
            }
        };

        let tolerance = match self.config.strategy() {
            Strategy::Direct => self.config.direct_tolerance(),
            Strategy::Staged { .. } => self.config.final_tolerance(),
        };
        let (model, summary) =
            self.stage(data, model, ParameterSubset::All, rounds, tolerance, &mut stages)?;

        Ok(MixedFit {
            model,
            log_likelihood: summary.log_likelihood,
            sigma2: summary.sigma2,
            residuals: summary.residuals,
            stages,
        })
    }

    /// Minimises over `subset` starting from `model` and returns the
    /// updated model.
    fn stage(
        &self,
        data: &SsfData,
        model: MixedModel,
        subset: ParameterSubset,
        round: usize,
        tolerance: f64,
        stages: &mut Vec<StageRecord>,
    ) -> Result<(MixedModel, StageSummary), EstimationError> {
        let mapper = MixedMapper::new(model, subset);
        let start = mapper.parameters(mapper.template());
        let function = SsfFunction::new(data.clone(), mapper);

        let min = self
            .minimizer
            .minimize(&function, &start, &self.config.options(tolerance))?;

        let best = &min.best;
        let record = StageRecord {
            round,
            subset,
            tolerance,
            converged: min.converged,
            iterations: min.iterations,
            value: best.value(),
        };
        debug!(
            round,
            ?subset,
            tolerance,
            converged = record.converged,
            iterations = record.iterations,
            value = record.value,
            "stage finished"
        );
        if !record.converged {
            warn!(round, ?subset, iterations = record.iterations, "stage did not converge");
        }
        stages.push(record);

        let likelihood = best.likelihood().ok_or(EstimationError::NoLikelihood)?;
        let summary = StageSummary {
            log_likelihood: likelihood.log_likelihood(),
            sigma2: likelihood.sigma2(),
            residuals: likelihood
                .residuals()
                .iter()
                .copied()
                .filter(|r| !r.is_nan())
                .collect(),
        };
        let params = best.parameters().to_vec();
        Ok((function.mapper().to_model(&params), summary))
    }
}

struct StageSummary {
    log_likelihood: f64,
    sigma2: f64,
    residuals: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minimizer::{MinimizerOptions, Minimum};
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Evaluates the start point only.
    #[derive(Debug, Default)]
    struct StartOnly {
        calls: AtomicUsize,
    }

    impl Minimizer for StartOnly {
        fn minimize<'f, M: Mapper>(
            &self,
            function: &'f SsfFunction<M>,
            start: &Array1<f64>,
            _options: &MinimizerOptions,
        ) -> Result<Minimum<'f, M>, EstimationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let best = function.evaluate(start);
            if best.likelihood().is_none() {
                return Err(EstimationError::NoLikelihood);
            }
            Ok(Minimum {
                converged: true,
                iterations: 0,
                best,
            })
        }
    }

    fn model() -> MixedModel {
        MixedModel::new(4, &[2]).unwrap().with_ar(vec![0.5])
    }

    fn data() -> SsfData {
        let mut rng = StdRng::seed_from_u64(3);
        SsfData::new(model().simulate(80, &mut rng))
    }

    #[test]
    fn staged_runs_two_stages_per_round_then_joint() {
        let config = EstimationConfig::new().with_strategy(Strategy::Staged { rounds: 3 });
        let driver = MixedEstimation::with_minimizer(config, StartOnly::default());
        let fit = driver.estimate(&data(), &model()).unwrap();

        let subsets: Vec<_> = fit.stages().iter().map(|s| s.subset).collect();
        assert_eq!(subsets.len(), 7);
        assert_eq!(subsets[0], ParameterSubset::Base);
        assert_eq!(subsets[1], ParameterSubset::Noise);
        assert_eq!(subsets[6], ParameterSubset::All);
        assert_eq!(fit.stages()[6].round, 3);
        assert_eq!(fit.stages()[6].tolerance, 1e-12);
        assert_eq!(fit.stages()[0].tolerance, 1e-6);
        assert_eq!(driver.minimizer.calls.load(Ordering::SeqCst), 7);
        assert!(fit.converged());
    }

    #[test]
    fn direct_runs_a_single_joint_stage() {
        let config = EstimationConfig::new()
            .with_strategy(Strategy::Direct)
            .with_direct_tolerance(1e-8);
        let driver = MixedEstimation::with_minimizer(config, StartOnly::default());
        let fit = driver.estimate(&data(), &model()).unwrap();
        assert_eq!(fit.stages().len(), 1);
        assert_eq!(fit.stages()[0].subset, ParameterSubset::All);
        assert_eq!(fit.stages()[0].tolerance, 1e-8);
        // Start point is kept by this minimizer.
        assert_abs_diff_eq!(fit.model().ar()[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.model().noise_variance(), 1.0, epsilon = 1e-12);
        assert_eq!(fit.residuals().len(), 80);
        let mean_square =
            fit.residuals().iter().map(|r| r * r).sum::<f64>() / fit.residuals().len() as f64;
        assert_abs_diff_eq!(mean_square, fit.sigma2(), epsilon = 1e-12);
        assert!(fit.log_likelihood().is_finite());
    }

    #[test]
    fn empty_base_subset_is_skipped() {
        let white = MixedModel::new(4, &[2]).unwrap();
        let config = EstimationConfig::new().with_strategy(Strategy::Staged { rounds: 2 });
        let driver = MixedEstimation::with_minimizer(config, StartOnly::default());
        let fit = driver.estimate(&data(), &white).unwrap();
        assert!(
            fit.stages()
                .iter()
                .all(|s| s.subset != ParameterSubset::Base)
        );
        assert_eq!(fit.stages().len(), 3);
    }

    #[test]
    fn rejects_empty_series() {
        let driver = MixedEstimation::new(EstimationConfig::new());
        let err = driver
            .estimate(&SsfData::new(vec![f64::NAN, f64::NAN]), &model())
            .unwrap_err();
        assert_eq!(err, EstimationError::EmptySeries);
        let err = driver.estimate(&SsfData::new(Vec::new()), &model()).unwrap_err();
        assert_eq!(err, EstimationError::EmptySeries);
    }

    #[test]
    fn rejects_invalid_config() {
        let driver = MixedEstimation::new(EstimationConfig::new().with_max_iter(0));
        let err = driver.estimate(&data(), &model()).unwrap_err();
        assert!(matches!(err, EstimationError::InvalidConfig(_)));
    }

    #[test]
    fn stage_error_aborts() {
        #[derive(Debug, Default)]
        struct Failing {
            calls: AtomicUsize,
        }
        impl Minimizer for Failing {
            fn minimize<'f, M: Mapper>(
                &self,
                _function: &'f SsfFunction<M>,
                _start: &Array1<f64>,
                _options: &MinimizerOptions,
            ) -> Result<Minimum<'f, M>, EstimationError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(EstimationError::Minimizer("diverged".to_string()))
            }
        }

        let driver = MixedEstimation::with_minimizer(EstimationConfig::new(), Failing::default());
        let err = driver.estimate(&data(), &model()).unwrap_err();
        assert_eq!(err, EstimationError::Minimizer("diverged".to_string()));
        assert_eq!(driver.minimizer.calls.load(Ordering::SeqCst), 1);
    }
}
