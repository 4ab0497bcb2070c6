//! Mixed model: optional random-walk level, stationary ARMA and extra
//! white noise at selected periods.
//!
//! ```text
//! y[t] = level[t] + arma[t] + noise[t]
//! arma ~ ARMA(p, q) with unit innovation variance
//! var(noise[t]) = noise_variance  if t mod period is noisy, else 0
//! ```
//!
//! The ARMA innovation variance is the likelihood scale and is
//! concentrated out, so every other variance is relative to it.

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use strata_components::params::{coeffs_to_unconstrained, unconstrained_to_coeffs};
use strata_components::{ArmaDynamics, ComponentError, LocalLevel, NoisyPeriods};
use strata_ssf::{Ssf, SsfError};

use crate::function::Mapper;

/// Burn-in of the ARMA recursion in [`MixedModel::simulate`].
const BURN_IN: usize = 200;

/// Parameters of a mixed model.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedModel {
    ar: Vec<f64>,
    ma: Vec<f64>,
    level_variance: Option<f64>,
    noise: NoisyPeriods,
}

impl MixedModel {
    /// White-noise model with unit noise variance at the `noisy` periods.
    ///
    /// # Errors
    ///
    /// Propagates [`NoisyPeriods::new`] failures.
    pub fn new(period: usize, noisy: &[usize]) -> Result<Self, ComponentError> {
        Ok(Self {
            ar: Vec::new(),
            ma: Vec::new(),
            level_variance: None,
            noise: NoisyPeriods::new(period, noisy, 1.0)?,
        })
    }

    pub fn with_ar(mut self, ar: Vec<f64>) -> Self {
        self.ar = ar;
        self
    }

    pub fn with_ma(mut self, ma: Vec<f64>) -> Self {
        self.ma = ma;
        self
    }

    /// Adds a random-walk level with the given relative variance.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidVariance`] for a negative or
    /// non-finite variance.
    pub fn with_level(mut self, variance: f64) -> Result<Self, ComponentError> {
        self.level_variance = Some(LocalLevel::new(variance)?.variance());
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidVariance`] for a negative or
    /// non-finite variance.
    pub fn with_noise_variance(mut self, variance: f64) -> Result<Self, ComponentError> {
        let noisy = self.noise.noisy();
        self.noise = NoisyPeriods::new(self.noise.period(), &noisy, variance)?;
        Ok(self)
    }

    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    pub fn level_variance(&self) -> Option<f64> {
        self.level_variance
    }

    pub fn period(&self) -> usize {
        self.noise.period()
    }

    pub fn noisy(&self) -> Vec<usize> {
        self.noise.noisy()
    }

    pub fn noise_variance(&self) -> f64 {
        self.noise.variance()
    }

    /// Number of parameters in `subset`.
    pub fn parameters_count(&self, subset: ParameterSubset) -> usize {
        let base = self.ar.len() + self.ma.len() + usize::from(self.level_variance.is_some());
        match subset {
            ParameterSubset::Base => base,
            ParameterSubset::Noise => 1,
            ParameterSubset::All => base + 1,
        }
    }

    /// Composite state-space form `[level] + ARMA + noise`.
    ///
    /// # Errors
    ///
    /// Returns [`SsfError::InvalidModel`] when a stored variance is not
    /// admissible.
    pub fn ssf(&self) -> Result<Ssf, SsfError> {
        let mut parts = Vec::with_capacity(3);
        if let Some(variance) = self.level_variance {
            let level = LocalLevel::new(variance).map_err(|_| SsfError::InvalidModel)?;
            parts.push(level.into_ssf()?);
        }
        parts.push(ArmaDynamics::new(&self.ar, &self.ma).into_ssf()?);
        parts.push(self.noise.clone().into_ssf()?);
        Ssf::composite(parts)
    }

    /// Draws `n` observations, starting the level at zero.
    pub fn simulate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        let p = self.ar.len();
        let q = self.ma.len();
        let total = n + BURN_IN;

        let mut e = Vec::with_capacity(total);
        let mut x: Vec<f64> = Vec::with_capacity(total);
        for t in 0..total {
            let innovation: f64 = StandardNormal.sample(rng);
            let mut value = innovation;
            for i in 0..p.min(t) {
                value += self.ar[i] * x[t - 1 - i];
            }
            for j in 0..q.min(t) {
                value += self.ma[j] * e[t - 1 - j];
            }
            e.push(innovation);
            x.push(value);
        }

        let noise_sd = self.noise.variance().sqrt();
        let level_sd = self.level_variance.unwrap_or(0.0).sqrt();
        let mut level = 0.0;
        x[BURN_IN..]
            .iter()
            .enumerate()
            .map(|(t, arma)| {
                let mut y = level + arma;
                if self.noise.is_noisy(t) {
                    let z: f64 = StandardNormal.sample(rng);
                    y += noise_sd * z;
                }
                if self.level_variance.is_some() {
                    let z: f64 = StandardNormal.sample(rng);
                    level += level_sd * z;
                }
                y
            })
            .collect()
    }
}

/// Which parameters a [`MixedMapper`] exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSubset {
    /// PACF-transformed AR and MA coefficients, then `√level_variance`.
    Base,
    /// `√noise_variance`.
    Noise,
    /// `Base` followed by `Noise`.
    All,
}

/// Maps a parameter subset onto a template model; the parameters outside
/// the subset stay at their template values.
#[derive(Debug, Clone)]
pub struct MixedMapper {
    template: MixedModel,
    subset: ParameterSubset,
}

impl MixedMapper {
    pub fn new(template: MixedModel, subset: ParameterSubset) -> Self {
        Self { template, subset }
    }

    pub fn template(&self) -> &MixedModel {
        &self.template
    }

    pub fn subset(&self) -> ParameterSubset {
        self.subset
    }

    fn encode_base(model: &MixedModel, out: &mut Vec<f64>) {
        out.extend(coeffs_to_unconstrained(&model.ar));
        out.extend(coeffs_to_unconstrained(&model.ma));
        if let Some(variance) = model.level_variance {
            out.push(variance.sqrt());
        }
    }

    /// Overwrites the base parameters of `model` from `p`. Blocks that
    /// `p` does not fully cover keep their current values.
    fn decode_base(model: &mut MixedModel, p: &[f64]) -> Result<(), ComponentError> {
        let np = model.ar.len();
        let nq = model.ma.len();
        if let Some(alpha) = p.get(..np) {
            model.ar = unconstrained_to_coeffs(alpha);
        }
        if let Some(beta) = p.get(np..np + nq) {
            model.ma = unconstrained_to_coeffs(beta);
        }
        if model.level_variance.is_some() {
            if let Some(x) = p.get(np + nq) {
                model.level_variance = Some(LocalLevel::new(x * x)?.variance());
            }
        }
        Ok(())
    }

    fn decode_noise(model: &mut MixedModel, p: &[f64]) -> Result<(), ComponentError> {
        if let Some(x) = p.first() {
            model.noise = NoisyPeriods::new(model.period(), &model.noisy(), x * x)?;
        }
        Ok(())
    }

    /// Decodes `p` onto the template.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidVariance`] when a variance parameter
    /// squares to a non-finite value.
    pub fn decode(&self, p: &[f64]) -> Result<MixedModel, ComponentError> {
        let mut model = self.template.clone();
        match self.subset {
            ParameterSubset::Base => Self::decode_base(&mut model, p)?,
            ParameterSubset::Noise => Self::decode_noise(&mut model, p)?,
            ParameterSubset::All => {
                let nb = self.template.parameters_count(ParameterSubset::Base);
                let (base, noise) = p.split_at(nb.min(p.len()));
                Self::decode_base(&mut model, base)?;
                Self::decode_noise(&mut model, noise)?;
            }
        }
        Ok(model)
    }
}

impl Mapper for MixedMapper {
    type Model = MixedModel;

    fn dim(&self) -> usize {
        self.template.parameters_count(self.subset)
    }

    fn map(&self, p: &[f64]) -> Result<Ssf, SsfError> {
        if p.len() != self.dim() {
            return Err(SsfError::DimensionMismatch {
                expected: self.dim(),
                got: p.len(),
            });
        }
        self.decode(p).map_err(|_| SsfError::InvalidModel)?.ssf()
    }

    /// Decodes `p` onto the template; entries beyond `p.len()` keep their
    /// template values. A point that [`map`](Mapper::map) rejects decodes
    /// to the template itself.
    fn to_model(&self, p: &[f64]) -> MixedModel {
        self.decode(p).unwrap_or_else(|_| self.template.clone())
    }

    fn parameters(&self, model: &MixedModel) -> Array1<f64> {
        let mut out = Vec::with_capacity(self.dim());
        match self.subset {
            ParameterSubset::Base => Self::encode_base(model, &mut out),
            ParameterSubset::Noise => out.push(model.noise_variance().sqrt()),
            ParameterSubset::All => {
                Self::encode_base(model, &mut out);
                out.push(model.noise_variance().sqrt());
            }
        }
        Array1::from(out)
    }
}
