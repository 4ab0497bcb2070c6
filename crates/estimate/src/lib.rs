//! # strata-estimate
//!
//! Gaussian likelihood objectives over state-space models and the
//! maximum-likelihood driver for mixed models.
//!
//! ```mermaid
//! graph LR
//!     A["MixedModel"] -->|"MixedMapper::new(model, subset)"| B["impl Mapper"]
//!     B -->|"SsfFunction::new(data, mapper)"| C["SsfFunction"]
//!     C -->|".evaluate(&p)"| D["SsfFunctionInstance"]
//!     C -->|"Minimizer::minimize"| E["Minimum"]
//!     F["MixedEstimation"] -->|"per stage"| E
//!     F --> G["MixedFit"]
//! ```
//!
//! ```no_run
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use strata_estimate::{EstimationConfig, MixedEstimation, MixedModel};
//! use strata_ssf::SsfData;
//!
//! let truth = MixedModel::new(12, &[0, 11])?
//!     .with_ar(vec![0.7])
//!     .with_noise_variance(4.0)?;
//! let y = truth.simulate(240, &mut StdRng::seed_from_u64(1));
//!
//! let start = MixedModel::new(12, &[0, 11])?.with_ar(vec![0.0]);
//! let fit = MixedEstimation::new(EstimationConfig::new()).estimate(&SsfData::new(y), &start)?;
//! println!("phi = {:.3}, sigma2 = {:.3}", fit.model().ar()[0], fit.sigma2());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod estimation;
mod function;
mod instance;
mod minimizer;
mod mixed;

pub use config::{EstimationConfig, Strategy};
pub use error::EstimationError;
pub use estimation::{MixedEstimation, MixedFit, StageRecord};
pub use function::{Mapper, SsfFunction};
pub use instance::SsfFunctionInstance;
pub use minimizer::{Minimizer, MinimizerOptions, Minimum, NelderMead};
pub use mixed::{MixedMapper, MixedModel, ParameterSubset};
