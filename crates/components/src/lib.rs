//! # strata-components
//!
//! Concrete [`Dynamics`](strata_ssf::Dynamics) blocks to assemble
//! structural models with [`Ssf::composite`](strata_ssf::Ssf::composite).
//!
//! | Block | State dim | Diffuse | Time-invariant |
//! |-------|-----------|---------|----------------|
//! | [`ArmaDynamics`] | `max(p, q + 1)` | no | yes |
//! | [`LocalLevel`] | 1 | 1 | yes |
//! | [`LocalLinearTrend`] | 2 | 2 | yes |
//! | [`NoisyPeriods`] | 1 | no | no |
//!
//! ```ignore
//! let ssf = Ssf::composite(vec![
//!     LocalLevel::new(0.1)?.into_ssf()?,
//!     ArmaDynamics::new(&[0.6], &[]).into_ssf()?,
//!     NoisyPeriods::new(12, &[0, 11], 2.0)?.into_ssf()?,
//! ])?;
//! ```

mod arma;
mod error;
mod level;
mod noise;
pub mod params;

pub use arma::ArmaDynamics;
pub use error::ComponentError;
pub use level::{LocalLevel, LocalLinearTrend};
pub use noise::NoisyPeriods;
