//! # strata-ssf
//!
//! Linear Gaussian state-space forms built from composable dynamics
//! blocks, and the diffuse Kalman filter that evaluates their likelihood.
//!
//! ```mermaid
//! graph LR
//!     A["impl Dynamics"] -->|"Vec<Box<dyn Dynamics>>"| B["CompositeDynamics"]
//!     B --> C["Ssf::new(dynamics, measurement)"]
//!     C -->|"DiffuseFilter::filter(&ssf, &data)?"| D["FilterOutput"]
//!     D --> E["DiffuseLikelihood"]
//!     E --> F[".log_likelihood()"]
//!     E --> G[".sigma2()"]
//!     E --> H[".residuals()"]
//! ```
//!
//! ## Glossary
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | `T` | transition matrix |
//! | `S` | disturbance loading, `V = S S'` |
//! | `Pf0` | stationary part of the initial covariance |
//! | `Pi0` | diffuse part of the initial covariance, `B B'` |
//! | `Z` | measurement loading |
//! | `h` | measurement error variance |

pub mod block;
mod composite;
mod diffuse;
mod dynamics;
mod error;
mod filter;
mod likelihood;
mod matrix;
mod ssf;

pub use block::{BlockCursor, SegmentCursor};
pub use composite::CompositeDynamics;
pub use diffuse::DiffuseUpdateInformation;
pub use dynamics::Dynamics;
pub use error::SsfError;
pub use filter::{DEFAULT_DIFFUSE_EPSILON, DiffuseFilter, FilterOutput};
pub use likelihood::DiffuseLikelihood;
pub use matrix::{MatrixDynamics, stationary_covariance};
pub use ssf::{Measurement, Ssf, SsfData};
