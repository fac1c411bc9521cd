#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! CMA-ES (Covariance Matrix Adaptation Evolution Strategy) search
//! distribution for evolutionary hosts. The crate owns the numerical core
//! (strategy parameters, the Gaussian distribution state, bounded sampling and
//! the once-per-generation update) while the host keeps the generation loop,
//! fitness evaluation and population bookkeeping.
//!
//! # Getting Started
//!
//! ```
//! use cmaes_species::prelude::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = CmaEsConfig::builder()
//!     .sigma(0.5)
//!     .mean(MeanInit::Center)
//!     .build();
//! let bounds = Bounds::uniform(4, -5.0, 5.0).unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut species = CmaEsSpecies::new(&config, bounds, &mut rng).unwrap();
//!
//! let mut population: Vec<Candidate> = Vec::new();
//! species.reconcile_population(&mut population, &mut rng).unwrap();
//!
//! for generation in 0..20 {
//!     for candidate in &mut population {
//!         let f: f64 = candidate.x.iter().map(|v| v * v).sum();
//!         candidate.fitness = Some(f);
//!     }
//!     if species.update(generation, &population).unwrap().is_complete() {
//!         break;
//!     }
//!     for candidate in &mut population {
//!         *candidate = Candidate::new(species.sample(&mut rng).unwrap());
//!     }
//! }
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`CmaEsConfig`] | User options: step size, mean/covariance seeds, strategy overrides. |
//! | [`StrategyParameters`] | Derived constants (`lambda`, `mu`, weights, learning rates). |
//! | [`DistributionState`] | Mean, step size, covariance and its cached eigensystem. |
//! | [`CmaEsSpecies`] | One optimized population: sampling, reconciliation, update. |
//! | [`SharedSpecies`] | Read/write handle for multi-threaded hosts. |
//! | [`Driver`] | Minimal generation loop for tests and simple hosts. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) for derived parameters, eigen refreshes and sampling warnings | on |
//! | `serde` | `Serialize`/`Deserialize` on configuration, parameters and distribution state | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod config;
pub mod driver;
mod error;
pub mod linalg;
pub mod params;
pub mod population;
pub mod sampler;
pub mod shared;
pub mod species;
pub mod state;
mod types;
pub mod update;

pub use config::{CmaEsConfig, CmaEsConfigBuilder, CovarianceInit, MeanInit};
pub use driver::{Driver, RunSummary};
pub use error::{Error, Result};
pub use params::{StrategyOverrides, StrategyParameters};
pub use sampler::{BoundaryPolicy, DrawReport, RejectionStats};
pub use shared::SharedSpecies;
pub use species::CmaEsSpecies;
pub use state::DistributionState;
pub use types::{Bounds, Candidate, Direction};
pub use update::{TerminationReason, UpdateOutcome};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use cmaes_species::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{CmaEsConfig, CovarianceInit, MeanInit};
    pub use crate::driver::{Driver, RunSummary};
    pub use crate::error::{Error, Result};
    pub use crate::sampler::BoundaryPolicy;
    pub use crate::shared::SharedSpecies;
    pub use crate::species::CmaEsSpecies;
    pub use crate::types::{Bounds, Candidate, Direction};
    pub use crate::update::{TerminationReason, UpdateOutcome};
}
