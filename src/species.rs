//! One CMA-ES-optimized population.
//!
//! [`CmaEsSpecies`] owns the derived strategy parameters, the search
//! distribution and the host's bounds. The host drives the generation loop:
//! it samples candidates with [`CmaEsSpecies::sample`] (concurrently if it
//! likes, since sampling only takes `&self`), evaluates them, and hands the
//! complete generation to [`CmaEsSpecies::update`].
//!
//! # Examples
//!
//! ```
//! use cmaes_species::{Bounds, Candidate, CmaEsConfig, CmaEsSpecies, MeanInit};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = CmaEsConfig::builder()
//!     .mean(MeanInit::Zero)
//!     .lambda(6)
//!     .build();
//! let mut rng = StdRng::seed_from_u64(1);
//! let species = CmaEsSpecies::new(&config, Bounds::unbounded(2), &mut rng).unwrap();
//! assert_eq!(species.params().lambda(), 6);
//!
//! let report = species.sample_with_report(&mut rng).unwrap();
//! assert_eq!(report.x.len(), 2);
//! assert_eq!(report.attempts, 1);
//! ```

use rand::Rng;

use crate::config::CmaEsConfig;
use crate::error::{Error, Result};
use crate::params::StrategyParameters;
use crate::population;
use crate::sampler::{self, BoundaryPolicy, DrawReport, RejectionStats, SamplerSettings};
use crate::state::DistributionState;
use crate::types::{Bounds, Candidate, Direction};
use crate::update::{self, UpdateOutcome};

/// Strategy parameters, distribution state and bounds of one population.
#[derive(Clone, Debug)]
pub struct CmaEsSpecies {
    params: StrategyParameters,
    state: DistributionState,
    bounds: Bounds,
    direction: Direction,
    settings: SamplerSettings,
    alternative_termination: bool,
    stats: RejectionStats,
}

impl CmaEsSpecies {
    /// Derives the strategy parameters and builds the initial distribution.
    ///
    /// The dimension is taken from `bounds`. `rng` is consumed only by a
    /// random initial mean.
    ///
    /// # Errors
    ///
    /// Returns an error for any invalid option: bad strategy overrides
    /// (including `mu > lambda`), a non-positive `sigma`, an unresolvable
    /// mean, a covariance mode that needs finite bounds, or zero
    /// `alternative-generator-tries`.
    pub fn new<R: Rng + ?Sized>(config: &CmaEsConfig, bounds: Bounds, rng: &mut R) -> Result<Self> {
        if config.alternative_generator_tries == 0 {
            return Err(Error::InvalidGeneratorTries);
        }
        let params = StrategyParameters::derive(bounds.dimension(), &config.strategy)?;
        let state = DistributionState::initialize(config, &bounds, rng)?;
        let settings = SamplerSettings {
            policy: config.boundary_policy(),
            tries: config.alternative_generator_tries,
            max_rejections: config.max_rejections,
        };

        trace_info!(
            n = params.n(),
            lambda = params.lambda(),
            mu = params.mu(),
            sigma = state.sigma(),
            policy = ?settings.policy,
            "initialized CMA-ES species"
        );

        Ok(Self {
            params,
            state,
            bounds,
            direction: Direction::Minimize,
            settings,
            alternative_termination: config.alternative_termination,
            stats: RejectionStats::new(),
        })
    }

    /// Sets the host's better-than order. Defaults to minimization.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// The derived strategy parameters.
    #[must_use]
    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    /// The current search distribution.
    #[must_use]
    pub fn state(&self) -> &DistributionState {
        &self.state
    }

    /// The host's bounds.
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// The better-than order used for ranking.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The boundary policy applied after repeated rejections.
    #[must_use]
    pub fn boundary_policy(&self) -> BoundaryPolicy {
        self.settings.policy
    }

    /// Rejection counters for this run.
    #[must_use]
    pub fn stats(&self) -> &RejectionStats {
        &self.stats
    }

    /// Draws one in-bounds candidate vector.
    ///
    /// # Errors
    ///
    /// Returns `Error::RejectionLimit` if `max-rejections` is set and a
    /// draw exceeds it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<f64>> {
        self.sample_with_report(rng).map(|report| report.x)
    }

    /// Like [`sample`](Self::sample), but also reports how many draws were
    /// needed and whether the result was repaired.
    ///
    /// # Errors
    ///
    /// Same as [`sample`](Self::sample).
    pub fn sample_with_report<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DrawReport> {
        sampler::draw(&self.state, &self.bounds, &self.settings, &self.stats, rng)
    }

    /// Resizes `population` to exactly `lambda`, sampling fresh unevaluated
    /// candidates for any missing slots.
    ///
    /// # Errors
    ///
    /// Propagates sampling errors.
    pub fn reconcile_population<V, R: Rng + ?Sized>(
        &self,
        population: &mut Vec<Candidate<V>>,
        rng: &mut R,
    ) -> Result<()> {
        population::reconcile(population, self.params.lambda(), || self.sample(rng))
    }

    /// Applies one evaluated generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the generation is malformed or the covariance
    /// cannot be decomposed; the distribution is unchanged in that case.
    pub fn update<V: PartialOrd>(
        &mut self,
        generation: u64,
        candidates: &[Candidate<V>],
    ) -> Result<UpdateOutcome> {
        update::apply(
            &mut self.state,
            &self.params,
            self.direction,
            generation,
            candidates,
            self.alternative_termination,
        )
    }
}
