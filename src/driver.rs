//! A minimal generation loop over one species.
//!
//! Real hosts own their loop; [`Driver`] is the smallest useful one and is
//! what the benchmarks and integration tests run.

use rand::Rng;

use crate::error::Result;
use crate::species::CmaEsSpecies;
use crate::types::Candidate;
use crate::update::TerminationReason;

/// Generations run by [`Driver::default`].
pub const DEFAULT_GENERATIONS: u64 = 100;

/// Runs sample, evaluate and update for a fixed number of generations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Driver {
    generations: u64,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATIONS)
    }
}

/// What a [`Driver`] run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Best evaluated candidate seen over the whole run.
    pub best: Option<Candidate>,
    /// Generations that were updated.
    pub generations: u64,
    /// Set when the run stopped early on a soft stop.
    pub termination: Option<TerminationReason>,
}

impl Driver {
    /// A driver for at most `generations` generations.
    #[must_use]
    pub fn new(generations: u64) -> Self {
        Self { generations }
    }

    /// The generation limit.
    #[must_use]
    pub fn generations(&self) -> u64 {
        self.generations
    }

    /// Runs `species` against `objective`.
    ///
    /// The first generation reconciles an empty population; later ones
    /// resample every slot. The loop ends early when the update signals
    /// completion.
    ///
    /// # Errors
    ///
    /// Propagates sampling and update errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmaes_species::{Bounds, CmaEsConfig, CmaEsSpecies, Driver};
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let config = CmaEsConfig::builder().mean_vector(vec![3.0, -2.0]).build();
    /// let mut rng = StdRng::seed_from_u64(4);
    /// let mut species = CmaEsSpecies::new(&config, Bounds::unbounded(2), &mut rng).unwrap();
    ///
    /// let summary = Driver::new(60)
    ///     .run(&mut species, &mut rng, |x| x.iter().map(|v| v * v).sum())
    ///     .unwrap();
    /// assert_eq!(summary.generations, 60);
    /// assert!(summary.best.unwrap().fitness.unwrap() < 1e-3);
    /// ```
    pub fn run<R, F>(
        &self,
        species: &mut CmaEsSpecies,
        rng: &mut R,
        mut objective: F,
    ) -> Result<RunSummary>
    where
        R: Rng + ?Sized,
        F: FnMut(&[f64]) -> f64,
    {
        let mut population: Vec<Candidate> = Vec::with_capacity(species.params().lambda());
        let mut summary = RunSummary {
            best: None,
            generations: 0,
            termination: None,
        };

        for generation in 0..self.generations {
            if generation == 0 {
                species.reconcile_population(&mut population, rng)?;
            } else {
                for candidate in &mut population {
                    *candidate = Candidate::new(species.sample(rng)?);
                }
            }

            for candidate in &mut population {
                let fitness = objective(&candidate.x);
                candidate.fitness = Some(fitness);
                let improved = summary.best.as_ref().and_then(|b| b.fitness).is_none_or(|best| {
                    species.direction().compare(&fitness, &best).is_lt()
                });
                if improved {
                    summary.best = Some(candidate.clone());
                }
            }

            let outcome = species.update(generation, &population)?;
            summary.generations = generation + 1;
            if let Some(reason) = outcome.reason() {
                summary.termination = Some(reason);
                break;
            }
        }

        trace_info!(
            generations = summary.generations,
            best = summary.best.as_ref().and_then(|b| b.fitness),
            terminated = summary.termination.is_some(),
            "driver run finished"
        );
        Ok(summary)
    }
}
