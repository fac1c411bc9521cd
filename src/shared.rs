//! Thread-safe handle to a species.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rand::Rng;

use crate::error::Result;
use crate::sampler::DrawReport;
use crate::species::CmaEsSpecies;
use crate::state::DistributionState;
use crate::types::Candidate;
use crate::update::UpdateOutcome;

/// A cloneable, shared [`CmaEsSpecies`].
///
/// Sampling takes a read lock, so any number of worker threads (each with
/// its own RNG) can draw candidates at once. [`update`](Self::update) takes
/// the write lock and therefore waits for in-flight samples to finish.
///
/// # Examples
///
/// ```
/// use cmaes_species::{Bounds, CmaEsConfig, CmaEsSpecies, MeanInit, SharedSpecies};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let config = CmaEsConfig::builder().mean(MeanInit::Zero).build();
/// let mut rng = StdRng::seed_from_u64(0);
/// let shared = SharedSpecies::new(CmaEsSpecies::new(&config, Bounds::unbounded(3), &mut rng).unwrap());
///
/// let handles: Vec<_> = (0..4)
///     .map(|seed| {
///         let shared = shared.clone();
///         std::thread::spawn(move || {
///             let mut rng = StdRng::seed_from_u64(seed);
///             shared.sample(&mut rng).unwrap()
///         })
///     })
///     .collect();
/// for handle in handles {
///     assert_eq!(handle.join().unwrap().len(), 3);
/// }
/// ```
#[derive(Clone, Debug)]
pub struct SharedSpecies {
    inner: Arc<RwLock<CmaEsSpecies>>,
}

impl SharedSpecies {
    /// Wraps `species` for shared use.
    #[must_use]
    pub fn new(species: CmaEsSpecies) -> Self {
        Self {
            inner: Arc::new(RwLock::new(species)),
        }
    }

    /// Draws one candidate under a read lock.
    ///
    /// # Errors
    ///
    /// Same as [`CmaEsSpecies::sample`].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<f64>> {
        self.inner.read().sample(rng)
    }

    /// Draws one candidate with its draw report under a read lock.
    ///
    /// # Errors
    ///
    /// Same as [`CmaEsSpecies::sample_with_report`].
    pub fn sample_with_report<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DrawReport> {
        self.inner.read().sample_with_report(rng)
    }

    /// Resizes `population` to `lambda` under a read lock.
    ///
    /// # Errors
    ///
    /// Same as [`CmaEsSpecies::reconcile_population`].
    pub fn reconcile_population<V, R: Rng + ?Sized>(
        &self,
        population: &mut Vec<Candidate<V>>,
        rng: &mut R,
    ) -> Result<()> {
        self.inner.read().reconcile_population(population, rng)
    }

    /// Applies one generation under the write lock.
    ///
    /// # Errors
    ///
    /// Same as [`CmaEsSpecies::update`].
    pub fn update<V: PartialOrd>(
        &self,
        generation: u64,
        candidates: &[Candidate<V>],
    ) -> Result<UpdateOutcome> {
        self.inner.write().update(generation, candidates)
    }

    /// Read access to the species for inspection.
    #[must_use]
    pub fn read(&self) -> RwLockReadGuard<'_, CmaEsSpecies> {
        self.inner.read()
    }

    /// An independent copy of the current distribution.
    #[must_use]
    pub fn snapshot(&self) -> DistributionState {
        self.inner.read().state().clone()
    }

    /// Returns the species if this is the last handle, or the handle back.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged while other clones are alive.
    pub fn try_unwrap(self) -> core::result::Result<CmaEsSpecies, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<CmaEsSpecies> for SharedSpecies {
    fn from(species: CmaEsSpecies) -> Self {
        Self::new(species)
    }
}
