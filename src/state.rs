//! The mutable search distribution of one population.

use nalgebra::{DMatrix, DVector};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{CmaEsConfig, CovarianceInit, MeanInit};
use crate::error::{Error, Result};
use crate::linalg::{self, Eigensystem};
use crate::sampler;
use crate::types::Bounds;

/// Mean, step size and covariance of the Gaussian search distribution,
/// together with the evolution paths and the cached eigensystem of `C`.
///
/// `C` is the single source of truth for the distribution's shape; `B`, `D`,
/// `C^{-1/2}` and `sigma·B·D` are a cache recomputed by
/// [`refresh_eigensystem`](Self::refresh_eigensystem). Cloning the state
/// yields an independent snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistributionState {
    pub(crate) mean: DVector<f64>,
    pub(crate) sigma: f64,
    pub(crate) c: DMatrix<f64>,
    pub(crate) eigen: Eigensystem,
    pub(crate) sbd: DMatrix<f64>,
    pub(crate) pc: DVector<f64>,
    pub(crate) ps: DVector<f64>,
    pub(crate) last_eigen_generation: Option<u64>,
}

impl DistributionState {
    /// Creates a state from an explicit mean, step size and covariance.
    ///
    /// The covariance is decomposed once to populate the cache; the
    /// evolution paths start at zero.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSigma` if `sigma` is not positive and finite,
    /// `Error::DimensionMismatch` if `c` is not `n×n`, and any error of
    /// [`Eigensystem::decompose`].
    pub fn new(mean: DVector<f64>, sigma: f64, c: DMatrix<f64>) -> Result<Self> {
        let n = mean.len();
        if n == 0 {
            return Err(Error::ZeroDimensions);
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::InvalidSigma(sigma));
        }
        if c.nrows() != n || c.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: c.nrows().max(c.ncols()),
            });
        }

        let eigen = Eigensystem::decompose(&c)?;
        let sbd = sigma * &eigen.bd;
        Ok(Self {
            mean,
            sigma,
            c,
            eigen,
            sbd,
            pc: DVector::zeros(n),
            ps: DVector::zeros(n),
            last_eigen_generation: None,
        })
    }

    /// Creates the initial state from a configuration and the host's bounds.
    ///
    /// `rng` is only consumed by [`MeanInit::Random`].
    ///
    /// # Errors
    ///
    /// Returns an error if the mean cannot be resolved, if a mode needs a
    /// finite bound that is missing, or if `sigma` or the covariance are
    /// invalid.
    pub fn initialize<R: Rng + ?Sized>(
        config: &CmaEsConfig,
        bounds: &Bounds,
        rng: &mut R,
    ) -> Result<Self> {
        if !config.sigma.is_finite() || config.sigma <= 0.0 {
            return Err(Error::InvalidSigma(config.sigma));
        }
        let c = initial_covariance(config.covariance, bounds)?;
        let mean = initial_mean(config, bounds, rng)?;
        Self::new(mean, config.sigma, c)
    }

    /// Dimension of the search space.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Current mean.
    #[must_use]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Current step size.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Covariance matrix `C`.
    #[must_use]
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.c
    }

    /// The cached eigensystem of `C` from the last refresh.
    #[must_use]
    pub fn eigensystem(&self) -> &Eigensystem {
        &self.eigen
    }

    /// `sigma·B·D`, the transform applied to standard normal draws.
    #[must_use]
    pub fn sbd(&self) -> &DMatrix<f64> {
        &self.sbd
    }

    /// Evolution path of the rank-one update.
    #[must_use]
    pub fn pc(&self) -> &DVector<f64> {
        &self.pc
    }

    /// Evolution path of the step-size control.
    #[must_use]
    pub fn ps(&self) -> &DVector<f64> {
        &self.ps
    }

    /// Generation of the last eigendecomposition, `None` before the first.
    #[must_use]
    pub fn last_eigen_generation(&self) -> Option<u64> {
        self.last_eigen_generation
    }

    /// Condition indicator `max(D) / min(D)` of the cached eigensystem.
    #[must_use]
    pub fn axis_ratio(&self) -> f64 {
        self.eigen.axis_ratio()
    }

    /// Symmetrizes `C`, decomposes it and rebuilds every cached view.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Eigensystem::decompose`]; the cache is left
    /// untouched in that case.
    pub fn refresh_eigensystem(&mut self, generation: u64) -> Result<()> {
        linalg::symmetrize(&mut self.c);
        self.eigen = Eigensystem::decompose(&self.c)?;
        self.last_eigen_generation = Some(generation);
        self.refresh_sbd();
        trace_debug!(
            generation,
            axis_ratio = self.eigen.axis_ratio(),
            "refreshed covariance eigensystem"
        );
        Ok(())
    }

    /// Recomputes `sigma·B·D` after a step-size change.
    pub(crate) fn refresh_sbd(&mut self) {
        self.sbd = self.sigma * &self.eigen.bd;
    }
}

fn initial_covariance(mode: CovarianceInit, bounds: &Bounds) -> Result<DMatrix<f64>> {
    let n = bounds.dimension();
    match mode {
        CovarianceInit::Identity => Ok(DMatrix::identity(n, n)),
        CovarianceInit::Scaled => {
            let mut diag = DVector::zeros(n);
            for i in 0..n {
                let (lo, hi) = bounds.finite_interval(i, "scaled covariance")?;
                diag[i] = (hi - lo).powi(2);
            }
            Ok(DMatrix::from_diagonal(&diag))
        }
    }
}

fn initial_mean<R: Rng + ?Sized>(
    config: &CmaEsConfig,
    bounds: &Bounds,
    rng: &mut R,
) -> Result<DVector<f64>> {
    let n = bounds.dimension();
    let explicit = &config.mean_values;

    if let Some((&index, _)) = explicit.range(n..).next() {
        return Err(Error::IndexOutOfRange { index, n });
    }
    if let Some((&index, &value)) = explicit.iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidOption {
            key: format!("mean.{index}"),
            value: value.to_string(),
            reason: "mean must be finite".to_string(),
        });
    }

    let Some(mode) = config.mean else {
        if explicit.len() != n {
            return Err(Error::UnresolvedMean {
                given: explicit.len(),
                n,
            });
        }
        return Ok(DVector::from_iterator(n, explicit.values().copied()));
    };

    if !explicit.is_empty() {
        trace_warn!(
            mode = %mode,
            overridden = explicit.len(),
            "explicit mean values override the mean mode"
        );
    }

    let mut mean = DVector::zeros(n);
    for i in 0..n {
        mean[i] = match (explicit.get(&i), mode) {
            (Some(&value), _) => value,
            (None, MeanInit::Zero) => 0.0,
            (None, MeanInit::Center) => {
                let (lo, hi) = bounds.finite_interval(i, "center mean")?;
                f64::midpoint(lo, hi)
            }
            (None, MeanInit::Random) => {
                let (lo, hi) = bounds.finite_interval(i, "random mean")?;
                sampler::uniform_in(lo, hi, rng)
            }
        };
    }
    Ok(mean)
}
