//! The once-per-generation distribution update.
//!
//! Ranks an evaluated generation, moves the mean towards the best `mu`
//! candidates, advances both evolution paths, applies the rank-one and
//! rank-`mu` covariance updates and adapts the step size by cumulative
//! step-size adaptation. The eigensystem of `C` is refreshed lazily.

use core::fmt;

use nalgebra::{DMatrix, DVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::StrategyParameters;
use crate::state::DistributionState;
use crate::types::{Candidate, Direction};

/// Axis ratio beyond which the covariance counts as ill-conditioned.
pub const ILL_CONDITIONED_AXIS_RATIO: f64 = 1e7;

/// Why a run signalled completion.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum TerminationReason {
    /// `max(D) / min(D)` exceeded [`ILL_CONDITIONED_AXIS_RATIO`].
    IllConditioned {
        /// The observed axis ratio.
        axis_ratio: f64,
    },
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllConditioned { axis_ratio } => write!(
                f,
                "covariance matrix is ill-conditioned (axis ratio {axis_ratio:.3e} > {ILL_CONDITIONED_AXIS_RATIO:e})"
            ),
        }
    }
}

/// Result of one update.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpdateOutcome {
    /// Keep evolving.
    Continue,
    /// The run should stop; this is a normal completion, not an error.
    Complete(TerminationReason),
}

impl UpdateOutcome {
    /// Returns `true` if the run should stop.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// The termination reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<TerminationReason> {
        match self {
            Self::Continue => None,
            Self::Complete(reason) => Some(*reason),
        }
    }
}

/// Applies one generation to `state`.
///
/// `candidates` must hold exactly `lambda` evaluated vectors of length `n`.
/// Ranking is stable, so ties keep their input order. On error `state` is
/// left untouched.
///
/// # Errors
///
/// Returns `Error::PopulationSizeMismatch`, `Error::Unevaluated` or
/// `Error::DimensionMismatch` on malformed input (including a `state` whose
/// dimension differs from `params`), and any error of the eigendecomposition
/// when a refresh is due.
#[allow(clippy::cast_precision_loss)]
pub fn apply<V: PartialOrd>(
    state: &mut DistributionState,
    params: &StrategyParameters,
    direction: Direction,
    generation: u64,
    candidates: &[Candidate<V>],
    alternative_termination: bool,
) -> Result<UpdateOutcome> {
    if state.dimension() != params.n() {
        return Err(Error::DimensionMismatch {
            expected: params.n(),
            got: state.dimension(),
        });
    }
    let order = rank(params, direction, candidates)?;

    let n = params.n();
    let (cc, cs, c1, cmu) = (params.cc(), params.cs(), params.c1(), params.cmu());
    let mueff = params.mueff();
    let weights = params.weights();

    let mut next = state.clone();
    let sigma = state.sigma;
    let old_mean = &state.mean;

    let selected: Vec<DVector<f64>> = order
        .iter()
        .take(params.mu())
        .map(|&i| DVector::from_column_slice(&candidates[i].x))
        .collect();

    let mut mean = DVector::zeros(n);
    for (&w, x) in weights.iter().zip(&selected) {
        mean += w * x;
    }

    let y = (&mean - old_mean) / sigma;
    next.ps = (1.0 - cs) * &state.ps
        + (cs * (2.0 - cs) * mueff).sqrt() * (&state.eigen.inv_sqrt_c * &y);

    let hsig = heaviside(&next.ps, cs, generation, n);
    next.pc = (1.0 - cc) * &state.pc + hsig * (cc * (2.0 - cc) * mueff).sqrt() * &y;

    let mut rank_mu = DMatrix::zeros(n, n);
    for (&w, x) in weights.iter().zip(&selected) {
        let z = (x - old_mean) / sigma;
        rank_mu += w * &z * z.transpose();
    }
    let rank_one = &next.pc * next.pc.transpose() + (1.0 - hsig) * cc * (2.0 - cc) * &state.c;
    next.c = (1.0 - c1 - cmu) * &state.c + c1 * rank_one + cmu * rank_mu;

    next.sigma = sigma * ((cs / params.damps()) * (next.ps.norm() / params.chi_n() - 1.0)).exp();
    if !next.sigma.is_finite() || next.sigma <= 0.0 {
        return Err(Error::InvalidSigma(next.sigma));
    }
    next.mean = mean;
    next.refresh_sbd();

    let elapsed = match next.last_eigen_generation {
        Some(last) => generation as f64 - last as f64,
        None => generation as f64 + 1.0,
    };
    if elapsed > params.eigen_refresh_gap() {
        next.refresh_eigensystem(generation)?;
    }

    trace_debug!(
        generation,
        sigma = next.sigma,
        hsig,
        ps_norm = next.ps.norm(),
        "updated search distribution"
    );

    let outcome = if alternative_termination {
        check_conditioning(&next)
    } else {
        UpdateOutcome::Continue
    };
    *state = next;
    Ok(outcome)
}

/// Validates the generation and returns candidate indices, best first.
fn rank<V: PartialOrd>(
    params: &StrategyParameters,
    direction: Direction,
    candidates: &[Candidate<V>],
) -> Result<Vec<usize>> {
    if candidates.len() != params.lambda() {
        return Err(Error::PopulationSizeMismatch {
            expected: params.lambda(),
            got: candidates.len(),
        });
    }
    let mut fitness = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.x.len() != params.n() {
            return Err(Error::DimensionMismatch {
                expected: params.n(),
                got: candidate.x.len(),
            });
        }
        fitness.push(candidate.fitness.as_ref().ok_or(Error::Unevaluated(i))?);
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| direction.compare(fitness[a], fitness[b]));
    Ok(order)
}

/// Stall indicator of the rank-one path, computed in `f64` throughout.
#[allow(clippy::cast_precision_loss)]
fn heaviside(ps: &DVector<f64>, cs: f64, generation: u64, n: usize) -> f64 {
    let n = n as f64;
    let denominator = 1.0 - (1.0 - cs).powf(2.0 * (generation as f64 + 1.0));
    if denominator <= 0.0 {
        return 0.0;
    }
    if ps.norm_squared() / denominator / n < 2.0 + 4.0 / (n + 1.0) {
        1.0
    } else {
        0.0
    }
}

fn check_conditioning(state: &DistributionState) -> UpdateOutcome {
    let d = &state.eigen.d;
    let (max, min) = (d.max(), d.min());
    if max > ILL_CONDITIONED_AXIS_RATIO * min {
        let reason = TerminationReason::IllConditioned {
            axis_ratio: max / min,
        };
        trace_info!(%reason, "signalling run completion");
        UpdateOutcome::Complete(reason)
    } else {
        UpdateOutcome::Continue
    }
}
