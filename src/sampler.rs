//! Bounded sampling from the current search distribution.
//!
//! A draw is `x = mean + sigma·B·D·z` with `z ~ N(0, I)`. Draws that leave
//! the bounds are rejected whole; after a configurable number of consecutive
//! rejections the [`BoundaryPolicy`] decides whether to keep rejecting or to
//! repair only the violating coordinates.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use nalgebra::DVector;
use rand::Rng;
use rand_distr::StandardNormal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_GENERATOR_TRIES;
use crate::error::{Error, Result};
use crate::state::DistributionState;
use crate::types::Bounds;

/// Total rejected draws after which a liveness warning is emitted once.
pub const LIVENESS_WARNING_THRESHOLD: u64 = 100_000;

/// What to do once a draw has been rejected `tries` times in a row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundaryPolicy {
    /// Keep redrawing the whole vector until it lands inside the bounds.
    #[default]
    RejectWholeVector,
    /// Keep the in-bounds coordinates of the last draw and redraw the
    /// violating ones uniformly within their bounds.
    ClampViolatingDimensions,
}

/// Settings of the rejection loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Policy applied after `tries` consecutive rejections.
    pub policy: BoundaryPolicy,
    /// Consecutive rejections before the policy kicks in.
    pub tries: u64,
    /// Hard cap on consecutive rejections of a single draw.
    pub max_rejections: Option<u64>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            policy: BoundaryPolicy::RejectWholeVector,
            tries: DEFAULT_GENERATOR_TRIES,
            max_rejections: None,
        }
    }
}

/// Rejection counters for one run.
///
/// Updated through atomics so concurrent samplers can share one instance
/// behind `&self`.
#[derive(Debug, Default)]
pub struct RejectionStats {
    draws: AtomicU64,
    rejected: AtomicU64,
    repaired: AtomicU64,
    liveness_warned: AtomicBool,
    tries_warned: AtomicBool,
}

impl RejectionStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted draws.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::Relaxed)
    }

    /// Number of rejected draws across the run.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Number of draws finished by repairing violating coordinates.
    #[must_use]
    pub fn repaired(&self) -> u64 {
        self.repaired.load(Ordering::Relaxed)
    }

    /// Clears all counters and re-arms the one-time warnings.
    pub fn reset(&self) {
        self.draws.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.repaired.store(0, Ordering::Relaxed);
        self.liveness_warned.store(false, Ordering::Relaxed);
        self.tries_warned.store(false, Ordering::Relaxed);
    }

    fn record_rejection(&self) {
        let total = self.rejected.fetch_add(1, Ordering::Relaxed) + 1;
        if total > LIVENESS_WARNING_THRESHOLD && !self.liveness_warned.swap(true, Ordering::Relaxed)
        {
            trace_warn!(
                rejected = total,
                "over {LIVENESS_WARNING_THRESHOLD} samples rejected by the bounds; \
                 the distribution may have drifted out of the feasible region"
            );
        }
    }

    fn warn_tries_exceeded(&self, tries: u64) {
        if !self.tries_warned.swap(true, Ordering::Relaxed) {
            trace_warn!(
                tries,
                "a sample was rejected {tries} times in a row; consider enabling \
                 the alternative generator"
            );
        }
    }
}

impl Clone for RejectionStats {
    fn clone(&self) -> Self {
        let flag = |b: &AtomicBool| AtomicBool::new(b.load(Ordering::Relaxed));
        let count = |c: &AtomicU64| AtomicU64::new(c.load(Ordering::Relaxed));
        Self {
            draws: count(&self.draws),
            rejected: count(&self.rejected),
            repaired: count(&self.repaired),
            liveness_warned: flag(&self.liveness_warned),
            tries_warned: flag(&self.tries_warned),
        }
    }
}

/// One accepted sample and how it was obtained.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawReport {
    /// The sampled vector, inside the bounds.
    pub x: Vec<f64>,
    /// Gaussian draws made, plus one if the last draw was repaired.
    pub attempts: u64,
    /// Number of coordinates replaced by the repair step.
    pub repaired: usize,
}

/// Draws one in-bounds sample from `state`.
///
/// # Errors
///
/// Returns `Error::DimensionMismatch` if `bounds` and `state` disagree on the
/// dimension, and `Error::RejectionLimit` when a single draw is rejected more
/// than `settings.max_rejections` times in a row.
pub fn draw<R: Rng + ?Sized>(
    state: &DistributionState,
    bounds: &Bounds,
    settings: &SamplerSettings,
    stats: &RejectionStats,
    rng: &mut R,
) -> Result<DrawReport> {
    if bounds.dimension() != state.dimension() {
        return Err(Error::DimensionMismatch {
            expected: state.dimension(),
            got: bounds.dimension(),
        });
    }
    let mut attempts = 0_u64;
    loop {
        attempts += 1;
        let mut x = draw_unbounded(state, rng);
        if bounds.contains(x.as_slice()) {
            stats.draws.fetch_add(1, Ordering::Relaxed);
            return Ok(DrawReport {
                x: x.as_slice().to_vec(),
                attempts,
                repaired: 0,
            });
        }

        stats.record_rejection();
        if let Some(limit) = settings.max_rejections
            && attempts > limit
        {
            return Err(Error::RejectionLimit(limit));
        }
        if attempts < settings.tries {
            continue;
        }

        match settings.policy {
            BoundaryPolicy::RejectWholeVector => stats.warn_tries_exceeded(settings.tries),
            BoundaryPolicy::ClampViolatingDimensions => {
                let repaired = repair(&mut x, bounds, rng);
                stats.draws.fetch_add(1, Ordering::Relaxed);
                stats.repaired.fetch_add(1, Ordering::Relaxed);
                return Ok(DrawReport {
                    x: x.as_slice().to_vec(),
                    attempts: attempts + 1,
                    repaired,
                });
            }
        }
    }
}

/// `mean + sigma·B·D·z` without any bounds handling.
pub fn draw_unbounded<R: Rng + ?Sized>(state: &DistributionState, rng: &mut R) -> DVector<f64> {
    let z = DVector::from_fn(state.dimension(), |_, _| rng.sample(StandardNormal));
    &state.mean + &state.sbd * z
}

/// Uniform draw in the finite interval `[lo, hi]`.
///
/// Works on half-widths so intervals wider than `f64::MAX` do not overflow.
pub(crate) fn uniform_in<R: Rng + ?Sized>(lo: f64, hi: f64, rng: &mut R) -> f64 {
    let mid = lo / 2.0 + hi / 2.0;
    let half = hi / 2.0 - lo / 2.0;
    (mid + half * rng.random_range(-1.0_f64..=1.0)).clamp(lo, hi)
}

/// Replaces violating coordinates and returns how many were touched.
///
/// A violated dimension with both bounds finite is redrawn uniformly; a
/// half-open one is pinned to its finite side, also when the coordinate is
/// NaN.
fn repair<R: Rng + ?Sized>(x: &mut DVector<f64>, bounds: &Bounds, rng: &mut R) -> usize {
    let mut repaired = 0;
    for i in 0..x.len() {
        if bounds.contains_coordinate(i, x[i]) {
            continue;
        }
        let (lo, hi) = (bounds.min()[i], bounds.max()[i]);
        x[i] = match (lo.is_finite(), hi.is_finite()) {
            (true, true) => uniform_in(lo, hi, rng),
            _ if !x[i].is_nan() => x[i].clamp(lo, hi),
            (true, false) => lo,
            (false, true) => hi,
            (false, false) => 0.0,
        };
        repaired += 1;
    }
    repaired
}
