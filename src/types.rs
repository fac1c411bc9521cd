//! Core types shared by the sampler and the updater.

use core::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The direction of optimization, i.e. the host's better-than order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Smaller fitness is better.
    #[default]
    Minimize,
    /// Larger fitness is better.
    Maximize,
}

impl Direction {
    /// Compares two fitness values so that the better one orders first.
    ///
    /// The order is total: values that are not comparable with themselves
    /// (NaN) always rank worst, and two such values compare equal.
    pub fn compare<V: PartialOrd>(self, a: &V, b: &V) -> Ordering {
        let a_nan = a.partial_cmp(a).is_none();
        let b_nan = b.partial_cmp(b).is_none();
        match (a_nan, b_nan) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
                match self {
                    Direction::Minimize => ord,
                    Direction::Maximize => ord.reverse(),
                }
            }
        }
    }
}

/// Per-dimension inclusive bounds `[min_i, max_i]`.
///
/// Either side may be infinite, which leaves that dimension unbounded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Bounds {
    /// Creates bounds from per-dimension minima and maxima.
    ///
    /// # Errors
    ///
    /// Returns `Error::ZeroDimensions` if both vectors are empty,
    /// `Error::DimensionMismatch` if their lengths differ, and
    /// `Error::InvalidBounds` if any `min_i > max_i` or either is NaN.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Result<Self> {
        if min.is_empty() && max.is_empty() {
            return Err(Error::ZeroDimensions);
        }
        if min.len() != max.len() {
            return Err(Error::DimensionMismatch {
                expected: min.len(),
                got: max.len(),
            });
        }
        for (dimension, (&lo, &hi)) in min.iter().zip(&max).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(Error::InvalidBounds {
                    dimension,
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Creates `n` dimensions sharing the same `[min, max]` interval.
    ///
    /// # Errors
    ///
    /// Same as [`Bounds::new`].
    pub fn uniform(n: usize, min: f64, max: f64) -> Result<Self> {
        Self::new(vec![min; n], vec![max; n])
    }

    /// Creates `n` unbounded dimensions.
    #[must_use]
    pub fn unbounded(n: usize) -> Self {
        Self {
            min: vec![f64::NEG_INFINITY; n],
            max: vec![f64::INFINITY; n],
        }
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.min.len()
    }

    /// Returns the per-dimension lower bounds.
    #[must_use]
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Returns the per-dimension upper bounds.
    #[must_use]
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Returns `true` if `value` lies within the bounds of dimension `i`.
    #[must_use]
    pub fn contains_coordinate(&self, i: usize, value: f64) -> bool {
        value >= self.min[i] && value <= self.max[i]
    }

    /// Returns `true` if every coordinate of `x` is within bounds.
    #[must_use]
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dimension()
            && x
                .iter()
                .enumerate()
                .all(|(i, &v)| self.contains_coordinate(i, v))
    }

    /// Returns the finite interval of dimension `i`, or an error naming `mode`.
    pub(crate) fn finite_interval(&self, i: usize, mode: &'static str) -> Result<(f64, f64)> {
        let (lo, hi) = (self.min[i], self.max[i]);
        if lo.is_finite() && hi.is_finite() {
            Ok((lo, hi))
        } else {
            Err(Error::UnboundedDimension { mode, dimension: i })
        }
    }
}

/// A real-valued candidate vector and its (optional) fitness.
///
/// Produced by the sampler with `fitness: None`; the host fills in the
/// fitness before handing the generation to the updater.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate<V = f64> {
    /// The sampled vector.
    pub x: Vec<f64>,
    /// The fitness, once evaluated.
    pub fitness: Option<V>,
}

impl<V> Candidate<V> {
    /// Creates an unevaluated candidate.
    #[must_use]
    pub fn new(x: Vec<f64>) -> Self {
        Self { x, fitness: None }
    }

    /// Creates an evaluated candidate.
    #[must_use]
    pub fn evaluated(x: Vec<f64>, fitness: V) -> Self {
        Self {
            x,
            fitness: Some(fitness),
        }
    }

    /// Returns `true` once a fitness has been assigned.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }
}
