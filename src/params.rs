//! Strategy parameters derived from the problem dimension.
//!
//! All constants follow the standard CMA-ES defaults (Hansen's tutorial);
//! any of them can be overridden through [`StrategyOverrides`], in which case
//! the override is validated against the same invariants the defaults obey.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Slack allowed when checking `c1 + cmu <= 1` for round-off.
const RATE_SUM_TOLERANCE: f64 = 1e-12;

/// User-supplied overrides for the derived strategy parameters.
///
/// Every field is optional; unset fields are computed from the dimension.
/// Weights are all-or-nothing: either every one of the `mu` weights is
/// given, or none.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct StrategyOverrides {
    /// Population size.
    pub lambda: Option<usize>,
    /// Number of parents used for recombination.
    pub mu: Option<usize>,
    /// Recombination weights keyed by rank.
    pub weights: BTreeMap<usize, f64>,
    /// Cumulation constant for the rank-one path.
    pub cc: Option<f64>,
    /// Cumulation constant for the step-size path.
    pub cs: Option<f64>,
    /// Rank-one learning rate.
    pub c1: Option<f64>,
    /// Rank-mu learning rate.
    pub cmu: Option<f64>,
    /// Step-size damping.
    pub damps: Option<f64>,
}

/// The CMA-ES constants for one population. Immutable once derived.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategyParameters {
    /// Dimension of the search space.
    n: usize,
    /// Population size.
    lambda: usize,
    /// Parent count.
    mu: usize,
    /// Recombination weights (length `mu`, non-negative, summing to one).
    weights: Vec<f64>,
    /// Variance effective selection mass.
    mueff: f64,
    /// Learning rate for the cumulation of the rank-one update.
    cc: f64,
    /// Learning rate for the cumulation of the step-size control.
    cs: f64,
    /// Learning rate for the rank-one update of C.
    c1: f64,
    /// Learning rate for the rank-mu update of C.
    cmu: f64,
    /// Damping for sigma.
    damps: f64,
    /// Expected norm of N(0, I) in n dimensions.
    chi_n: f64,
}

impl StrategyParameters {
    /// Derives every parameter for dimension `n` with no overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::ZeroDimensions` if `n == 0`.
    pub fn new(n: usize) -> Result<Self> {
        Self::derive(n, &StrategyOverrides::default())
    }

    /// Derives every parameter not present in `overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if `n == 0` or if any override violates the
    /// parameter invariants: `lambda == 0`, `mu` outside `[1, lambda]`,
    /// partial or negative weights, `cc`/`cs`/`c1`/`cmu` outside `[0, 1]`,
    /// `c1 + cmu > 1`, or `damps <= 0`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn derive(n: usize, overrides: &StrategyOverrides) -> Result<Self> {
        if n == 0 {
            return Err(Error::ZeroDimensions);
        }
        let n_f = n as f64;

        let lambda = match overrides.lambda {
            Some(0) => return Err(Error::InvalidLambda),
            Some(lambda) => lambda,
            None => 4 + (3.0 * n_f.ln()).floor() as usize,
        };

        let mu = match overrides.mu {
            Some(mu) if mu == 0 || mu > lambda => return Err(Error::InvalidMu { mu, lambda }),
            Some(mu) => mu,
            None => (lambda / 2).max(1),
        };

        let weights = if overrides.weights.is_empty() {
            default_weights(lambda, mu)
        } else {
            trace_warn!(mu, "recombination weights overridden; default formula ignored");
            supplied_weights(&overrides.weights, mu)?
        };

        let mueff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let cc = unit_rate("cc", overrides.cc)?
            .unwrap_or_else(|| (4.0 + mueff / n_f) / (n_f + 4.0 + 2.0 * mueff / n_f));
        let cs = unit_rate("cs", overrides.cs)?
            .unwrap_or_else(|| (mueff + 2.0) / (n_f + mueff + 5.0));
        let c1 = unit_rate("c1", overrides.c1)?
            .unwrap_or_else(|| 2.0 / ((n_f + 1.3).powi(2) + mueff));
        let cmu = unit_rate("cmu", overrides.cmu)?.unwrap_or_else(|| {
            let raw = 2.0 * (mueff - 2.0 + 1.0 / mueff) / ((n_f + 2.0).powi(2) + mueff);
            raw.min(1.0 - c1)
        });
        if c1 + cmu > 1.0 + RATE_SUM_TOLERANCE {
            return Err(Error::LearningRatesTooLarge { c1, cmu });
        }

        let damps = match overrides.damps {
            Some(damps) if damps.is_nan() || damps <= 0.0 => {
                return Err(Error::InvalidDamps(damps));
            }
            Some(damps) => {
                if !(0.5..=2.0).contains(&damps) {
                    trace_warn!(damps, "damps is far outside the usual range [0.5, 2]");
                }
                damps
            }
            None => 1.0 + 2.0 * (((mueff - 1.0) / (n_f + 1.0)).sqrt() - 1.0).max(0.0) + cs,
        };

        let chi_n = n_f.sqrt() * (1.0 - 1.0 / (4.0 * n_f) + 1.0 / (21.0 * n_f * n_f));

        trace_debug!(
            n,
            lambda,
            mu,
            mueff,
            cc,
            cs,
            c1,
            cmu,
            damps,
            chi_n,
            "derived CMA-ES strategy parameters"
        );
        trace_debug!(weights = ?weights, "recombination weights");

        Ok(Self {
            n,
            lambda,
            mu,
            weights,
            mueff,
            cc,
            cs,
            c1,
            cmu,
            damps,
            chi_n,
        })
    }

    /// Dimension of the search space.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Population size.
    #[must_use]
    pub fn lambda(&self) -> usize {
        self.lambda
    }

    /// Parent count.
    #[must_use]
    pub fn mu(&self) -> usize {
        self.mu
    }

    /// Recombination weights, best rank first.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Variance effective selection mass.
    #[must_use]
    pub fn mueff(&self) -> f64 {
        self.mueff
    }

    /// Cumulation constant of the rank-one path.
    #[must_use]
    pub fn cc(&self) -> f64 {
        self.cc
    }

    /// Cumulation constant of the step-size path.
    #[must_use]
    pub fn cs(&self) -> f64 {
        self.cs
    }

    /// Rank-one learning rate.
    #[must_use]
    pub fn c1(&self) -> f64 {
        self.c1
    }

    /// Rank-mu learning rate.
    #[must_use]
    pub fn cmu(&self) -> f64 {
        self.cmu
    }

    /// Step-size damping.
    #[must_use]
    pub fn damps(&self) -> f64 {
        self.damps
    }

    /// Expected norm of an `n`-dimensional standard normal vector.
    #[must_use]
    pub fn chi_n(&self) -> f64 {
        self.chi_n
    }

    /// Minimum number of generations between two eigendecompositions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn eigen_refresh_gap(&self) -> f64 {
        1.0 / ((self.c1 + self.cmu) * self.n as f64 * 10.0)
    }
}

/// Log-linear weights `ln((lambda+1) / (2(i+1)))`, normalized.
///
/// When `mu` is raised past `(lambda+1)/2` the tail of that formula turns
/// negative; the parent count then takes the place of `lambda/2`. At exactly
/// `(lambda+1)/2` the last weight is zero.
#[allow(clippy::cast_precision_loss)]
fn default_weights(lambda: usize, mu: usize) -> Vec<f64> {
    if mu == 1 {
        return vec![1.0];
    }
    let base = if 2 * mu > lambda + 1 {
        (mu as f64 + 0.5).ln()
    } else {
        ((lambda + 1) as f64 / 2.0).ln()
    };
    let raw: Vec<f64> = (0..mu).map(|i| base - ((i + 1) as f64).ln()).collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

fn supplied_weights(weights: &BTreeMap<usize, f64>, mu: usize) -> Result<Vec<f64>> {
    if let Some((&index, _)) = weights.range(mu..).next() {
        return Err(Error::IndexOutOfRange { index, n: mu });
    }
    if weights.len() != mu {
        return Err(Error::PartialWeights {
            given: weights.len(),
            mu,
        });
    }
    for (&index, &value) in weights {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidWeight { index, value });
        }
    }
    let sum: f64 = weights.values().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return Err(Error::DegenerateWeights(sum));
    }
    Ok(weights.values().map(|w| w / sum).collect())
}

fn unit_rate(name: &'static str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(Error::InvalidRate {
            name,
            value: v,
            low: 0.0,
            high: 1.0,
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_for_many_dimensions() {
        for n in 1..=200 {
            let p = StrategyParameters::new(n).unwrap();
            let sum: f64 = p.weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "n = {n}: sum = {sum}");
            let closed: f64 = 1.0 / p.weights().iter().map(|w| w * w).sum::<f64>();
            assert!((p.mueff() - closed).abs() < 1e-9);
            assert!(p.weights().iter().all(|&w| w >= 0.0));
            assert!(p.weights().windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn defaults_for_ten_dimensions() {
        let p = StrategyParameters::new(10).unwrap();
        assert_eq!(p.lambda(), 10);
        assert_eq!(p.mu(), 5);
        assert_eq!(p.weights().len(), 5);
        let chi_n = 10f64.sqrt() * (1.0 - 1.0 / 40.0 + 1.0 / 2100.0);
        assert!((p.chi_n() - chi_n).abs() < 1e-12);
        let cs = (p.mueff() + 2.0) / (10.0 + p.mueff() + 5.0);
        assert!((p.cs() - cs).abs() < 1e-12);
        assert!(p.c1() + p.cmu() <= 1.0);
        assert!(p.damps() > 0.0);
    }

    #[test]
    fn one_dimension_uses_minimum_population() {
        let p = StrategyParameters::new(1).unwrap();
        assert_eq!(p.lambda(), 4);
        assert_eq!(p.mu(), 2);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            StrategyParameters::new(0),
            Err(Error::ZeroDimensions)
        ));
    }

    #[test]
    fn mu_greater_than_lambda_rejected() {
        let overrides = StrategyOverrides {
            lambda: Some(4),
            mu: Some(5),
            ..StrategyOverrides::default()
        };
        assert!(matches!(
            StrategyParameters::derive(3, &overrides),
            Err(Error::InvalidMu { mu: 5, lambda: 4 })
        ));
    }

    #[test]
    fn zero_mu_and_lambda_rejected() {
        let zero_mu = StrategyOverrides {
            mu: Some(0),
            ..StrategyOverrides::default()
        };
        assert!(matches!(
            StrategyParameters::derive(3, &zero_mu),
            Err(Error::InvalidMu { mu: 0, .. })
        ));

        let zero_lambda = StrategyOverrides {
            lambda: Some(0),
            ..StrategyOverrides::default()
        };
        assert!(matches!(
            StrategyParameters::derive(3, &zero_lambda),
            Err(Error::InvalidLambda)
        ));
    }

    #[test]
    fn lambda_one_keeps_a_parent() {
        let overrides = StrategyOverrides {
            lambda: Some(1),
            ..StrategyOverrides::default()
        };
        let p = StrategyParameters::derive(2, &overrides).unwrap();
        assert_eq!(p.mu(), 1);
        assert_eq!(p.weights(), &[1.0]);
    }

    #[test]
    fn mu_equal_lambda_keeps_weights_non_negative() {
        let overrides = StrategyOverrides {
            lambda: Some(4),
            mu: Some(4),
            ..StrategyOverrides::default()
        };
        let p = StrategyParameters::derive(2, &overrides).unwrap();
        assert_eq!(p.weights().len(), 4);
        assert!(p.weights().iter().all(|&w| w > 0.0));
        assert!((p.weights().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parent_count_at_half_population_keeps_log_weights() {
        let overrides = StrategyOverrides {
            lambda: Some(5),
            mu: Some(3),
            ..StrategyOverrides::default()
        };
        let p = StrategyParameters::derive(2, &overrides).unwrap();

        let raw: Vec<f64> = (1..=3).map(|i| (6.0 / (2.0 * f64::from(i))).ln()).collect();
        let sum: f64 = raw.iter().sum();
        for (w, r) in p.weights().iter().zip(&raw) {
            assert!((w - r / sum).abs() < 1e-12, "{:?}", p.weights());
        }
        assert!(p.weights()[2].abs() < 1e-12);
        assert!((p.weights()[0] - 0.7304).abs() < 1e-3);
    }

    #[test]
    fn partial_weights_rejected() {
        let mut overrides = StrategyOverrides {
            lambda: Some(6),
            ..StrategyOverrides::default()
        };
        overrides.weights.insert(0, 0.5);
        overrides.weights.insert(1, 0.3);
        assert!(matches!(
            StrategyParameters::derive(2, &overrides),
            Err(Error::PartialWeights { given: 2, mu: 3 })
        ));
    }

    #[test]
    fn supplied_weights_are_normalized() {
        let mut overrides = StrategyOverrides {
            lambda: Some(6),
            ..StrategyOverrides::default()
        };
        for (i, w) in [3.0, 2.0, 1.0].into_iter().enumerate() {
            overrides.weights.insert(i, w);
        }
        let p = StrategyParameters::derive(2, &overrides).unwrap();
        assert!((p.weights()[0] - 0.5).abs() < 1e-12);
        assert!((p.mueff() - 1.0 / (0.25 + 1.0 / 9.0 + 1.0 / 36.0)).abs() < 1e-9);
    }

    #[test]
    fn negative_weight_rejected() {
        let mut overrides = StrategyOverrides {
            lambda: Some(4),
            ..StrategyOverrides::default()
        };
        overrides.weights.insert(0, 1.0);
        overrides.weights.insert(1, -0.5);
        assert!(matches!(
            StrategyParameters::derive(2, &overrides),
            Err(Error::InvalidWeight { index: 1, .. })
        ));
    }

    #[test]
    fn learning_rates_validated() {
        let too_large = StrategyOverrides {
            c1: Some(0.6),
            cmu: Some(0.6),
            ..StrategyOverrides::default()
        };
        assert!(matches!(
            StrategyParameters::derive(2, &too_large),
            Err(Error::LearningRatesTooLarge { .. })
        ));

        let bad_cc = StrategyOverrides {
            cc: Some(1.5),
            ..StrategyOverrides::default()
        };
        assert!(matches!(
            StrategyParameters::derive(2, &bad_cc),
            Err(Error::InvalidRate { name: "cc", .. })
        ));

        let negative_c1 = StrategyOverrides {
            c1: Some(-0.1),
            ..StrategyOverrides::default()
        };
        assert!(matches!(
            StrategyParameters::derive(2, &negative_c1),
            Err(Error::InvalidRate { name: "c1", .. })
        ));
    }

    #[test]
    fn cmu_default_respects_supplied_c1() {
        let overrides = StrategyOverrides {
            c1: Some(0.95),
            ..StrategyOverrides::default()
        };
        let p = StrategyParameters::derive(1, &overrides).unwrap();
        assert!(p.cmu() <= 0.05 + 1e-12);
    }

    #[test]
    fn damps_must_be_positive() {
        let overrides = StrategyOverrides {
            damps: Some(0.0),
            ..StrategyOverrides::default()
        };
        assert!(matches!(
            StrategyParameters::derive(2, &overrides),
            Err(Error::InvalidDamps(_))
        ));

        let unusual = StrategyOverrides {
            damps: Some(5.0),
            ..StrategyOverrides::default()
        };
        assert!((StrategyParameters::derive(2, &unusual).unwrap().damps() - 5.0).abs() < 1e-12);
    }
}
