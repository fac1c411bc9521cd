//! User-facing configuration of a CMA-ES population.
//!
//! A [`CmaEsConfig`] can be assembled with the fluent
//! [`CmaEsConfigBuilder`] or read from string key/value pairs with
//! [`CmaEsConfig::from_pairs`], which is how hosts that keep their settings
//! in parameter files hand them over.
//!
//! # Options
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `sigma` | float > 0 | 1.0 |
//! | `mean` | `zero`, `center`, `random` or a full vector | none (required) |
//! | `mean.<i>` | float | none |
//! | `lambda` | int > 0 | `4 + floor(3 ln n)` |
//! | `mu` | int in `[1, lambda]` | `floor(lambda / 2)` |
//! | `weight.<i>` | float >= 0, all or none | log-linear |
//! | `cc`, `cs` | float in `[0, 1]` | derived |
//! | `c1`, `cmu` | float >= 0 | derived |
//! | `damps` | float > 0 | derived |
//! | `covariance` | `identity` or `scaled` | `identity` |
//! | `alternative-termination` | bool | false |
//! | `alternative-generator` | bool | false |
//! | `alternative-generator-tries` | int >= 1 | 100 |
//! | `max-rejections` | int | unlimited |
//!
//! # Examples
//!
//! ```
//! use cmaes_species::{CmaEsConfig, CovarianceInit, MeanInit};
//!
//! let config = CmaEsConfig::from_pairs([
//!     ("sigma", "0.3"),
//!     ("mean", "center"),
//!     ("covariance", "scaled"),
//!     ("alternative-generator", "true"),
//! ])
//! .unwrap();
//!
//! assert_eq!(config.mean, Some(MeanInit::Center));
//! assert_eq!(config.covariance, CovarianceInit::Scaled);
//! ```

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::StrategyOverrides;
use crate::sampler::BoundaryPolicy;

/// Default number of consecutive rejections before the alternative generator
/// takes over.
pub const DEFAULT_GENERATOR_TRIES: u64 = 100;

/// How the initial mean is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MeanInit {
    /// The origin.
    Zero,
    /// The center of the bounds, `(max_i + min_i) / 2`.
    Center,
    /// Uniform per dimension in `[min_i, max_i]`.
    Random,
}

impl MeanInit {
    /// The option spelling of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MeanInit::Zero => "zero",
            MeanInit::Center => "center",
            MeanInit::Random => "random",
        }
    }
}

impl fmt::Display for MeanInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeanInit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(MeanInit::Zero),
            "center" => Ok(MeanInit::Center),
            "random" => Ok(MeanInit::Random),
            _ => Err(Error::UnknownMeanMode(s.to_string())),
        }
    }
}

/// How the initial covariance matrix is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CovarianceInit {
    /// `C = I`.
    #[default]
    Identity,
    /// Diagonal with entries `(max_i - min_i)^2`.
    Scaled,
}

impl fmt::Display for CovarianceInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CovarianceInit::Identity => f.write_str("identity"),
            CovarianceInit::Scaled => f.write_str("scaled"),
        }
    }
}

impl FromStr for CovarianceInit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" => Ok(CovarianceInit::Identity),
            "scaled" => Ok(CovarianceInit::Scaled),
            _ => Err(Error::UnknownCovarianceMode(s.to_string())),
        }
    }
}

/// Options for one CMA-ES population.
///
/// Values are validated when a [`CmaEsSpecies`](crate::CmaEsSpecies) is
/// created from the configuration, before any sampling happens.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct CmaEsConfig {
    /// Initial step size.
    pub sigma: f64,
    /// Initial mean mode.
    pub mean: Option<MeanInit>,
    /// Explicit per-dimension mean values; they take precedence over `mean`.
    pub mean_values: BTreeMap<usize, f64>,
    /// Initial covariance mode.
    pub covariance: CovarianceInit,
    /// Overrides for the derived strategy parameters.
    pub strategy: StrategyOverrides,
    /// Stop when the distribution becomes ill-conditioned.
    pub alternative_termination: bool,
    /// Repair out-of-bounds coordinates after repeated rejections.
    pub alternative_generator: bool,
    /// Consecutive rejections before the alternative generator takes over.
    pub alternative_generator_tries: u64,
    /// Hard cap on rejected draws for a single candidate.
    pub max_rejections: Option<u64>,
}

impl Default for CmaEsConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            mean: None,
            mean_values: BTreeMap::new(),
            covariance: CovarianceInit::Identity,
            strategy: StrategyOverrides::default(),
            alternative_termination: false,
            alternative_generator: false,
            alternative_generator_tries: DEFAULT_GENERATOR_TRIES,
            max_rejections: None,
        }
    }
}

impl CmaEsConfig {
    /// Creates a builder for configuring a `CmaEsConfig`.
    #[must_use]
    pub fn builder() -> CmaEsConfigBuilder {
        CmaEsConfigBuilder::new()
    }

    /// Reads a configuration from string key/value pairs.
    ///
    /// Keys and values are trimmed. `mean` accepts either a mode name or a
    /// full vector separated by whitespace or commas.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownOption` for unrecognized keys,
    /// `Error::InvalidOption` for values that do not parse,
    /// `Error::UnknownMeanMode` / `Error::UnknownCovarianceMode` for unknown
    /// mode strings.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            config.set(key.as_ref(), value.as_ref())?;
        }
        Ok(config)
    }

    /// Applies a single key/value option.
    ///
    /// # Errors
    ///
    /// See [`CmaEsConfig::from_pairs`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        let value = value.trim();

        if let Some(index) = key.strip_prefix("mean.") {
            let index = parse_index(key, index)?;
            self.mean_values.insert(index, parse(key, value)?);
            return Ok(());
        }
        if let Some(index) = key.strip_prefix("weight.") {
            let index = parse_index(key, index)?;
            self.strategy.weights.insert(index, parse(key, value)?);
            return Ok(());
        }

        match key {
            "sigma" => self.sigma = parse(key, value)?,
            "mean" => self.set_mean(value)?,
            "lambda" => self.strategy.lambda = Some(parse(key, value)?),
            "mu" => self.strategy.mu = Some(parse(key, value)?),
            "cc" => self.strategy.cc = Some(parse(key, value)?),
            "cs" => self.strategy.cs = Some(parse(key, value)?),
            "c1" => self.strategy.c1 = Some(parse(key, value)?),
            "cmu" => self.strategy.cmu = Some(parse(key, value)?),
            "damps" => self.strategy.damps = Some(parse(key, value)?),
            "covariance" => self.covariance = value.parse()?,
            "alternative-termination" => self.alternative_termination = parse(key, value)?,
            "alternative-generator" => self.alternative_generator = parse(key, value)?,
            "alternative-generator-tries" => {
                self.alternative_generator_tries = parse(key, value)?;
            }
            "max-rejections" => self.max_rejections = Some(parse(key, value)?),
            _ => return Err(Error::UnknownOption(key.to_string())),
        }
        Ok(())
    }

    /// The boundary policy selected by `alternative_generator`.
    #[must_use]
    pub fn boundary_policy(&self) -> BoundaryPolicy {
        if self.alternative_generator {
            BoundaryPolicy::ClampViolatingDimensions
        } else {
            BoundaryPolicy::RejectWholeVector
        }
    }

    fn set_mean(&mut self, value: &str) -> Result<()> {
        match value.parse::<MeanInit>() {
            Ok(mode) => self.mean = Some(mode),
            Err(mode_err) => {
                let coords: core::result::Result<Vec<f64>, _> = value
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<f64>)
                    .collect();
                match coords {
                    Ok(coords) if !coords.is_empty() => {
                        self.mean_values = coords.into_iter().enumerate().collect();
                    }
                    _ => return Err(mode_err),
                }
            }
        }
        Ok(())
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| Error::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_index(key: &str, index: &str) -> Result<usize> {
    index
        .parse()
        .map_err(|_| Error::UnknownOption(key.to_string()))
}

/// Builder for configuring a [`CmaEsConfig`].
///
/// All options have sensible defaults:
/// - `sigma`: 1.0
/// - `mean`: none, so a mode or a full vector must be supplied
/// - `covariance`: [`CovarianceInit::Identity`]
/// - strategy parameters: derived from the dimension
/// - alternative termination and generator: off, 100 tries
///
/// # Examples
///
/// ```
/// use cmaes_species::{CmaEsConfigBuilder, CovarianceInit, MeanInit};
///
/// let config = CmaEsConfigBuilder::new()
///     .sigma(0.5)
///     .mean(MeanInit::Random)
///     .covariance(CovarianceInit::Scaled)
///     .lambda(12)
///     .alternative_termination(true)
///     .build();
/// assert_eq!(config.strategy.lambda, Some(12));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CmaEsConfigBuilder {
    config: CmaEsConfig,
}

impl CmaEsConfigBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial step size.
    ///
    /// Default: 1.0.
    #[must_use]
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.config.sigma = sigma;
        self
    }

    /// Sets the initial mean mode.
    #[must_use]
    pub fn mean(mut self, mode: MeanInit) -> Self {
        self.config.mean = Some(mode);
        self
    }

    /// Sets a complete explicit initial mean.
    #[must_use]
    pub fn mean_vector(mut self, mean: Vec<f64>) -> Self {
        self.config.mean_values = mean.into_iter().enumerate().collect();
        self
    }

    /// Sets the initial mean of a single dimension.
    #[must_use]
    pub fn mean_value(mut self, index: usize, value: f64) -> Self {
        self.config.mean_values.insert(index, value);
        self
    }

    /// Sets the initial covariance mode.
    ///
    /// Default: [`CovarianceInit::Identity`].
    #[must_use]
    pub fn covariance(mut self, covariance: CovarianceInit) -> Self {
        self.config.covariance = covariance;
        self
    }

    /// Sets the population size (lambda).
    ///
    /// Default: `4 + floor(3 * ln(n))`.
    #[must_use]
    pub fn lambda(mut self, lambda: usize) -> Self {
        self.config.strategy.lambda = Some(lambda);
        self
    }

    /// Sets the parent count (mu).
    ///
    /// Default: `floor(lambda / 2)`.
    #[must_use]
    pub fn mu(mut self, mu: usize) -> Self {
        self.config.strategy.mu = Some(mu);
        self
    }

    /// Sets all `mu` recombination weights, best rank first.
    #[must_use]
    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.config.strategy.weights = weights.into_iter().enumerate().collect();
        self
    }

    /// Sets the rank-one cumulation constant.
    #[must_use]
    pub fn cc(mut self, cc: f64) -> Self {
        self.config.strategy.cc = Some(cc);
        self
    }

    /// Sets the step-size cumulation constant.
    #[must_use]
    pub fn cs(mut self, cs: f64) -> Self {
        self.config.strategy.cs = Some(cs);
        self
    }

    /// Sets the rank-one learning rate.
    #[must_use]
    pub fn c1(mut self, c1: f64) -> Self {
        self.config.strategy.c1 = Some(c1);
        self
    }

    /// Sets the rank-mu learning rate.
    #[must_use]
    pub fn cmu(mut self, cmu: f64) -> Self {
        self.config.strategy.cmu = Some(cmu);
        self
    }

    /// Sets the step-size damping.
    #[must_use]
    pub fn damps(mut self, damps: f64) -> Self {
        self.config.strategy.damps = Some(damps);
        self
    }

    /// Enables the ill-conditioning soft stop.
    #[must_use]
    pub fn alternative_termination(mut self, enabled: bool) -> Self {
        self.config.alternative_termination = enabled;
        self
    }

    /// Enables repair of out-of-bounds coordinates after repeated rejections.
    #[must_use]
    pub fn alternative_generator(mut self, enabled: bool) -> Self {
        self.config.alternative_generator = enabled;
        self
    }

    /// Sets the number of consecutive rejections before the alternative
    /// generator takes over.
    ///
    /// Default: 100.
    #[must_use]
    pub fn alternative_generator_tries(mut self, tries: u64) -> Self {
        self.config.alternative_generator_tries = tries;
        self
    }

    /// Caps the number of rejected draws for a single candidate.
    #[must_use]
    pub fn max_rejections(mut self, limit: u64) -> Self {
        self.config.max_rejections = Some(limit);
        self
    }

    /// Builds the configured [`CmaEsConfig`].
    #[must_use]
    pub fn build(self) -> CmaEsConfig {
        self.config
    }
}
