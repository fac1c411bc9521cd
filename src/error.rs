/// Errors returned while configuring or running the CMA-ES search distribution.
///
/// Every variant is fatal for the population it was raised for: the caller
/// should abort the run. Soft stops (such as an ill-conditioned distribution)
/// are not errors; they are reported through
/// [`UpdateOutcome`](crate::update::UpdateOutcome).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the search space has no dimensions.
    #[error("dimension must be at least 1")]
    ZeroDimensions,

    /// Returned when a lower bound is greater than its upper bound.
    #[error("invalid bounds for dimension {dimension}: min ({min}) must be <= max ({max})")]
    InvalidBounds {
        /// The offending dimension.
        dimension: usize,
        /// The lower bound value.
        min: f64,
        /// The upper bound value.
        max: f64,
    },

    /// Returned when a vector has the wrong number of coordinates.
    #[error("dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch {
        /// The expected number of coordinates.
        expected: usize,
        /// The actual number of coordinates.
        got: usize,
    },

    /// Returned when the initial step size is not a positive finite number.
    #[error("invalid sigma: {0} must be positive and finite")]
    InvalidSigma(f64),

    /// Returned when the population size is zero.
    #[error("invalid lambda: population size must be at least 1")]
    InvalidLambda,

    /// Returned when the parent count is outside `[1, lambda]`.
    #[error("invalid mu: {mu} must be in [1, lambda = {lambda}]")]
    InvalidMu {
        /// The requested parent count.
        mu: usize,
        /// The population size.
        lambda: usize,
    },

    /// Returned when only some of the recombination weights are supplied.
    #[error("partial weights: all {mu} weights must be given together, got {given}")]
    PartialWeights {
        /// The number of weights supplied.
        given: usize,
        /// The number of weights required.
        mu: usize,
    },

    /// Returned when a recombination weight is negative or not finite.
    #[error("invalid weight {index}: {value} must be finite and >= 0")]
    InvalidWeight {
        /// The index of the weight.
        index: usize,
        /// The supplied value.
        value: f64,
    },

    /// Returned when supplied weights cannot be normalized.
    #[error("weights sum to {0}; cannot normalize")]
    DegenerateWeights(f64),

    /// Returned when a learning rate lies outside its admissible range.
    #[error("invalid {name}: {value} must be in [{low}, {high}]")]
    InvalidRate {
        /// The parameter name (`cc`, `cs`, `c1`, `cmu`).
        name: &'static str,
        /// The supplied value.
        value: f64,
        /// Inclusive lower limit.
        low: f64,
        /// Inclusive upper limit.
        high: f64,
    },

    /// Returned when the rank-one and rank-mu rates sum above one.
    #[error("c1 ({c1}) + cmu ({cmu}) must not exceed 1")]
    LearningRatesTooLarge {
        /// Rank-one learning rate.
        c1: f64,
        /// Rank-mu learning rate.
        cmu: f64,
    },

    /// Returned when the step-size damping is not positive.
    #[error("invalid damps: {0} must be positive")]
    InvalidDamps(f64),

    /// Returned when the number of alternative-generator tries is zero.
    #[error("alternative-generator-tries must be at least 1")]
    InvalidGeneratorTries,

    /// Returned when a mode string names no known mean initialization.
    #[error("unknown mean mode '{0}', expected zero, center, random or an explicit vector")]
    UnknownMeanMode(String),

    /// Returned when a mode string names no known covariance initialization.
    #[error("unknown covariance mode '{0}', expected identity or scaled")]
    UnknownCovarianceMode(String),

    /// Returned when neither a mean mode nor a complete explicit mean is given.
    #[error("unresolved mean: no mode given and only {given} of {n} coordinates specified")]
    UnresolvedMean {
        /// Number of explicit coordinates supplied.
        given: usize,
        /// Dimensionality.
        n: usize,
    },

    /// Returned when an initialization mode needs finite bounds that are missing.
    #[error("{mode} initialization requires finite bounds, dimension {dimension} is unbounded")]
    UnboundedDimension {
        /// The mode that needed the bound.
        mode: &'static str,
        /// The unbounded dimension.
        dimension: usize,
    },

    /// Returned when an explicit per-dimension value addresses a missing dimension.
    #[error("index {index} out of range for {n} dimensions")]
    IndexOutOfRange {
        /// The supplied index.
        index: usize,
        /// Dimensionality.
        n: usize,
    },

    /// Returned when the covariance matrix contains NaN or infinite entries.
    #[error("covariance matrix contains non-finite entries")]
    NonFiniteCovariance,

    /// Returned when the eigendecomposition did not converge.
    #[error("eigendecomposition did not converge")]
    EigenDecomposition,

    /// Returned when the covariance matrix has a clearly negative eigenvalue.
    #[error("covariance matrix is not positive semidefinite (eigenvalue {0})")]
    NotPositiveSemidefinite(f64),

    /// Returned when an update receives a population of the wrong size.
    #[error("population size mismatch: expected lambda = {expected} candidates, got {got}")]
    PopulationSizeMismatch {
        /// The population size `lambda`.
        expected: usize,
        /// The number of candidates supplied.
        got: usize,
    },

    /// Returned when an update receives a candidate without a fitness.
    #[error("candidate {0} has not been evaluated")]
    Unevaluated(usize),

    /// Returned when bound-rejection sampling exceeds the configured cap.
    #[error("rejection sampling gave up after {0} rejected draws")]
    RejectionLimit(u64),

    /// Returned when a configuration key is not recognized.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// Returned when a configuration value cannot be parsed.
    #[error("invalid value '{value}' for option '{key}': {reason}")]
    InvalidOption {
        /// The option key.
        key: String,
        /// The raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

pub type Result<T> = core::result::Result<T, Error>;
