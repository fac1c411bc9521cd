use cmaes_species::prelude::*;
use cmaes_species::StrategyParameters;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn mu_above_lambda_is_rejected_before_sampling() {
    let config = CmaEsConfig::from_pairs([("mean", "zero"), ("lambda", "6"), ("mu", "7")]).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let result = CmaEsSpecies::new(&config, Bounds::unbounded(3), &mut rng);
    assert!(matches!(result, Err(Error::InvalidMu { mu: 7, lambda: 6 })));
}

#[test]
fn key_value_options_reach_the_species() {
    let config = CmaEsConfig::from_pairs([
        ("sigma", "0.25"),
        ("mean", "center"),
        ("mean.1", "0.9"),
        ("covariance", "scaled"),
        ("lambda", "12"),
        ("mu", "3"),
        ("weight.0", "3"),
        ("weight.1", "2"),
        ("weight.2", "1"),
        ("alternative-generator", "true"),
    ])
    .unwrap();
    let bounds = Bounds::uniform(3, 0.0, 2.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let species = CmaEsSpecies::new(&config, bounds, &mut rng).unwrap();

    let params = species.params();
    assert_eq!(params.lambda(), 12);
    assert_eq!(params.mu(), 3);
    let weights = params.weights();
    assert!((weights[0] - 0.5).abs() < 1e-12);
    assert!((weights[2] - 1.0 / 6.0).abs() < 1e-12);

    let state = species.state();
    assert_eq!(state.mean().as_slice(), &[1.0, 0.9, 1.0]);
    assert!((state.sigma() - 0.25).abs() < f64::EPSILON);
    assert!((state.covariance()[(0, 0)] - 4.0).abs() < 1e-12);
    assert_eq!(
        species.boundary_policy(),
        BoundaryPolicy::ClampViolatingDimensions
    );
}

#[test]
fn unknown_option_is_reported() {
    let err = CmaEsConfig::from_pairs([("sigmaa", "1.0")]).unwrap_err();
    assert!(matches!(err, Error::UnknownOption(key) if key == "sigmaa"));
}

#[test]
fn missing_mean_is_fatal() {
    let config = CmaEsConfig::default();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        CmaEsSpecies::new(&config, Bounds::unbounded(2), &mut rng),
        Err(Error::UnresolvedMean { given: 0, n: 2 })
    ));
}

#[test]
fn derived_defaults_are_consistent() {
    for n in [1, 2, 5, 10, 40, 100] {
        let params = StrategyParameters::new(n).unwrap();
        let sum: f64 = params.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        let inv: f64 = params.weights().iter().map(|w| w * w).sum();
        assert!((params.mueff() - 1.0 / inv).abs() < 1e-9);
        assert!(params.c1() + params.cmu() <= 1.0);
        assert!(params.mu() <= params.lambda());
    }
}
