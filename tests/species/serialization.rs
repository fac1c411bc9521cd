use cmaes_species::prelude::*;
use cmaes_species::DistributionState;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn config_reads_kebab_case_json() {
    let json = r#"{
        "sigma": 0.3,
        "mean": "random",
        "covariance": "scaled",
        "alternative-generator": true,
        "strategy": { "lambda": 10, "mu": 4 }
    }"#;
    let config: CmaEsConfig = serde_json::from_str(json).unwrap();
    assert!((config.sigma - 0.3).abs() < f64::EPSILON);
    assert_eq!(config.mean, Some(MeanInit::Random));
    assert_eq!(config.covariance, CovarianceInit::Scaled);
    assert!(config.alternative_generator);
    assert_eq!(config.strategy.lambda, Some(10));
    assert_eq!(config.alternative_generator_tries, 100);
}

#[test]
fn state_survives_a_json_round_trip() {
    let config = CmaEsConfig::builder().mean(MeanInit::Zero).build();
    let mut rng = StdRng::seed_from_u64(2);
    let mut species = CmaEsSpecies::new(&config, Bounds::unbounded(3), &mut rng).unwrap();
    Driver::new(5)
        .run(&mut species, &mut rng, |x| x.iter().map(|v| v * v).sum())
        .unwrap();

    let json = serde_json::to_string(species.state()).unwrap();
    let restored: DistributionState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.last_eigen_generation(), species.state().last_eigen_generation());
    assert!((restored.sigma() - species.state().sigma()).abs() < 1e-12);
    assert!((restored.covariance() - species.state().covariance()).abs().max() < 1e-12);
}
