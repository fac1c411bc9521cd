use cmaes_species::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn samples_stay_inside_bounds() {
    let config = CmaEsConfig::builder()
        .mean(MeanInit::Center)
        .sigma(0.8)
        .build();
    let bounds = Bounds::new(vec![-1.0, 0.0, 10.0], vec![1.0, 0.5, 12.0]).unwrap();
    let mut rng = StdRng::seed_from_u64(99);
    let species = CmaEsSpecies::new(&config, bounds.clone(), &mut rng).unwrap();

    for _ in 0..500 {
        let x = species.sample(&mut rng).unwrap();
        assert!(bounds.contains(&x), "{x:?} escaped the bounds");
    }
    assert!(species.stats().rejected() > 0);
}

#[test]
fn alternative_generator_bounds_attempts() {
    let config = CmaEsConfig::builder()
        .mean(MeanInit::Center)
        .sigma(100.0)
        .alternative_generator(true)
        .alternative_generator_tries(10)
        .build();
    let bounds = Bounds::uniform(4, 0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let species = CmaEsSpecies::new(&config, bounds.clone(), &mut rng).unwrap();
    assert_eq!(
        species.boundary_policy(),
        BoundaryPolicy::ClampViolatingDimensions
    );

    let report = species.sample_with_report(&mut rng).unwrap();
    assert!(report.attempts <= 11, "took {} attempts", report.attempts);
    assert!(report.repaired > 0);
    assert!(bounds.contains(&report.x));
}

#[test]
fn rejection_cap_turns_into_an_error() {
    let config = CmaEsConfig::builder()
        .mean_vector(vec![100.0])
        .max_rejections(20)
        .build();
    let bounds = Bounds::uniform(1, 0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let species = CmaEsSpecies::new(&config, bounds, &mut rng).unwrap();

    assert!(matches!(
        species.sample(&mut rng),
        Err(Error::RejectionLimit(20))
    ));
    assert_eq!(species.stats().rejected(), 21);
}

#[test]
fn reconcile_truncates_and_pads() {
    let config = CmaEsConfig::builder()
        .mean(MeanInit::Center)
        .lambda(5)
        .build();
    let bounds = Bounds::uniform(2, -1.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let species = CmaEsSpecies::new(&config, bounds, &mut rng).unwrap();

    let mut population: Vec<Candidate> = (0..8)
        .map(|i| Candidate::evaluated(vec![0.0, 0.0], f64::from(i)))
        .collect();
    species.reconcile_population(&mut population, &mut rng).unwrap();
    assert_eq!(population.len(), 5);
    assert_eq!(population[4].fitness, Some(4.0));

    population.truncate(2);
    species.reconcile_population(&mut population, &mut rng).unwrap();
    assert_eq!(population.len(), 5);
    assert_eq!(population.iter().filter(|c| c.is_evaluated()).count(), 2);
}

#[test]
fn update_rejects_wrong_population_size() {
    let config = CmaEsConfig::builder().mean(MeanInit::Zero).lambda(6).build();
    let mut rng = StdRng::seed_from_u64(4);
    let mut species = CmaEsSpecies::new(&config, Bounds::unbounded(2), &mut rng).unwrap();
    let before = species.state().clone();

    let population: Vec<Candidate> = (0..5)
        .map(|_| Candidate::evaluated(vec![0.0, 0.0], 1.0))
        .collect();
    assert!(matches!(
        species.update(0, &population),
        Err(Error::PopulationSizeMismatch { expected: 6, got: 5 })
    ));
    assert_eq!(species.state(), &before);
}
