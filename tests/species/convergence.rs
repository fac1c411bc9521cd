use cmaes_species::prelude::*;
use cmaes_species::linalg;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn sphere(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum()
}

fn evaluate(population: &mut [Candidate], objective: impl Fn(&[f64]) -> f64) {
    for candidate in population {
        candidate.fitness = Some(objective(&candidate.x));
    }
}

#[test]
fn small_population_improves_on_sphere_in_most_runs() {
    let config = CmaEsConfig::builder()
        .mean_vector(vec![5.0, 5.0])
        .sigma(1.0)
        .lambda(4)
        .mu(4)
        .build();

    let runs = 100_u64;
    let mut improved = 0;
    for seed in 0..runs {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut species = CmaEsSpecies::new(&config, Bounds::unbounded(2), &mut rng).unwrap();
        let start = species.state().mean().norm();

        let mut population: Vec<Candidate> = Vec::new();
        species.reconcile_population(&mut population, &mut rng).unwrap();
        for generation in 0..50 {
            evaluate(&mut population, sphere);
            species.update(generation, &population).unwrap();
            for candidate in &mut population {
                *candidate = Candidate::new(species.sample(&mut rng).unwrap());
            }
        }
        if species.state().mean().norm() < start {
            improved += 1;
        }
    }
    assert!(
        improved * 100 >= runs * 95,
        "mean norm shrank in only {improved}/{runs} runs"
    );
}

#[test]
fn sigma_stays_positive_over_long_runs() {
    let config = CmaEsConfig::builder()
        .mean(MeanInit::Random)
        .covariance(CovarianceInit::Scaled)
        .build();
    let bounds = Bounds::uniform(6, -3.0, 3.0).unwrap();
    let mut rng = StdRng::seed_from_u64(17);
    let mut species = CmaEsSpecies::new(&config, bounds, &mut rng).unwrap();

    let mut population: Vec<Candidate> = Vec::new();
    species.reconcile_population(&mut population, &mut rng).unwrap();
    for generation in 0..400 {
        evaluate(&mut population, sphere);
        species.update(generation, &population).unwrap();

        let state = species.state();
        assert!(state.sigma() > 0.0, "sigma collapsed at generation {generation}");
        if state.last_eigen_generation() == Some(generation) {
            assert!(linalg::max_asymmetry(state.covariance()) < 1e-9);
        }
        for candidate in &mut population {
            *candidate = Candidate::new(species.sample(&mut rng).unwrap());
        }
    }
}

#[test]
fn driver_minimizes_ellipsoid() {
    let config = CmaEsConfig::builder().mean_vector(vec![1.0; 5]).sigma(0.5).build();
    let mut rng = StdRng::seed_from_u64(3);
    let mut species = CmaEsSpecies::new(&config, Bounds::unbounded(5), &mut rng).unwrap();

    let ellipsoid = |x: &[f64]| -> f64 {
        x.iter()
            .enumerate()
            .map(|(i, v)| 10f64.powf(3.0 * i as f64 / 4.0) * v * v)
            .sum()
    };
    let summary = Driver::new(400).run(&mut species, &mut rng, ellipsoid).unwrap();
    let best = summary.best.unwrap();
    assert!(best.fitness.unwrap() < 1e-6, "best fitness {:?}", best.fitness);
    assert!(summary.termination.is_none());
}

#[test]
fn alternative_termination_stops_a_degenerate_problem() {
    // Only the first coordinate matters, so the other axes grow without bound
    // relative to it.
    let config = CmaEsConfig::builder()
        .mean_vector(vec![1.0, 1.0, 1.0])
        .alternative_termination(true)
        .build();
    let mut rng = StdRng::seed_from_u64(12);
    let mut species = CmaEsSpecies::new(&config, Bounds::unbounded(3), &mut rng).unwrap();

    let summary = Driver::new(5_000)
        .run(&mut species, &mut rng, |x| x[0] * x[0])
        .unwrap();
    let reason = summary.termination.expect("run should end on ill-conditioning");
    assert!(summary.generations < 5_000);
    assert!(matches!(reason, TerminationReason::IllConditioned { axis_ratio } if axis_ratio > 1e7));
}

#[test]
fn snapshots_are_independent() {
    let config = CmaEsConfig::builder().mean(MeanInit::Zero).build();
    let mut rng = StdRng::seed_from_u64(5);
    let mut species = CmaEsSpecies::new(&config, Bounds::unbounded(2), &mut rng).unwrap();
    let snapshot = species.state().clone();

    Driver::new(3)
        .run(&mut species, &mut rng, |x| sphere(x) + 1.0)
        .unwrap();
    assert_ne!(species.state(), &snapshot);
    assert_eq!(snapshot.last_eigen_generation(), None);
}
