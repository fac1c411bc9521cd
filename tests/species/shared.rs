use std::thread;

use cmaes_species::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn workers_sample_while_main_thread_updates() {
    let config = CmaEsConfig::builder()
        .mean(MeanInit::Center)
        .sigma(0.5)
        .build();
    let bounds = Bounds::uniform(3, -2.0, 2.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let shared = SharedSpecies::new(CmaEsSpecies::new(&config, bounds, &mut rng).unwrap());
    let lambda = shared.read().params().lambda();

    for generation in 0..30_u64 {
        let handles: Vec<_> = (0..lambda)
            .map(|slot| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(generation * 1_000 + slot as u64);
                    let x = shared.sample(&mut rng).unwrap();
                    let f: f64 = x.iter().map(|v| (v - 1.0).powi(2)).sum();
                    Candidate::evaluated(x, f)
                })
            })
            .collect();
        let population: Vec<Candidate> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        shared.update(generation, &population).unwrap();
    }

    let snapshot = shared.snapshot();
    let distance: f64 = snapshot.mean().iter().map(|v| (v - 1.0).powi(2)).sum();
    assert!(distance < 0.1, "mean still {distance} away from the optimum");
    assert_eq!(
        shared.read().stats().draws(),
        30 * lambda as u64
    );

    let species = shared.try_unwrap().unwrap();
    assert_eq!(species.state(), &snapshot);
}

#[test]
fn try_unwrap_fails_while_shared() {
    let config = CmaEsConfig::builder().mean(MeanInit::Zero).build();
    let mut rng = StdRng::seed_from_u64(0);
    let shared: SharedSpecies = CmaEsSpecies::new(&config, Bounds::unbounded(1), &mut rng)
        .unwrap()
        .into();
    let other = shared.clone();
    let shared = shared.try_unwrap().unwrap_err();
    drop(other);
    assert!(shared.try_unwrap().is_ok());
}
