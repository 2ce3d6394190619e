//! End-to-end properties of complete simulation runs.
//!
//! Each test builds a configuration, drives it through the public runner
//! API, and checks a property of the resulting snapshot sequence.

#![allow(clippy::unwrap_used)]

use nucleation_core::domain::{Domain, distance};
use nucleation_core::{
    SimulationConfig, SimulationState, StepControl, StepObserver, run_simulation,
    run_with_observer,
};
use nucleation_types::{
    DomainShape, GrowthPolicy, IndexKind, RunEnd, Snapshot, StepReport, TerminationReason,
};

/// Collects the free fraction of every step.
#[derive(Default)]
struct FreeFractions(Vec<f64>);

impl StepObserver for FreeFractions {
    fn on_step(&mut self, report: &StepReport, _state: &SimulationState) -> StepControl {
        self.0.push(report.free_fraction);
        StepControl::Continue
    }
}

fn assert_no_overlap(snapshot: &Snapshot) {
    for (i, a) in snapshot.spheres.iter().enumerate() {
        for b in &snapshot.spheres[i + 1..] {
            let gap = distance(a.center, b.center) - a.radius - b.radius;
            assert!(
                gap >= -1e-9,
                "overlap of {gap} at t = {} between {a:?} and {b:?}",
                snapshot.time
            );
        }
    }
}

fn constrained_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        growth_policy: GrowthPolicy::Constrained,
        growth_speed: 0.02,
        base_intensity: 40.0,
        max_time: 6.0,
        monte_carlo_samples: 1000,
        random_seed: seed,
        ..SimulationConfig::default()
    }
}

#[test]
fn same_seed_gives_byte_identical_output() {
    let config = SimulationConfig {
        max_time: 5.0,
        monte_carlo_samples: 1000,
        ..SimulationConfig::default()
    };
    let a = run_simulation(config.clone()).unwrap();
    let b = run_simulation(config.clone()).unwrap();
    assert_eq!(
        serde_json::to_string(&a.snapshots).unwrap(),
        serde_json::to_string(&b.snapshots).unwrap()
    );

    let c = run_simulation(SimulationConfig {
        random_seed: 7,
        ..config
    })
    .unwrap();
    assert_ne!(
        serde_json::to_string(&a.snapshots).unwrap(),
        serde_json::to_string(&c.snapshots).unwrap()
    );
}

#[test]
fn index_strategy_does_not_change_the_result() {
    for policy in [GrowthPolicy::Unconstrained, GrowthPolicy::Constrained] {
        let config = SimulationConfig {
            growth_policy: policy,
            ..constrained_config(3)
        };
        let grid = run_simulation(SimulationConfig {
            spatial_index: IndexKind::Grid,
            ..config.clone()
        })
        .unwrap();
        let linear = run_simulation(SimulationConfig {
            spatial_index: IndexKind::Linear,
            ..config
        })
        .unwrap();
        assert_eq!(grid, linear, "strategies diverged under {policy:?}");
    }
}

#[test]
fn aggressive_nucleation_ends_on_low_free_volume() {
    let run = run_simulation(SimulationConfig {
        free_volume_threshold: 0.5,
        base_intensity: 10_000.0,
        growth_speed: 0.05,
        monte_carlo_samples: 1000,
        ..SimulationConfig::default()
    })
    .unwrap();

    assert_eq!(run.end, RunEnd::Terminated(TerminationReason::LowFreeVolume));
    assert!(run.final_time < 100.0);
    assert!(run.sphere_count > 0);
}

#[test]
fn zero_intensity_runs_to_the_time_limit_unchanged() {
    let nuclei = vec![[0.2, 0.3, 0.4], [0.7, 0.7, 0.1]];
    let run = run_simulation(SimulationConfig {
        base_intensity: 0.0,
        max_time: 10.0,
        monte_carlo_samples: 200,
        initial_nuclei: nuclei.clone(),
        ..SimulationConfig::default()
    })
    .unwrap();

    assert_eq!(run.end, RunEnd::Terminated(TerminationReason::TimeLimitReached));
    assert!((run.final_time - 10.0).abs() < 1e-9);
    assert_eq!(run.sphere_count, 2);
    for snapshot in &run.snapshots {
        let centers: Vec<[f64; 3]> = snapshot.spheres.iter().map(|s| s.center).collect();
        assert_eq!(centers, nuclei);
    }
}

#[test]
fn reference_scenario_reaches_near_complete_coverage() {
    let config = SimulationConfig::default();
    let threshold = config.free_volume_threshold;
    let run = run_simulation(config).unwrap();

    assert_eq!(run.end, RunEnd::Terminated(TerminationReason::LowFreeVolume));
    assert!(run.total_steps < 400, "took {} steps", run.total_steps);
    assert!(run.sphere_count > 100);

    // The terminal estimate saw at least 99.9% of its samples covered.
    let coverage = run.final_coverage.unwrap();
    assert_eq!(coverage.sample_count, 5000);
    assert!(
        coverage.free_fraction() < threshold,
        "{} of {} samples still free",
        coverage.free_samples,
        coverage.sample_count
    );

    // An independent, larger sample of the final snapshot agrees within the
    // estimator's resolution.
    let last = run.snapshots.last().unwrap();
    let domain = Domain::Cube { size: 1.0 };
    let mut rng = nucleation_core::random::RandomSource::from_seed(1234);
    let samples = 20_000;
    let free = (0..samples)
        .filter(|_| {
            let point = domain.sample(&mut rng);
            !last
                .spheres
                .iter()
                .any(|s| distance(point, s.center) < s.radius)
        })
        .count();
    assert!(free <= 60, "{free} of {samples} samples still free");
}

#[test]
fn every_low_free_volume_run_ends_below_the_threshold() {
    for seed in [1, 2, 3] {
        let config = SimulationConfig {
            random_seed: seed,
            free_volume_threshold: 0.05,
            monte_carlo_samples: 1000,
            ..SimulationConfig::default()
        };
        let run = run_simulation(config).unwrap();
        assert_eq!(run.end, RunEnd::Terminated(TerminationReason::LowFreeVolume));
        assert!(run.final_coverage.unwrap().free_fraction() < 0.05);
    }
}

#[test]
fn constrained_growth_never_overlaps() {
    for seed in [1, 2, 3] {
        let run = run_simulation(constrained_config(seed)).unwrap();
        assert!(run.sphere_count > 10);
        for snapshot in &run.snapshots {
            assert_no_overlap(snapshot);
        }
    }
}

#[test]
fn constrained_spheres_stay_inside_the_domain() {
    for shape in [DomainShape::Cube, DomainShape::Ball] {
        let config = SimulationConfig {
            domain_shape: shape,
            ..constrained_config(9)
        };
        let domain = Domain::from_config(&config);
        let run = run_simulation(config).unwrap();
        let last = run.snapshots.last().unwrap();
        assert_no_overlap(last);
        for sphere in &last.spheres {
            assert!(
                domain.encloses_sphere(sphere.center, sphere.radius - 1e-9),
                "{sphere:?} leaves the {shape:?}"
            );
        }
    }
}

#[test]
fn radii_never_shrink_and_never_go_negative() {
    for policy in [GrowthPolicy::Unconstrained, GrowthPolicy::Constrained] {
        let run = run_simulation(SimulationConfig {
            growth_policy: policy,
            ..constrained_config(5)
        })
        .unwrap();
        for pair in run.snapshots.windows(2) {
            let (before, after) = (&pair[0], &pair[1]);
            assert!(after.spheres.len() >= before.spheres.len());
            for (old, new) in before.spheres.iter().zip(&after.spheres) {
                assert_eq!(old.center, new.center);
                assert!(old.radius >= 0.0);
                assert!(new.radius >= old.radius);
            }
        }
    }
}

#[test]
fn free_fraction_falls_on_average() {
    let seeds = 5_u32;
    let mut totals: Vec<f64> = Vec::new();
    for seed in 0..seeds {
        let mut state = SimulationState::new(SimulationConfig {
            max_time: 8.0,
            monte_carlo_samples: 2000,
            random_seed: u64::from(seed),
            ..SimulationConfig::default()
        })
        .unwrap();
        let mut observer = FreeFractions::default();
        run_with_observer(&mut state, &mut observer).unwrap();

        if totals.is_empty() {
            totals = vec![0.0; observer.0.len()];
        }
        for (total, value) in totals.iter_mut().zip(&observer.0) {
            *total += value;
        }
    }
    let mean: Vec<f64> = totals.iter().map(|t| t / f64::from(seeds)).collect();

    for pair in mean.windows(2) {
        assert!(pair[1] <= pair[0] + 0.01, "mean free fraction rose: {pair:?}");
    }
    assert!(mean.last().unwrap() < mean.first().unwrap());
}

#[test]
fn max_spheres_caps_the_population() {
    let run = run_simulation(SimulationConfig {
        max_spheres: Some(25),
        max_time: 5.0,
        monte_carlo_samples: 500,
        ..SimulationConfig::default()
    })
    .unwrap();
    assert_eq!(run.sphere_count, 25);
}

#[test]
fn max_radius_caps_every_sphere() {
    let run = run_simulation(SimulationConfig {
        max_radius: Some(0.03),
        growth_speed: 0.05,
        max_time: 3.0,
        monte_carlo_samples: 500,
        ..SimulationConfig::default()
    })
    .unwrap();
    let last = run.snapshots.last().unwrap();
    assert!(last.max_radius() <= 0.03 + 1e-9);
    assert!(last.max_radius() > 0.03 - 1e-9);
}
