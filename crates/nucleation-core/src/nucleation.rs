//! Nucleus count model and candidate placement.
//!
//! The nucleation intensity is `λ(t) = λ0 · exp(α t)` per unit free volume
//! per unit time. Each step expects
//!
//! ```text
//! E[n] = λ(t) · f · V · dt
//! ```
//!
//! new nuclei, where `f` is the estimated free fraction and `V` the domain
//! volume. The actual count is drawn from the configured [`CountModel`].
//! Each drawn nucleus gets up to `max_attempts_per_candidate` uniform
//! positions; the first one outside every existing sphere is accepted. With
//! a single attempt this is plain thinning of a uniform process by the
//! covered fraction.

use nucleation_types::{CountModel, SphereId};
use tracing::{debug, warn};

use crate::config::SimulationConfig;
use crate::random::RandomSource;
use crate::state::SimulationState;

/// What one nucleation pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NucleationOutcome {
    /// Expected nucleus count for the step.
    pub expected: f64,
    /// Count drawn from the count model.
    pub requested: u64,
    /// Ids of the spheres created, in creation order.
    pub accepted: Vec<SphereId>,
    /// Drawn nuclei that were dropped.
    pub rejected: u64,
}

/// Turns the intensity function into new spheres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NucleationScheduler {
    base_intensity: f64,
    growth_exponent: f64,
    time_step: f64,
    count_model: CountModel,
    max_attempts: u32,
    max_spheres: Option<u64>,
}

impl NucleationScheduler {
    /// Build the scheduler described by a simulation config.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self {
            base_intensity: config.base_intensity,
            growth_exponent: config.growth_exponent,
            time_step: config.time_step,
            count_model: config.count_model,
            max_attempts: config.max_attempts_per_candidate,
            max_spheres: config.max_spheres,
        }
    }

    /// Nucleation intensity `λ0 · exp(α t)` at `time`.
    pub fn intensity(&self, time: f64) -> f64 {
        self.base_intensity * (self.growth_exponent * time).exp()
    }

    /// Expected nucleus count for one step starting at `time`.
    pub fn expected_count(&self, time: f64, free_fraction: f64, volume: f64) -> f64 {
        self.intensity(time) * free_fraction * volume * self.time_step
    }

    /// Draw the step's nucleus count.
    pub fn draw_count(&self, rng: &mut RandomSource, expected: f64) -> u64 {
        match self.count_model {
            CountModel::Poisson => rng.poisson(expected),
            CountModel::StochasticRounding => rng.stochastic_round(expected),
        }
    }

    /// Nucleate new spheres at the state's current time.
    ///
    /// Accepted spheres are inserted immediately with radius 0, so later
    /// candidates of the same step see them.
    pub fn nucleate(&self, state: &mut SimulationState, free_fraction: f64) -> NucleationOutcome {
        let time = state.time();
        let domain = state.domain;
        let expected = self.expected_count(time, free_fraction, domain.volume());
        let requested = self.draw_count(&mut state.rng, expected);

        let mut outcome = NucleationOutcome {
            expected,
            requested,
            ..NucleationOutcome::default()
        };
        let mut exhausted: u64 = 0;
        let mut capped: u64 = 0;

        for _ in 0..requested {
            if self
                .max_spheres
                .is_some_and(|cap| state.sphere_count() >= cap)
            {
                capped = capped.saturating_add(1);
                continue;
            }

            let placed = (0..self.max_attempts)
                .map(|_| domain.sample(&mut state.rng))
                .find(|&point| !state.index.contains(point, time));

            match placed.and_then(|center| state.spawn(center, time)) {
                Some(id) => outcome.accepted.push(id),
                None if placed.is_some() => capped = capped.saturating_add(1),
                None => exhausted = exhausted.saturating_add(1),
            }
        }

        outcome.rejected = exhausted.saturating_add(capped);
        if exhausted > 0 {
            debug!(time, exhausted, "Candidates found no free position");
        }
        if capped > 0 {
            warn!(
                time,
                capped,
                max_spheres = self.max_spheres,
                "Sphere population cap reached, candidates dropped"
            );
        }
        outcome
    }
}
