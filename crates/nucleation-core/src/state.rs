//! The single mutable aggregate a run operates on.
//!
//! [`SimulationState`] owns the validated configuration, the domain, the
//! sphere population (inside the spatial index), the step counter, and the
//! random source. Every stage receives it by `&mut`; it is deliberately not
//! `Clone`, so no stage can fork the random stream or the population.

use nucleation_types::{Point3, Snapshot, SphereId};

use crate::config::{ConfigError, SimulationConfig};
use crate::domain::Domain;
use crate::numeric::count_to_f64;
use crate::random::RandomSource;
use crate::spatial::{SpatialIndex, build_index};
use crate::sphere::Sphere;

/// Complete mutable state of one simulation run.
#[derive(Debug)]
pub struct SimulationState {
    /// Validated configuration.
    pub(crate) config: SimulationConfig,
    /// Domain built from the configuration.
    pub(crate) domain: Domain,
    /// Sphere population.
    pub(crate) index: Box<dyn SpatialIndex>,
    /// The run's only source of randomness.
    pub(crate) rng: RandomSource,
    /// Completed steps. Current time is `step * dt`.
    pub(crate) step: u64,
    /// Id for the next sphere, `None` once ids are exhausted.
    next_id: Option<SphereId>,
}

impl SimulationState {
    /// Validate `config` and build the state at `t = 0`, seeding any
    /// configured initial nuclei.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let domain = Domain::from_config(&config);
        let index = build_index(config.spatial_index, &domain);
        let rng = RandomSource::from_seed(config.random_seed);
        let initial_nuclei = config.initial_nuclei.clone();

        let mut state = Self {
            config,
            domain,
            index,
            rng,
            step: 0,
            next_id: Some(SphereId::FIRST),
        };
        for center in initial_nuclei {
            state.spawn(center, 0.0);
        }
        Ok(state)
    }

    /// Completed steps.
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.time_at(self.step)
    }

    /// Simulated time at the start of `step`.
    pub fn time_at(&self, step: u64) -> f64 {
        count_to_f64(step) * self.config.time_step
    }

    /// The validated configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The simulation domain.
    pub const fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Read-only view of the spatial index.
    pub fn index(&self) -> &dyn SpatialIndex {
        &*self.index
    }

    /// All spheres in nucleation order.
    pub fn spheres(&self) -> &[Sphere] {
        self.index.spheres()
    }

    /// Population size.
    pub fn sphere_count(&self) -> u64 {
        u64::try_from(self.index.len()).unwrap_or(u64::MAX)
    }

    /// Deep copy of every sphere at the current time.
    pub fn snapshot(&self) -> Snapshot {
        let time = self.time();
        Snapshot {
            time,
            spheres: self
                .spheres()
                .iter()
                .map(|sphere| sphere.snapshot(time))
                .collect(),
        }
    }

    /// Insert a new sphere with the configured growth speed. Returns `None`
    /// once the id space is exhausted.
    pub(crate) fn spawn(&mut self, center: Point3, birth_time: f64) -> Option<SphereId> {
        let id = self.next_id?;
        self.index.insert(Sphere::new(
            id,
            center,
            birth_time,
            self.config.growth_speed,
        ));
        self.next_id = id.next();
        Some(id)
    }
}
