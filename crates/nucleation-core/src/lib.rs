//! Nucleation-and-growth simulation core.
//!
//! Spheres nucleate at random times and places inside a bounded domain at a
//! rate of `λ0 · exp(α t)` per unit free volume, then grow at a fixed radial
//! speed. Under the constrained policy a sphere freezes as soon as further
//! growth would overlap a neighbour or leave the domain.
//!
//! Each step of the [`clock`] runs three stages against one
//! [`SimulationState`]:
//!
//! 1. **Coverage** -- Monte Carlo estimate of the free-volume fraction.
//! 2. **Nucleation** -- Poisson draw of new nuclei, rejection-sampled into
//!    free space.
//! 3. **Growth** -- advance radii, blocking spheres under the constrained
//!    policy.
//!
//! A run is deterministic given its configuration and random seed.
//!
//! # Modules
//!
//! - [`clock`] -- Step state machine and termination reasons.
//! - [`config`] -- Configuration loading from `nucleation-config.yaml` into
//!   strongly-typed structs, with validation.
//! - [`coverage`] -- Free-volume fraction estimator.
//! - [`domain`] -- Cube and ball domains, sampling and boundary checks.
//! - [`growth`] -- Radius law and the growth pass for both policies.
//! - [`nucleation`] -- Expected-count model and candidate placement.
//! - [`random`] -- Seedable uniform and Poisson sampler.
//! - [`runner`] -- Batch and streaming drivers around the clock.
//! - [`snapshot`] -- Stride-based snapshot recording.
//! - [`spatial`] -- [`SpatialIndex`] trait with linear and grid strategies.
//! - [`sphere`] -- The [`Sphere`] record.
//! - [`state`] -- The single mutable [`SimulationState`] aggregate.
//!
//! [`SimulationState`]: state::SimulationState
//! [`SpatialIndex`]: spatial::SpatialIndex
//! [`Sphere`]: sphere::Sphere

pub mod clock;
pub mod config;
pub mod coverage;
pub mod domain;
pub mod growth;
pub mod nucleation;
pub mod random;
pub mod runner;
pub mod snapshot;
pub mod spatial;
pub mod sphere;
pub mod state;

mod numeric;

// Re-export primary types at crate root.
pub use clock::{ClockError, SimulationClock, StepOutcome};
pub use config::{ConfigError, NucleationConfig, SimulationConfig};
pub use runner::{
    NoOpObserver, RunnerError, SimulationRun, StepControl, StepObserver, log_simulation_end,
    run_simulation, run_with_observer,
};
pub use snapshot::SnapshotRecorder;
pub use state::SimulationState;
