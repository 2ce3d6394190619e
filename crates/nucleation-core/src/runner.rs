//! Batch and streaming drivers around the clock.
//!
//! This module provides two entry points:
//!
//! - [`run_simulation`] -- build the state from a config, run to
//!   termination, and return every recorded snapshot.
//! - [`run_with_observer`] -- run an existing state, handing each step
//!   report and snapshot to a [`StepObserver`] as it happens. The observer
//!   may abort the run between steps.
//!
//! Both finish with a terminal snapshot, so the last element of
//! [`SimulationRun::snapshots`] always describes the final state.

use nucleation_types::{RunEnd, Snapshot, StepReport};
use tracing::info;

use crate::clock::{ClockError, SimulationClock, StepOutcome};
use crate::config::{ConfigError, SimulationConfig};
use crate::coverage::CoverageEstimate;
use crate::snapshot::SnapshotRecorder;
use crate::state::SimulationState;

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A step failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Observer decision after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
    /// Keep stepping.
    Continue,
    /// Stop before the next step.
    Abort,
}

/// Receives progress from [`run_with_observer`].
pub trait StepObserver: Send {
    /// Called after each completed step.
    fn on_step(&mut self, report: &StepReport, state: &SimulationState) -> StepControl;

    /// Called for each recorded snapshot, in recording order.
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}
}

/// Observer that never aborts and ignores snapshots.
pub struct NoOpObserver;

impl StepObserver for NoOpObserver {
    fn on_step(&mut self, _report: &StepReport, _state: &SimulationState) -> StepControl {
        StepControl::Continue
    }
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    /// Why the run ended.
    pub end: RunEnd,
    /// Simulated time of the final state.
    pub final_time: f64,
    /// Steps executed.
    pub total_steps: u64,
    /// Final population size.
    pub sphere_count: u64,
    /// Coverage estimate of the last evaluated step. For a terminated run
    /// this is the estimate taken at `final_time` that ended it.
    pub final_coverage: Option<CoverageEstimate>,
    /// Recorded snapshots, oldest first, ending with the final state.
    pub snapshots: Vec<Snapshot>,
}

/// Validate `config`, run it to termination, and return the snapshots.
///
/// # Errors
///
/// Returns [`RunnerError::Config`] for an invalid configuration and
/// [`RunnerError::Clock`] if a step fails.
pub fn run_simulation(config: SimulationConfig) -> Result<SimulationRun, RunnerError> {
    let mut state = SimulationState::new(config)?;
    run_with_observer(&mut state, &mut NoOpObserver)
}

/// Run `state` until the clock terminates or `observer` aborts.
///
/// Snapshots follow the configured stride, starting with the state as it
/// is handed in.
///
/// # Errors
///
/// Returns [`RunnerError::Clock`] if a step fails.
pub fn run_with_observer(
    state: &mut SimulationState,
    observer: &mut dyn StepObserver,
) -> Result<SimulationRun, RunnerError> {
    let config = state.config();
    info!(
        seed = config.random_seed,
        policy = ?config.growth_policy,
        domain = ?config.domain_shape,
        index = ?config.spatial_index,
        max_time = config.max_time,
        time_step = config.time_step,
        initial_spheres = state.sphere_count(),
        "Simulation starting"
    );

    let mut clock = SimulationClock::new(config);
    let mut recorder = SnapshotRecorder::from_config(config);
    let mut total_steps: u64 = 0;

    if let Some(snapshot) = recorder.observe(state) {
        observer.on_snapshot(snapshot);
    }

    let end = loop {
        let report = match clock.step(state)? {
            StepOutcome::Terminated(reason) => break RunEnd::Terminated(reason),
            StepOutcome::Advanced(report) => report,
        };
        total_steps = total_steps.saturating_add(1);

        if let Some(snapshot) = recorder.observe(state) {
            observer.on_snapshot(snapshot);
        }

        if observer.on_step(&report, state) == StepControl::Abort {
            info!(step = report.step, "Observer aborted the run");
            break RunEnd::Aborted;
        }
    };

    if let Some(snapshot) = recorder.finish(state) {
        observer.on_snapshot(snapshot);
    }

    Ok(SimulationRun {
        end,
        final_time: state.time(),
        total_steps,
        sphere_count: state.sphere_count(),
        final_coverage: clock.last_estimate(),
        snapshots: recorder.into_snapshots(),
    })
}

/// Log the end-of-run summary.
pub fn log_simulation_end(run: &SimulationRun) {
    info!(
        end = ?run.end,
        final_time = run.final_time,
        total_steps = run.total_steps,
        sphere_count = run.sphere_count,
        final_free_fraction = run.final_coverage.map(|c| c.free_fraction()),
        snapshots = run.snapshots.len(),
        final_max_radius = run.snapshots.last().map(Snapshot::max_radius),
        "Simulation ended"
    );
}
