//! Step callback used by the engine's batch run.
//!
//! Logs progress at a fixed step interval and, when the observer is
//! enabled, forwards every step report to connected `WebSocket` clients
//! followed by the run-end frame.

use nucleation_core::{SimulationRun, SimulationState, StepControl, StepObserver};
use nucleation_observer::StepBroadcaster;
use nucleation_types::StepReport;
use tracing::info;

/// Steps between progress log lines.
const PROGRESS_INTERVAL: u64 = 50;

/// Callback that bridges the step loop to logging and the Observer API.
pub struct EngineCallback {
    broadcaster: Option<StepBroadcaster>,
    interval: u64,
}

impl EngineCallback {
    /// Create a callback that only logs progress.
    pub const fn new() -> Self {
        Self {
            broadcaster: None,
            interval: PROGRESS_INTERVAL,
        }
    }

    /// Also publish each step report through `broadcaster`.
    pub fn with_broadcaster(mut self, broadcaster: StepBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Publish the run-end frame, if broadcasting.
    pub fn finish(&self, run: &SimulationRun) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.finish(run);
        }
    }
}

impl Default for EngineCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl StepObserver for EngineCallback {
    fn on_step(&mut self, report: &StepReport, state: &SimulationState) -> StepControl {
        if let Some(broadcaster) = self.broadcaster.as_mut() {
            broadcaster.on_step(report, state);
        }

        if report.step.checked_rem(self.interval) == Some(0) {
            info!(
                step = report.step,
                time = report.time,
                free_fraction = report.free_fraction,
                spheres = report.sphere_count,
                "Simulation progress"
            );
        }

        StepControl::Continue
    }
}
