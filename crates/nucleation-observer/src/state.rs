//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the base simulation configuration that
//! `/api/simulate` starts from, the broadcast channel for run frames,
//! and the most recent completed run that the REST endpoints serve.
//!
//! Several runs may publish into the channel at once, so every frame
//! carries the id of the run it belongs to. The id is assigned when the
//! run starts and reused for its [`RunSummary`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nucleation_core::{SimulationConfig, SimulationRun, SimulationState, StepControl, StepObserver};
use nucleation_types::{GrowthPolicy, RunEnd, Snapshot, StepReport};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

/// Capacity of the broadcast channel for run frames.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// One message on the `/ws/steps` stream.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFrame {
    /// A step of run `run_id` completed.
    Step {
        /// Run the step belongs to.
        run_id: Uuid,
        /// The step's diagnostics.
        report: StepReport,
    },
    /// Run `run_id` is over; no further frames carry its id.
    End {
        /// Run that ended.
        run_id: Uuid,
        /// Why it ended.
        end: RunEnd,
        /// Steps executed.
        total_steps: u64,
        /// Simulated time of the final state.
        final_time: f64,
    },
}

impl RunFrame {
    /// Id of the run this frame belongs to.
    pub const fn run_id(&self) -> Uuid {
        match *self {
            Self::Step { run_id, .. } | Self::End { run_id, .. } => run_id,
        }
    }
}

/// Summary of a completed run, served by `GET /api/run`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    /// Unique, time-ordered run identifier.
    pub run_id: Uuid,
    /// Seed the run used.
    pub seed: u64,
    /// Growth policy the run used.
    pub growth_policy: GrowthPolicy,
    /// Why the run ended.
    pub end: RunEnd,
    /// Simulated time of the final state.
    pub final_time: f64,
    /// Steps executed.
    pub total_steps: u64,
    /// Final population size.
    pub sphere_count: u64,
    /// Free fraction of the last coverage estimate.
    pub final_free_fraction: Option<f64>,
    /// Number of recorded snapshots.
    pub snapshot_count: usize,
    /// Wall-clock completion time.
    pub completed_at: DateTime<Utc>,
}

impl RunSummary {
    /// Summarize run `run_id`, which was produced from `config`.
    pub fn new(run_id: Uuid, run: &SimulationRun, config: &SimulationConfig) -> Self {
        Self {
            run_id,
            seed: config.random_seed,
            growth_policy: config.growth_policy,
            end: run.end,
            final_time: run.final_time,
            total_steps: run.total_steps,
            sphere_count: run.sphere_count,
            final_free_fraction: run.final_coverage.map(|c| c.free_fraction()),
            snapshot_count: run.snapshots.len(),
            completed_at: Utc::now(),
        }
    }
}

/// A completed run held in memory.
#[derive(Debug, Clone)]
pub struct StoredRun {
    /// Run metadata.
    pub summary: RunSummary,
    /// Full snapshot sequence.
    pub snapshots: Vec<Snapshot>,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast sender for run frames.
    pub tx: broadcast::Sender<RunFrame>,
    /// Configuration that query overrides are applied on top of.
    pub base_config: SimulationConfig,
    /// The most recent completed run.
    pub latest: Arc<RwLock<Option<StoredRun>>>,
}

impl AppState {
    /// Create application state with no completed run.
    pub fn new(base_config: SimulationConfig) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            base_config,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Subscribe to the run frame channel.
    pub fn subscribe(&self) -> broadcast::Receiver<RunFrame> {
        self.tx.subscribe()
    }

    /// Assign a fresh run id and return the observer that publishes the
    /// run's frames under it.
    pub fn begin_run(&self) -> StepBroadcaster {
        StepBroadcaster {
            tx: self.tx.clone(),
            run_id: Uuid::now_v7(),
        }
    }

    /// Replace the latest run, returning its summary.
    pub async fn store_run(
        &self,
        run_id: Uuid,
        run: SimulationRun,
        config: &SimulationConfig,
    ) -> RunSummary {
        let summary = RunSummary::new(run_id, &run, config);
        *self.latest.write().await = Some(StoredRun {
            summary: summary.clone(),
            snapshots: run.snapshots,
        });
        summary
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

/// [`StepObserver`] that publishes one run's step reports as
/// [`RunFrame`]s. Never aborts the run.
#[derive(Debug, Clone)]
pub struct StepBroadcaster {
    tx: broadcast::Sender<RunFrame>,
    run_id: Uuid,
}

impl StepBroadcaster {
    /// Id stamped on every frame.
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Publish the run-end frame.
    pub fn finish(&self, run: &SimulationRun) {
        let frame = RunFrame::End {
            run_id: self.run_id,
            end: run.end,
            total_steps: run.total_steps,
            final_time: run.final_time,
        };
        let receivers = self.send(frame);
        debug!(run_id = %self.run_id, receivers, "Run end broadcast");
    }

    /// Send returns Err only when there are zero receivers.
    fn send(&self, frame: RunFrame) -> usize {
        self.tx.send(frame).unwrap_or(0)
    }
}

impl StepObserver for StepBroadcaster {
    fn on_step(&mut self, report: &StepReport, _state: &SimulationState) -> StepControl {
        let receivers = self.send(RunFrame::Step {
            run_id: self.run_id,
            report: *report,
        });
        debug!(run_id = %self.run_id, step = report.step, receivers, "Step report broadcast");
        StepControl::Continue
    }
}
