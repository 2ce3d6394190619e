//! Stride-based snapshot recording.
//!
//! The recorder captures the initial state, every `snapshot_stride`-th
//! step, and the terminal state. Each capture is a deep copy, so recorded
//! snapshots never change as the run continues.

use nucleation_types::Snapshot;

use crate::config::SimulationConfig;
use crate::state::SimulationState;

/// Accumulates snapshots over a run.
#[derive(Debug, Clone)]
pub struct SnapshotRecorder {
    stride: u64,
    snapshots: Vec<Snapshot>,
    last_step: Option<u64>,
}

impl SnapshotRecorder {
    /// Create a recorder capturing every `stride`-th step. A stride of 0 is
    /// treated as 1.
    pub fn new(stride: u64) -> Self {
        Self {
            stride: stride.max(1),
            snapshots: Vec::new(),
            last_step: None,
        }
    }

    /// Create a recorder with the configured stride.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.snapshot_stride)
    }

    /// Capture the state unconditionally and return a copy of the capture.
    pub fn record(&mut self, state: &SimulationState) -> Snapshot {
        let snapshot = state.snapshot();
        self.last_step = Some(state.step());
        self.snapshots.push(snapshot.clone());
        snapshot
    }

    /// Capture the state if its step falls on the stride and it has not
    /// been captured yet.
    pub fn observe(&mut self, state: &SimulationState) -> Option<&Snapshot> {
        let step = state.step();
        if step.checked_rem(self.stride) != Some(0) {
            return None;
        }
        self.capture_once(state)
    }

    /// Capture the terminal state unless it was already captured.
    pub fn finish(&mut self, state: &SimulationState) -> Option<&Snapshot> {
        self.capture_once(state)
    }

    fn capture_once(&mut self, state: &SimulationState) -> Option<&Snapshot> {
        if self.last_step == Some(state.step()) {
            return None;
        }
        self.last_step = Some(state.step());
        self.snapshots.push(state.snapshot());
        self.snapshots.last()
    }

    /// Snapshots recorded so far, oldest first.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Number of snapshots recorded.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consume the recorder, returning its snapshots.
    pub fn into_snapshots(self) -> Vec<Snapshot> {
        self.snapshots
    }
}
