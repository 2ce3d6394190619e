//! REST API endpoint handlers for the Observer server.
//!
//! `/api/simulate` runs a new simulation; every other endpoint reads the
//! latest completed run from the shared [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/simulate` | Run a simulation, return its snapshots |
//! | `GET` | `/api/run` | Summary of the latest run |
//! | `GET` | `/api/snapshots` | Snapshot sequence of the latest run |
//! | `GET` | `/api/snapshots/:index` | One snapshot of the latest run |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use nucleation_core::{
    RunnerError, SimulationConfig, SimulationRun, SimulationState, log_simulation_end,
    run_with_observer,
};
use nucleation_types::GrowthPolicy;
use tracing::info;

use crate::error::ObserverError;
use crate::state::{AppState, RunSummary};

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/simulate` endpoint.
///
/// Each present parameter overrides the matching field of the server's
/// base configuration.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SimulateQuery {
    /// Random seed.
    pub seed: Option<u64>,
    /// `unconstrained` or `constrained`.
    pub growth_policy: Option<GrowthPolicy>,
    /// Simulated time limit.
    pub max_time: Option<f64>,
    /// Base nucleation intensity.
    pub base_intensity: Option<f64>,
    /// Radial growth speed.
    pub growth_speed: Option<f64>,
    /// Record a snapshot every this many steps.
    pub snapshot_stride: Option<u64>,
}

impl SimulateQuery {
    /// Apply the present overrides to `config`.
    pub fn apply(&self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
        if let Some(policy) = self.growth_policy {
            config.growth_policy = policy;
        }
        if let Some(max_time) = self.max_time {
            config.max_time = max_time;
        }
        if let Some(intensity) = self.base_intensity {
            config.base_intensity = intensity;
        }
        if let Some(speed) = self.growth_speed {
            config.growth_speed = speed;
        }
        if let Some(stride) = self.snapshot_stride {
            config.snapshot_stride = stride;
        }
        config
    }
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with the latest run summary and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest.read().await;
    let rows = latest
        .as_ref()
        .map_or_else(|| String::from("<tr><td colspan=\"2\">no run yet</td></tr>"), |run| {
            summary_rows(&run.summary)
        });
    drop(latest);

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Nucleation Observer</title>
<style>
body {{ font-family: monospace; max-width: 640px; margin: 2rem auto; }}
th {{ text-align: left; padding-right: 2rem; }}
</style>
</head>
<body>
<h1>Nucleation Observer</h1>
<h2>Latest run</h2>
<table>
{rows}
</table>
<h2>Endpoints</h2>
<ul>
<li><a href="/api/simulate">GET /api/simulate</a> ?seed, growth_policy, max_time, base_intensity, growth_speed, snapshot_stride</li>
<li><a href="/api/run">GET /api/run</a></li>
<li><a href="/api/snapshots">GET /api/snapshots</a></li>
<li><a href="/api/snapshots/0">GET /api/snapshots/{{index}}</a></li>
<li><code>/ws/steps</code> run frames, optional ?run_id</li>
</ul>
</body>
</html>"#
    ))
}

/// Table rows describing one run summary.
fn summary_rows(summary: &RunSummary) -> String {
    let free = summary
        .final_free_fraction
        .map_or_else(|| String::from("-"), |f| format!("{f:.4}"));
    [
        ("Run", summary.run_id.to_string()),
        ("Seed", summary.seed.to_string()),
        ("End", format!("{:?}", summary.end)),
        ("Steps", summary.total_steps.to_string()),
        ("Final time", format!("{:.2}", summary.final_time)),
        ("Spheres", summary.sphere_count.to_string()),
        ("Free fraction", free),
        ("Snapshots", summary.snapshot_count.to_string()),
    ]
    .iter()
    .map(|(label, value)| format!("<tr><th>{label}</th><td>{value}</td></tr>"))
    .collect::<Vec<_>>()
    .join("\n")
}

// ---------------------------------------------------------------------------
// GET /api/simulate -- run a simulation
// ---------------------------------------------------------------------------

/// Run a simulation from the base configuration plus query overrides and
/// return its snapshot sequence. The run becomes the latest run.
///
/// The run id is assigned before the run starts, so every frame the run
/// publishes on `/ws/steps` carries it, ending with its `end` frame.
///
/// # Query Parameters
///
/// - `seed`, `growth_policy`, `max_time`, `base_intensity`,
///   `growth_speed`, `snapshot_stride`: see [`SimulateQuery`].
pub async fn simulate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimulateQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let config = params.apply(state.base_config.clone());
    let run_config = config.clone();
    let mut broadcaster = state.begin_run();
    let run_id = broadcaster.run_id();

    let run = tokio::task::spawn_blocking(move || -> Result<SimulationRun, RunnerError> {
        let mut sim = SimulationState::new(run_config)?;
        let run = run_with_observer(&mut sim, &mut broadcaster)?;
        broadcaster.finish(&run);
        Ok(run)
    })
    .await
    .map_err(|e| ObserverError::Internal(format!("simulation task failed: {e}")))??;

    log_simulation_end(&run);
    let body = Json(run.snapshots.clone());
    let summary = state.store_run(run_id, run, &config).await;
    info!(run_id = %summary.run_id, seed = summary.seed, "Run stored");

    Ok(body)
}

// ---------------------------------------------------------------------------
// GET /api/run -- latest run summary
// ---------------------------------------------------------------------------

/// Return the summary of the latest run.
pub async fn get_run(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let latest = state.latest.read().await;
    let run = latest.as_ref().ok_or_else(no_run)?;
    Ok(Json(run.summary.clone()))
}

// ---------------------------------------------------------------------------
// GET /api/snapshots -- latest run snapshots
// ---------------------------------------------------------------------------

/// Return every snapshot of the latest run, oldest first.
pub async fn list_snapshots(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let latest = state.latest.read().await;
    let run = latest.as_ref().ok_or_else(no_run)?;
    Ok(Json(run.snapshots.clone()))
}

// ---------------------------------------------------------------------------
// GET /api/snapshots/:index -- single snapshot
// ---------------------------------------------------------------------------

/// Return one snapshot of the latest run by position.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(index_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let index = parse_index(&index_str)?;

    let latest = state.latest.read().await;
    let run = latest.as_ref().ok_or_else(no_run)?;
    let snapshot = run.snapshots.get(index).ok_or_else(|| {
        ObserverError::NotFound(format!(
            "snapshot {index} (latest run has {})",
            run.snapshots.len()
        ))
    })?;

    Ok(Json(snapshot.clone()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn no_run() -> ObserverError {
    ObserverError::NotFound(String::from("no simulation has run yet"))
}

/// Parse a snapshot position, returning an [`ObserverError`] on failure.
fn parse_index(s: &str) -> Result<usize, ObserverError> {
    s.parse::<usize>()
        .map_err(|e| ObserverError::InvalidQuery(format!("snapshot index {s:?}: {e}")))
}
