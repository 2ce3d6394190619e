//! Engine binary for the nucleation-and-growth simulation.
//!
//! Loads configuration, runs one simulation to termination, and writes
//! the snapshot sequence as JSON. With the observer enabled it also
//! streams step reports over `WebSocket` while the run is in progress
//! and keeps serving the finished run until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `NUCLEATION_CONFIG`, else
//!    `nucleation-config.yaml`, else defaults
//! 2. Initialize structured logging (tracing)
//! 3. Start the Observer API server (if enabled)
//! 4. Run the simulation on the blocking thread pool
//! 5. Write the snapshot file
//! 6. Log the result, then serve until `Ctrl-C` (if the observer runs)

mod error;
mod observer_callback;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nucleation_core::config::{LoggingConfig, OutputConfig};
use nucleation_core::{
    NucleationConfig, SimulationRun, SimulationState, log_simulation_end, run_with_observer,
};
use nucleation_observer::{AppState, ServerConfig};
use nucleation_types::Snapshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_callback::EngineCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "nucleation-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the simulation, the output file, or
/// the observer server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);

    info!("nucleation-engine starting");
    let sim = &config.simulation;
    info!(
        source = %config_source,
        seed = sim.random_seed,
        policy = ?sim.growth_policy,
        domain = ?sim.domain_shape,
        domain_size = sim.domain_size,
        growth_speed = sim.growth_speed,
        base_intensity = sim.base_intensity,
        time_step = sim.time_step,
        max_time = sim.max_time,
        output = config.output.path,
        "Configuration loaded"
    );

    // 3. Start Observer API server.
    let app_state = Arc::new(AppState::new(config.simulation.clone()));
    let observer_handle = if config.observer.enabled {
        let server = ServerConfig::from(&config.observer);
        let handle = nucleation_observer::spawn_observer(server, Arc::clone(&app_state))
            .map_err(|e| EngineError::Observer {
                message: format!("{e}"),
            })?;
        Some(handle)
    } else {
        None
    };

    // 4. Run the simulation.
    let broadcaster = observer_handle.as_ref().map(|_| app_state.begin_run());
    let mut callback = EngineCallback::new();
    if let Some(broadcaster) = &broadcaster {
        callback = callback.with_broadcaster(broadcaster.clone());
    }
    let sim_config = config.simulation.clone();
    let run = tokio::task::spawn_blocking(move || -> Result<SimulationRun, EngineError> {
        let mut state = SimulationState::new(sim_config)?;
        let run = run_with_observer(&mut state, &mut callback)?;
        callback.finish(&run);
        Ok(run)
    })
    .await
    .map_err(|e| EngineError::Task {
        message: format!("{e}"),
    })??;

    // 5. Write the snapshot file.
    write_snapshots(&config.output, &run.snapshots)?;
    info!(
        path = config.output.path,
        snapshots = run.snapshots.len(),
        "Snapshots written"
    );

    // 6. Log results.
    log_simulation_end(&run);

    if let (Some(handle), Some(broadcaster)) = (observer_handle, broadcaster) {
        let summary = app_state
            .store_run(broadcaster.run_id(), run, &config.simulation)
            .await;
        info!(
            run_id = %summary.run_id,
            host = config.observer.host,
            port = config.observer.port,
            "Serving results, press Ctrl-C to stop"
        );
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| EngineError::Observer {
                message: format!("failed to listen for Ctrl-C: {e}"),
            })?;
        handle.abort();
    }

    info!("nucleation-engine shutdown complete");

    Ok(())
}

/// Load the configuration file.
///
/// `NUCLEATION_CONFIG` names the file when set; otherwise
/// `nucleation-config.yaml` in the working directory is used if it exists.
/// Without a file, defaults plus environment overrides apply. Returns the
/// configuration and a description of where it came from.
fn load_config() -> Result<(NucleationConfig, String), EngineError> {
    let explicit = std::env::var("NUCLEATION_CONFIG").ok().map(PathBuf::from);
    let default_path = Path::new(DEFAULT_CONFIG_PATH);

    match explicit {
        Some(path) => {
            let config = NucleationConfig::from_file(&path)?;
            Ok((config, path.display().to_string()))
        }
        None if default_path.exists() => {
            let config = NucleationConfig::from_file(default_path)?;
            Ok((config, String::from(DEFAULT_CONFIG_PATH)))
        }
        None => {
            let mut config = NucleationConfig::default();
            config.apply_env_overrides()?;
            Ok((config, String::from("defaults")))
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Write the snapshot sequence as a JSON array.
fn write_snapshots(output: &OutputConfig, snapshots: &[Snapshot]) -> Result<(), EngineError> {
    let io_error = |source: std::io::Error| EngineError::Output {
        path: output.path.clone(),
        source,
    };

    let file = File::create(&output.path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    if output.pretty {
        serde_json::to_writer_pretty(&mut writer, snapshots)?;
    } else {
        serde_json::to_writer(&mut writer, snapshots)?;
    }
    writer.flush().map_err(io_error)?;
    Ok(())
}
