//! Observer API server for the nucleation-and-growth simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Simulation endpoint** (`/api/simulate`) that runs a fresh
//!   simulation from the base configuration plus query overrides and
//!   returns its snapshot sequence
//! - **REST endpoints** for querying the latest run (summary, snapshot
//!   list, single snapshot)
//! - **`WebSocket` endpoint** (`/ws/steps`) streaming run-tagged step and
//!   run-end frames of every run as it happens via
//!   [`tokio::sync::broadcast`]
//! - **Minimal HTML status page** (`GET /`) showing the latest run and
//!   links to the API endpoints
//!
//! # Architecture
//!
//! Simulations are CPU-bound and synchronous, so every run executes on
//! the blocking thread pool ([`tokio::task::spawn_blocking`]). The
//! finished run is stored in [`AppState`] behind a read-write lock; REST
//! reads never wait on a simulation in progress.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::{AppState, RunFrame, RunSummary, StepBroadcaster, StoredRun};
