//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/steps` -- `WebSocket` step report stream
/// - `GET /api/simulate` -- run a simulation and return its snapshots
/// - `GET /api/run` -- latest run summary
/// - `GET /api/snapshots` -- latest run snapshots
/// - `GET /api/snapshots/:index` -- single snapshot
///
/// CORS allows any origin so a visualizer served from elsewhere can
/// fetch snapshots.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/steps", get(ws::ws_steps))
        // REST API
        .route("/api/simulate", get(handlers::simulate))
        .route("/api/run", get(handlers::get_run))
        .route("/api/snapshots", get(handlers::list_snapshots))
        .route("/api/snapshots/{index}", get(handlers::get_snapshot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
