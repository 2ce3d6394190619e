//! `WebSocket` stream of run frames.
//!
//! `GET /ws/steps` sends one JSON [`RunFrame`] per text message: a `step`
//! frame for every completed step and an `end` frame when a run finishes.
//! Runs started concurrently interleave on the same stream; clients tell
//! them apart by `run_id`, or pass `?run_id=<uuid>` to receive a single
//! run's frames only.
//!
//! A client that falls behind the broadcast buffer loses the frames it
//! missed and continues with the oldest one still buffered.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::{AppState, RunFrame};

/// Query parameters for `GET /ws/steps`.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct StreamFilter {
    /// Forward only frames of this run.
    pub run_id: Option<Uuid>,
}

impl StreamFilter {
    /// Whether `frame` passes the filter.
    pub fn admits(&self, frame: &RunFrame) -> bool {
        self.run_id.is_none_or(|id| id == frame.run_id())
    }
}

/// Upgrade to a `WebSocket` and stream run frames.
///
/// # Route
///
/// `GET /ws/steps`
pub async fn ws_steps(
    ws: WebSocketUpgrade,
    Query(filter): Query<StreamFilter>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_frames(socket, state, filter))
}

/// What the stream loop does after one event.
enum Flow {
    Continue,
    Stop,
}

async fn stream_frames(mut socket: WebSocket, state: Arc<AppState>, filter: StreamFilter) {
    let mut rx = state.subscribe();
    debug!(run_id = ?filter.run_id, "Frame stream opened");

    loop {
        let flow = tokio::select! {
            frame = rx.recv() => forward(&mut socket, frame, &filter).await,
            incoming = socket.recv() => reply(&mut socket, incoming).await,
        };
        if matches!(flow, Flow::Stop) {
            break;
        }
    }

    debug!(run_id = ?filter.run_id, "Frame stream closed");
}

/// Send one received frame to the client if the filter admits it.
async fn forward(
    socket: &mut WebSocket,
    frame: Result<RunFrame, RecvError>,
    filter: &StreamFilter,
) -> Flow {
    let frame = match frame {
        Ok(frame) => frame,
        Err(RecvError::Lagged(missed)) => {
            warn!(missed, "Frame stream lagged");
            return Flow::Continue;
        }
        Err(RecvError::Closed) => return Flow::Stop,
    };
    if !filter.admits(&frame) {
        return Flow::Continue;
    }
    let Ok(text) = serde_json::to_string(&frame) else {
        warn!(run_id = %frame.run_id(), "Dropping unencodable frame");
        return Flow::Continue;
    };
    if socket.send(Message::Text(text.into())).await.is_ok() {
        Flow::Continue
    } else {
        Flow::Stop
    }
}

/// Handle a message from the client. Only pings get an answer.
async fn reply(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, axum::Error>>,
) -> Flow {
    match incoming {
        Some(Ok(Message::Ping(payload))) => {
            if socket.send(Message::Pong(payload)).await.is_ok() {
                Flow::Continue
            } else {
                Flow::Stop
            }
        }
        Some(Ok(Message::Close(_)) | Err(_)) | None => Flow::Stop,
        Some(Ok(_)) => Flow::Continue,
    }
}
