//! Chat endpoint: one engine turn, streamed or buffered.

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::api::ChatRequest;
use crate::server::AppState;
use crate::turn::{EventStream, drain_buffered};

/// `POST /chat`
///
/// With `stream: false` the handler waits for the turn and returns the
/// full result as JSON. With `stream: true` it answers with SSE: the
/// typed event sequence ending in exactly one `complete` or `error`
/// frame, with `heartbeat` frames injected while the engine is quiet.
/// Either way the turn, once admitted, runs to completion even if the
/// client goes away.
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let stream = request.stream;
    let (session_id, rx) = match state.turns.start_turn(request).await {
        Ok(started) => started,
        Err(e) => return e.into_response(),
    };
    debug!(session_id = %session_id, stream, "Turn admitted");

    if stream {
        let events = EventStream::new(rx, Duration::from_secs(state.heartbeat_interval_seconds));
        Sse::new(events).into_response()
    } else {
        match drain_buffered(rx).await {
            Ok(result) => Json(result).into_response(),
            Err(e) => e.into_response(),
        }
    }
}
