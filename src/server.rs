//! Router and shared application state.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use tower_http::timeout::TimeoutLayer;

use crate::background::BackgroundTasks;
use crate::engine::Engine;
use crate::handlers;
use crate::session::SessionRegistry;
use crate::turn::TurnRunner;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub engine: Arc<dyn Engine>,
    pub turns: TurnRunner,
    /// Registry for background tasks awaited on shutdown.
    pub background: BackgroundTasks,
    pub default_model: String,
    pub heartbeat_interval_seconds: u64,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    // Chat turns stream for as long as the engine runs; they carry their
    // own heartbeats instead of a request timeout.
    let chat_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .with_state(state.clone());

    // Regular API routes - with request timeout
    let api_routes = Router::new()
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/sessions/{session_id}", delete(handlers::delete_session))
        .route("/sessions/{session_id}/files", get(handlers::get_files))
        .route(
            "/sessions/{session_id}/file_content",
            get(handlers::get_file_content),
        )
        .route("/add_file", post(handlers::add_file))
        .route("/models", get(handlers::list_models))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_seconds),
        ));

    Router::new().merge(chat_routes).merge(api_routes)
}
