//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::api::HealthResponse;
use crate::server::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        active_sessions: state.registry.len(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
