//! Error taxonomy for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::engine::EngineError;
use crate::handlers::problem_details;

/// Failures a request can surface to the client.
///
/// Every variant maps to a stable machine-readable `kind` plus an HTTP
/// status, rendered as an RFC 7807 problem-details body. Transport
/// failures (client gone mid-stream) are never rendered; they only reach
/// the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {0} already has a turn in flight")]
    SessionBusy(String),

    #[error("session limit of {0} reached")]
    CapacityExceeded(usize),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("turn timed out: {0}")]
    Timeout(String),

    #[error("client transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// Stable identifier clients can branch on.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::SessionNotFound(_) => "session_not_found",
            ApiError::SessionBusy(_) => "session_busy",
            ApiError::CapacityExceeded(_) => "capacity_exceeded",
            ApiError::Validation(_) => "validation_error",
            ApiError::Engine(_) => "engine_error",
            ApiError::Timeout(_) => "timeout",
            ApiError::Transport(_) => "transport_error",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SessionBusy(_) => StatusCode::CONFLICT,
            ApiError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        problem_details::respond(self.status(), self.kind(), self.to_string())
    }
}
