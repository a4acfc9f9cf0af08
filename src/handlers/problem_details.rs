//! RFC 7807 problem-details responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    pub status: u16,
    pub title: String,
    pub kind: &'static str,
    pub detail: String,
}

/// Build a problem-details response with the proper content type.
pub fn respond(status: StatusCode, kind: &'static str, detail: impl Into<String>) -> Response {
    let body = ProblemDetails {
        status: status.as_u16(),
        title: status.canonical_reason().unwrap_or("Error").to_string(),
        kind,
        detail: detail.into(),
    };
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );
    response
}

pub fn not_found(detail: impl Into<String>) -> Response {
    respond(StatusCode::NOT_FOUND, "not_found", detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_carry_the_problem_content_type() {
        let response = respond(StatusCode::CONFLICT, "session_busy", "turn in flight");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
