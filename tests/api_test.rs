//! Integration tests for the session management and utility endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use tower::ServiceExt;

use coderelay::engine::ScriptedEngine;
use coderelay::server;

mod common;
use common::{test_app, test_state};

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ============================================================================
// Health and Models
// ============================================================================

#[tokio::test]
async fn health_reports_status_and_session_count() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["active_sessions"], 0);
}

#[tokio::test]
async fn models_lists_engine_models_with_default() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json = json_body(response).await;
    assert_eq!(json["default"], "gpt-4o");
    let models = json["models"].as_array().unwrap();
    assert!(models.iter().any(|m| m == "gpt-4o"));
}

// ============================================================================
// Session Lifecycle
// ============================================================================

#[tokio::test]
async fn create_session_provisions_a_seeded_workspace() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json = json_body(response).await;
    let session_id = json["session_id"].as_str().unwrap();
    assert!(session_id.starts_with("session_"));
    assert_eq!(json["model"], "gpt-4o");
    assert_eq!(json["files"][0], "index.html");

    let workdir = std::path::PathBuf::from(json["repo_path"].as_str().unwrap());
    assert!(workdir.join("index.html").is_file());
}

#[tokio::test]
async fn create_session_with_files_and_model_override() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"files": ["app.py"], "read_only_files": ["README.md"], "model": "gpt-4o-mini", "edit_format": "diff"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json = json_body(response).await;
    assert_eq!(json["model"], "gpt-4o-mini");
    assert_eq!(json["edit_format"], "diff");
    assert_eq!(json["files"][0], "app.py");
    assert_eq!(json["read_only_files"][0], "README.md");
}

#[tokio::test]
async fn create_session_rejects_escaping_paths() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"files": ["../outside.txt"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let json = json_body(response).await;
    assert_eq!(json["kind"], "validation_error");
}

#[tokio::test]
async fn list_sessions_shows_created_sessions() {
    let app = test_app();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::post("/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = app
        .oneshot(Request::get("/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json = json_body(response).await;
    let sessions = json["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["in_flight"], false);
    assert_eq!(sessions[0]["tokens_sent"], 0);
}

#[tokio::test]
async fn delete_session_removes_it() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    let session_id = json_body(response).await["session_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await["success"], true);

    let response = app
        .oneshot(
            Request::delete(format!("/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn delete_unknown_session_is_problem_json() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::delete("/sessions/session_missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );

    let json = json_body(response).await;
    assert_eq!(json["status"], 404);
    assert_eq!(json["kind"], "session_not_found");
}

#[tokio::test]
async fn capacity_limit_answers_service_unavailable() {
    let state = test_state(Arc::new(ScriptedEngine::new()), 1);
    let app = server::build_app(state, 300);

    let response = app
        .clone()
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(json_body(response).await["kind"], "capacity_exceeded");
}

// ============================================================================
// File Endpoints
// ============================================================================

#[tokio::test]
async fn files_and_file_content_roundtrip() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"files": ["notes.txt"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(response).await;
    let session_id = json["session_id"].as_str().unwrap().to_string();
    let workdir = std::path::PathBuf::from(json["repo_path"].as_str().unwrap());
    std::fs::write(workdir.join("notes.txt"), "remember the milk").unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/sessions/{session_id}/files"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await["files"][0], "notes.txt");

    let response = app
        .oneshot(
            Request::get(format!(
                "/sessions/{session_id}/file_content?file_path=notes.txt"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await["content"], "remember the milk");
}

#[tokio::test]
async fn file_content_for_missing_file_is_not_found() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    let session_id = json_body(response).await["session_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::get(format!(
                "/sessions/{session_id}/file_content?file_path=absent.txt"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn add_file_tracks_an_existing_file() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(response).await;
    let session_id = json["session_id"].as_str().unwrap().to_string();
    let workdir = std::path::PathBuf::from(json["repo_path"].as_str().unwrap());
    std::fs::write(workdir.join("extra.py"), "print('hi')").unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::post("/add_file")
                .header("content-type", "application/json")
                .body(Body::from(format!(
                    r#"{{"session_id": "{session_id}", "file_path": "extra.py"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await["success"], true);

    let response = app
        .oneshot(
            Request::get(format!("/sessions/{session_id}/files"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let files = json_body(response).await["files"].clone();
    let files: Vec<String> = serde_json::from_value(files).unwrap();
    assert!(files.contains(&"extra.py".to_string()));
}

#[tokio::test]
async fn add_file_for_absent_file_is_not_found() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    let session_id = json_body(response).await["session_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::post("/add_file")
                .header("content-type", "application/json")
                .body(Body::from(format!(
                    r#"{{"session_id": "{session_id}", "file_path": "ghost.py"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
