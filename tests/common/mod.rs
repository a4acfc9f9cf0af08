//! Common test utilities.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tempfile::TempDir;

use coderelay::api::EditFormat;
use coderelay::background::BackgroundTasks;
use coderelay::engine::{Engine, ScriptedEngine};
use coderelay::server::{self, AppState};
use coderelay::session::SessionRegistry;
use coderelay::turn::TurnRunner;

/// Build app state around an arbitrary engine.
pub fn test_state(engine: Arc<dyn Engine>, max_sessions: usize) -> AppState {
    let tmp = TempDir::new().unwrap();
    // Leak the TempDir so the workspaces survive for the whole test.
    let tmp = Box::leak(Box::new(tmp));

    let registry = SessionRegistry::new(
        tmp.path().join("workspaces"),
        "gpt-4o".to_string(),
        EditFormat::Whole,
        max_sessions,
    );
    let background = BackgroundTasks::new();
    let turns = TurnRunner::new(
        Arc::clone(&engine),
        registry.clone(),
        background.clone(),
        Duration::from_secs(30),
        64,
    );
    AppState {
        registry,
        engine,
        turns,
        background,
        default_model: "gpt-4o".to_string(),
        heartbeat_interval_seconds: 15,
    }
}

/// Create a test app backed by the deterministic engine.
pub fn test_app() -> Router {
    server::build_app(test_state(Arc::new(ScriptedEngine::new()), 100), 300)
}

/// Parse SSE events from a response body into (event, data) pairs.
pub fn parse_sse_events(body: &str) -> Vec<(String, String)> {
    let mut events = Vec::new();
    let mut current_event = String::new();
    let mut current_data = String::new();

    for line in body.lines() {
        if let Some(event_name) = line.strip_prefix("event:") {
            current_event = event_name.trim().to_string();
        } else if let Some(data) = line.strip_prefix("data:") {
            current_data = data.trim().to_string();
        } else if line.is_empty() && !current_event.is_empty() {
            events.push((current_event.clone(), current_data.clone()));
            current_event.clear();
            current_data.clear();
        }
    }

    // Handle last event if no trailing newline
    if !current_event.is_empty() {
        events.push((current_event, current_data));
    }

    events
}
