//! Session management endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::api::{
    AddFileRequest, AddFileResponse, CreateSessionRequest, CreateSessionResponse,
    DeleteSessionResponse, FileContentQuery, FileContentResponse, FilesResponse,
    ListSessionsResponse, SessionSummary,
};
use crate::error::ApiError;
use crate::server::AppState;
use crate::session::{CreateOptions, SessionEntry, clean_rel_path};

use super::problem_details;

fn summarize(entry: &SessionEntry) -> SessionSummary {
    let meta = entry.meta();
    SessionSummary {
        session_id: entry.id.clone(),
        repo_path: meta.workdir.display().to_string(),
        model: meta.model,
        in_flight: entry.in_flight(),
        created_at: meta.created_at.to_rfc3339(),
        last_active_at: meta.last_active_at.to_rfc3339(),
        tokens_sent: meta.tokens_sent,
        tokens_received: meta.tokens_received,
        cost: meta.cost,
    }
}

/// `POST /sessions`
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let entry = state.registry.create(CreateOptions {
        repo_path: request.repo_path,
        model: request.model,
        files: request.files,
        read_only_files: request.read_only_files,
        edit_format: request.edit_format,
    })?;
    let meta = entry.meta();
    Ok(Json(CreateSessionResponse {
        session_id: entry.id.clone(),
        repo_path: meta.workdir.display().to_string(),
        model: meta.model,
        edit_format: meta.edit_format,
        files: meta.files.iter().map(|p| p.display().to_string()).collect(),
        read_only_files: meta.read_only_files.iter().map(|p| p.display().to_string()).collect(),
    }))
}

/// `GET /sessions`
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
    let mut sessions: Vec<SessionSummary> =
        state.registry.list().iter().map(|entry| summarize(entry)).collect();
    sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(ListSessionsResponse { sessions })
}

/// `DELETE /sessions/{session_id}`
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
    state.registry.delete(&session_id)?;
    info!(session_id = %session_id, "Session deleted by request");
    Ok(Json(DeleteSessionResponse {
        success: true,
        message: format!("session {session_id} deleted"),
    }))
}

/// `GET /sessions/{session_id}/files`
pub async fn get_files(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<FilesResponse>, ApiError> {
    let entry = state
        .registry
        .get(&session_id)
        .ok_or_else(|| ApiError::SessionNotFound(session_id))?;
    let meta = entry.meta();
    Ok(Json(FilesResponse {
        files: meta.files.iter().map(|p| p.display().to_string()).collect(),
        read_only_files: meta.read_only_files.iter().map(|p| p.display().to_string()).collect(),
    }))
}

/// `GET /sessions/{session_id}/file_content?file_path=...`
pub async fn get_file_content(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<FileContentQuery>,
) -> Result<Response, ApiError> {
    let entry = state
        .registry
        .get(&session_id)
        .ok_or_else(|| ApiError::SessionNotFound(session_id))?;
    let rel = clean_rel_path(&query.file_path)?;
    let path = entry.meta().workdir.join(&rel);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Json(FileContentResponse { file_path: query.file_path, content })
            .into_response()),
        Err(_) => Ok(problem_details::not_found(format!("file not found: {}", query.file_path))),
    }
}

/// `POST /add_file`
pub async fn add_file(
    State(state): State<AppState>,
    Json(request): Json<AddFileRequest>,
) -> Result<Response, ApiError> {
    let entry = state
        .registry
        .get(&request.session_id)
        .ok_or_else(|| ApiError::SessionNotFound(request.session_id.clone()))?;
    let rel = clean_rel_path(&request.file_path)?;
    let path = entry.meta().workdir.join(&rel);
    if !path.is_file() {
        return Ok(problem_details::not_found(format!(
            "file not found: {}",
            request.file_path
        )));
    }
    if request.read_only {
        entry.track_files(&[], &[request.file_path.clone()])?;
    } else {
        entry.track_files(&[request.file_path.clone()], &[])?;
    }
    Ok(Json(AddFileResponse {
        success: true,
        message: format!("tracking {}", request.file_path),
    })
    .into_response())
}
