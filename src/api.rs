//! Wire types shared by the HTTP surface.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix applied to every generated session identifier.
pub const SESSION_ID_PREFIX: &str = "session_";

/// SSE event names emitted on a streaming chat turn.
pub mod sse {
    pub const START: &str = "start";
    pub const INFO: &str = "info";
    pub const PROCESSING: &str = "processing";
    pub const TOOL_OUTPUT: &str = "tool_output";
    pub const TOOL_ERROR: &str = "tool_error";
    pub const TOOL_WARNING: &str = "tool_warning";
    pub const AI_OUTPUT: &str = "ai_output";
    pub const ASSISTANT_OUTPUT: &str = "assistant_output";
    pub const FILE_WRITE: &str = "file_write";
    pub const RESPONSE: &str = "response";
    pub const COMPLETE: &str = "complete";
    pub const HEARTBEAT: &str = "heartbeat";
    pub const ERROR: &str = "error";
}

// ============================================================================
// Shared enums
// ============================================================================

/// How the engine is asked to express file edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditFormat {
    Auto,
    #[default]
    Whole,
    Diff,
}

impl fmt::Display for EditFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditFormat::Auto => write!(f, "auto"),
            EditFormat::Whole => write!(f, "whole"),
            EditFormat::Diff => write!(f, "diff"),
        }
    }
}

// ============================================================================
// Chat
// ============================================================================

/// Request body for `POST /chat`.
///
/// `session_id` is optional: omitting it creates a fresh session for this
/// turn, whose id comes back in the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub read_only_files: Vec<String>,
    #[serde(default)]
    pub edit_format: Option<EditFormat>,
    #[serde(default)]
    pub repo_path: Option<String>,
    #[serde(default)]
    pub stream: bool,
}

/// One file the engine changed during a turn, with its full post-turn
/// content. A file the engine removed is reported with empty content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedFile {
    pub path: String,
    pub content: String,
}

/// Outcome of a completed turn. Returned as the buffered response body and
/// embedded in the terminal `complete` frame of a streamed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub session_id: String,
    pub response: String,
    pub edited_files: Vec<EditedFile>,
    pub tokens_sent: u64,
    pub tokens_received: u64,
    pub cost: f64,
    pub output: String,
    pub errors: String,
    pub warnings: String,
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub repo_path: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub read_only_files: Vec<String>,
    #[serde(default)]
    pub edit_format: Option<EditFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub repo_path: String,
    pub model: String,
    pub edit_format: EditFormat,
    pub files: Vec<String>,
    pub read_only_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub repo_path: String,
    pub model: String,
    pub in_flight: bool,
    pub created_at: String,
    pub last_active_at: String,
    pub tokens_sent: u64,
    pub tokens_received: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
    pub read_only_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContentQuery {
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContentResponse {
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFileRequest {
    pub session_id: String,
    pub file_path: String,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFileResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    #[serde(rename = "default")]
    pub default_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
    pub timestamp: String,
}
