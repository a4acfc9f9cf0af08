//! Session state and lifecycle.

mod registry;
mod sweeper;

pub use registry::{CreateOptions, SessionRegistry};
pub use sweeper::{SweeperConfig, spawn_sweeper, sweep_once};

use std::path::{Component, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::api::EditFormat;
use crate::engine::{Conversation, TurnOutcome};
use crate::error::ApiError;

/// Descriptive session state, readable while a turn is running.
#[derive(Debug, Clone)]
pub struct SessionMeta {
    pub workdir: PathBuf,
    pub model: String,
    pub edit_format: EditFormat,
    /// Workdir-relative paths the engine may rewrite.
    pub files: Vec<PathBuf>,
    /// Workdir-relative paths visible to the engine but never written.
    pub read_only_files: Vec<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub tokens_sent: u64,
    pub tokens_received: u64,
    pub cost: f64,
}

/// One registered session.
///
/// The conversation mutex is the turn slot: holding its guard is holding
/// the session's single-writer right, and it is released only when the
/// engine invocation has actually returned. Metadata sits behind a
/// separate lock so listings and file queries never wait on a turn. The
/// metadata lock is never held across an await point.
#[derive(Debug)]
pub struct SessionEntry {
    pub id: String,
    meta: RwLock<SessionMeta>,
    pub conversation: Arc<Mutex<Conversation>>,
}

impl SessionEntry {
    #[must_use]
    pub fn new(id: String, meta: SessionMeta) -> Self {
        Self {
            id,
            meta: RwLock::new(meta),
            conversation: Arc::new(Mutex::new(Conversation::default())),
        }
    }

    /// Cloned metadata view.
    #[must_use]
    pub fn meta(&self) -> SessionMeta {
        self.meta.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether a turn currently holds the slot.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.conversation.try_lock().is_err()
    }

    pub fn touch(&self) {
        self.write(|m| m.last_active_at = Utc::now());
    }

    pub fn set_model(&self, model: &str) {
        self.write(|m| m.model = model.to_string());
    }

    pub fn set_edit_format(&self, format: EditFormat) {
        self.write(|m| m.edit_format = format);
    }

    /// Fold a finished turn's accounting into the session totals.
    pub fn record_outcome(&self, outcome: &TurnOutcome) {
        self.write(|m| {
            m.tokens_sent += outcome.tokens_sent;
            m.tokens_received += outcome.tokens_received;
            m.cost += outcome.cost;
            m.last_active_at = Utc::now();
        });
    }

    /// Add files to the tracked set, deduplicating while keeping order.
    /// Tracking survives a failed turn; it is not rolled back.
    pub fn track_files(&self, files: &[String], read_only: &[String]) -> Result<(), ApiError> {
        let files = files.iter().map(|f| clean_rel_path(f)).collect::<Result<Vec<_>, _>>()?;
        let read_only = read_only.iter().map(|f| clean_rel_path(f)).collect::<Result<Vec<_>, _>>()?;
        self.write(|m| {
            for path in files {
                if !m.files.contains(&path) {
                    m.files.push(path);
                }
            }
            for path in read_only {
                if !m.read_only_files.contains(&path) {
                    m.read_only_files.push(path);
                }
            }
        });
        Ok(())
    }

    fn write(&self, update: impl FnOnce(&mut SessionMeta)) {
        let mut meta = self.meta.write().unwrap_or_else(|e| e.into_inner());
        update(&mut meta);
    }
}

/// Reject paths that could resolve outside the session workspace.
pub fn clean_rel_path(raw: &str) -> Result<PathBuf, ApiError> {
    let path = PathBuf::from(raw);
    let escapes = path.is_absolute()
        || path.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes || raw.is_empty() {
        return Err(ApiError::Validation(format!(
            "file path escapes the session workspace: {raw}"
        )));
    }
    Ok(path)
}
