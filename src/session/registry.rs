//! Process-wide session registry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::{debug, info};
use ulid::Ulid;

use crate::api::{EditFormat, SESSION_ID_PREFIX};
use crate::error::ApiError;

use super::{SessionEntry, SessionMeta, clean_rel_path};

/// Per-session overrides supplied at creation time.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub repo_path: Option<String>,
    pub model: Option<String>,
    pub files: Vec<String>,
    pub read_only_files: Vec<String>,
    pub edit_format: Option<EditFormat>,
}

impl CreateOptions {
    #[must_use]
    pub fn from_chat(request: &crate::api::ChatRequest) -> Self {
        Self {
            repo_path: request.repo_path.clone(),
            model: request.model.clone(),
            files: request.files.clone(),
            read_only_files: request.read_only_files.clone(),
            edit_format: request.edit_format,
        }
    }
}

/// Registry of live sessions.
///
/// Cheap to clone and shared across handlers. Map access is O(1) and never
/// held across an engine invocation; the creation lock only serializes
/// the capacity check with the matching insert.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<SessionEntry>>>,
    create_lock: Arc<Mutex<()>>,
    workspace_root: PathBuf,
    default_model: String,
    default_edit_format: EditFormat,
    max_sessions: usize,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(
        workspace_root: PathBuf,
        default_model: String,
        default_edit_format: EditFormat,
        max_sessions: usize,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            create_lock: Arc::new(Mutex::new(())),
            workspace_root,
            default_model,
            default_edit_format,
            max_sessions,
        }
    }

    /// Register a new session, provisioning a workspace when no repository
    /// path was given.
    ///
    /// Filesystem work happens before the creation lock is taken; the lock
    /// covers only the capacity check and the matching insert, so
    /// concurrent creates never queue behind disk I/O.
    pub fn create(&self, options: CreateOptions) -> Result<Arc<SessionEntry>, ApiError> {
        let id = format!("{SESSION_ID_PREFIX}{}", Ulid::new().to_string().to_lowercase());
        let (workdir, files, provisioned) = self.provision_workdir(&options, &id)?;
        let cleanup = provisioned.then(|| workdir.clone());

        let now = chrono::Utc::now();
        let entry = Arc::new(SessionEntry::new(
            id.clone(),
            SessionMeta {
                workdir,
                model: options.model.unwrap_or_else(|| self.default_model.clone()),
                edit_format: options.edit_format.unwrap_or(self.default_edit_format),
                files: vec![],
                read_only_files: vec![],
                created_at: now,
                last_active_at: now,
                tokens_sent: 0,
                tokens_received: 0,
                cost: 0.0,
            },
        ));
        if let Err(e) = entry.track_files(&files, &options.read_only_files) {
            remove_provisioned(cleanup.as_deref());
            return Err(e);
        }

        let admitted = {
            let _guard = self.create_lock.lock().unwrap_or_else(|e| e.into_inner());
            if self.sessions.len() >= self.max_sessions {
                false
            } else {
                self.sessions.insert(id.clone(), Arc::clone(&entry));
                true
            }
        };
        if !admitted {
            remove_provisioned(cleanup.as_deref());
            return Err(ApiError::CapacityExceeded(self.max_sessions));
        }

        info!(session_id = %id, workdir = %entry.meta().workdir.display(), "Created session");
        Ok(entry)
    }

    /// Resolve the working directory: an existing repository when given,
    /// otherwise a fresh workspace seeded with the requested files
    /// (defaulting to a bare `index.html`). The returned flag marks a
    /// workspace this registry created and may remove again.
    fn provision_workdir(
        &self,
        options: &CreateOptions,
        id: &str,
    ) -> Result<(PathBuf, Vec<String>, bool), ApiError> {
        if let Some(repo_path) = &options.repo_path {
            let dir = PathBuf::from(repo_path);
            if !dir.is_dir() {
                return Err(ApiError::Validation(format!(
                    "repo_path is not a directory: {repo_path}"
                )));
            }
            return Ok((dir, options.files.clone(), false));
        }

        let dir = self.workspace_root.join(id);
        std::fs::create_dir_all(&dir)
            .map_err(|e| ApiError::Validation(format!("cannot create workspace: {e}")))?;
        let files = if options.files.is_empty() {
            vec!["index.html".to_string()]
        } else {
            options.files.clone()
        };
        for name in &files {
            if let Err(e) = seed_file(&dir, name) {
                remove_provisioned(Some(&dir));
                return Err(e);
            }
        }
        Ok((dir, files, true))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<SessionEntry>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a session, refusing while a turn holds the slot. The slot is
    /// held for the duration of the removal so no turn can start against a
    /// session that is going away.
    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        let entry = self.get(id).ok_or_else(|| ApiError::SessionNotFound(id.to_string()))?;
        let Ok(_slot) = entry.conversation.try_lock() else {
            return Err(ApiError::SessionBusy(id.to_string()));
        };
        self.sessions.remove(id);
        debug!(session_id = %id, "Deleted session");
        Ok(())
    }

    #[must_use]
    pub fn list(&self) -> Vec<Arc<SessionEntry>> {
        self.sessions.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn seed_file(dir: &Path, name: &str) -> Result<(), ApiError> {
    let rel = clean_rel_path(name)?;
    let path = dir.join(&rel);
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::Validation(format!("cannot seed workspace: {e}")))?;
    }
    std::fs::write(&path, "")
        .map_err(|e| ApiError::Validation(format!("cannot seed workspace: {e}")))
}

fn remove_provisioned(dir: Option<&Path>) {
    if let Some(dir) = dir {
        let _ = std::fs::remove_dir_all(dir);
    }
}
