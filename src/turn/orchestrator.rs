//! Turn admission and supervision.
//!
//! One engine invocation per session at a time: the session's conversation
//! mutex is claimed with a non-blocking owned lock, travels into the
//! blocking engine call, and is dropped only when the engine has actually
//! returned. There is no queue; a busy session answers with a conflict
//! and the client retries.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedMutexGuard, mpsc};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::api::{ChatRequest, TurnResult};
use crate::background::BackgroundTasks;
use crate::engine::{Conversation, Engine, EngineError, TurnInput};
use crate::error::ApiError;
use crate::session::{CreateOptions, SessionEntry, SessionRegistry};

use super::diff::{diff_snapshots, snapshot};
use super::events::TurnEvent;
use super::sink::{CapturedText, ChannelSink};

/// Smallest usable event channel: the admission preamble is sent before
/// any consumer attaches, so it must fit without blocking.
const MIN_CHANNEL_CAPACITY: usize = 4;

/// Everything needed to admit and run turns. Cheap to clone.
#[derive(Clone)]
pub struct TurnRunner {
    engine: Arc<dyn Engine>,
    registry: SessionRegistry,
    background: BackgroundTasks,
    turn_timeout: Duration,
    channel_capacity: usize,
}

impl TurnRunner {
    #[must_use]
    pub fn new(
        engine: Arc<dyn Engine>,
        registry: SessionRegistry,
        background: BackgroundTasks,
        turn_timeout: Duration,
        channel_capacity: usize,
    ) -> Self {
        Self {
            engine,
            registry,
            background,
            turn_timeout,
            channel_capacity: channel_capacity.max(MIN_CHANNEL_CAPACITY),
        }
    }

    /// Admit one turn and launch it.
    ///
    /// Returns the session id and the receiving half of the turn's event
    /// channel; the caller drains it as SSE frames or collects it into a
    /// buffered result. Every request-level failure (validation, unknown
    /// session, busy slot, capacity) surfaces here, before any engine
    /// execution; failures after this point arrive as an `error` event.
    pub async fn start_turn(
        &self,
        request: ChatRequest,
    ) -> Result<(String, mpsc::Receiver<TurnEvent>), ApiError> {
        if request.message.trim().is_empty() {
            return Err(ApiError::Validation("message must not be empty".to_string()));
        }

        let entry = match &request.session_id {
            Some(id) => self
                .registry
                .get(id)
                .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?,
            None => self.registry.create(CreateOptions::from_chat(&request))?,
        };

        // Claim the slot before touching anything else; no waiting.
        let conversation = self.claim_slot(&entry)?;

        entry.track_files(&request.files, &request.read_only_files)?;
        if let Some(model) = &request.model {
            entry.set_model(model);
        }
        if let Some(format) = request.edit_format {
            entry.set_edit_format(format);
        }
        entry.touch();

        let mut meta = entry.meta();
        // A path listed in both sets counts as read-only: it is neither
        // handed to the engine as writable nor snapshotted for edits.
        let read_only = meta.read_only_files.clone();
        meta.files.retain(|path| !read_only.contains(path));

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let _ = tx.send(TurnEvent::Start { message: "Starting chat".to_string() }).await;
        let _ = tx
            .send(TurnEvent::Info { message: format!("Working in {}", meta.workdir.display()) })
            .await;
        let _ = tx
            .send(TurnEvent::Processing { message: "Processing request".to_string() })
            .await;

        let captured = Arc::new(Mutex::new(CapturedText::default()));
        let prompt = request.message;
        let engine = Arc::clone(&self.engine);
        let sink_tx = tx.clone();
        let sink_captured = Arc::clone(&captured);

        // The owned guard moves into the closure: the slot frees exactly
        // when the engine call returns, never earlier.
        let handle = tokio::task::spawn_blocking(move || {
            let mut conversation = conversation;
            let sink = ChannelSink::new(sink_tx, sink_captured);
            let before = snapshot(&meta.workdir, &meta.files);
            let outcome = engine.execute_turn(
                &mut conversation,
                TurnInput {
                    prompt: &prompt,
                    model: &meta.model,
                    edit_format: meta.edit_format,
                    workdir: &meta.workdir,
                    files: &meta.files,
                    read_only_files: &meta.read_only_files,
                },
                &sink,
            )?;
            let after = snapshot(&meta.workdir, &meta.files);
            Ok::<_, EngineError>((outcome, diff_snapshots(&before, &after)))
        });

        let session_id = entry.id.clone();
        self.spawn_supervisor(entry, handle, tx, captured);
        Ok((session_id, rx))
    }

    /// Take the session's exclusive slot without waiting.
    ///
    /// A delete can win the race between lookup and claim (its removal
    /// runs under a try-lock that may precede ours), so membership is
    /// re-checked once the guard is held; from that point a delete can
    /// only see the slot as busy.
    fn claim_slot(
        &self,
        entry: &Arc<SessionEntry>,
    ) -> Result<OwnedMutexGuard<Conversation>, ApiError> {
        let guard = entry
            .conversation
            .clone()
            .try_lock_owned()
            .map_err(|_| ApiError::SessionBusy(entry.id.clone()))?;
        if self.registry.get(&entry.id).is_none() {
            return Err(ApiError::SessionNotFound(entry.id.clone()));
        }
        Ok(guard)
    }

    /// Watch the running engine call: apply the turn deadline, fold the
    /// outcome into the session, and emit exactly one terminal event.
    fn spawn_supervisor(
        &self,
        entry: Arc<SessionEntry>,
        handle: tokio::task::JoinHandle<Result<(crate::engine::TurnOutcome, Vec<crate::api::EditedFile>), EngineError>>,
        tx: mpsc::Sender<TurnEvent>,
        captured: Arc<Mutex<CapturedText>>,
    ) {
        let turn_timeout = self.turn_timeout;
        let background = self.background.clone();
        self.background.spawn(async move {
            let mut handle = handle;
            match timeout(turn_timeout, &mut handle).await {
                Ok(Ok(Ok((outcome, edited_files)))) => {
                    entry.record_outcome(&outcome);
                    let captured = {
                        let mut guard = captured.lock().unwrap_or_else(|e| e.into_inner());
                        std::mem::take(&mut *guard)
                    };
                    let result = TurnResult {
                        session_id: entry.id.clone(),
                        response: outcome.response,
                        edited_files,
                        tokens_sent: outcome.tokens_sent,
                        tokens_received: outcome.tokens_received,
                        cost: outcome.cost,
                        output: captured.output_joined(),
                        errors: captured.errors_joined(),
                        warnings: captured.warnings_joined(),
                    };
                    debug!(session_id = %entry.id, edited = result.edited_files.len(), "Turn complete");
                    let _ = tx
                        .send(TurnEvent::Response { message: result.response.clone() })
                        .await;
                    let _ = tx.send(TurnEvent::Complete(Box::new(result))).await;
                }
                Ok(Ok(Err(engine_error))) => {
                    warn!(session_id = %entry.id, error = %engine_error, "Engine turn failed");
                    entry.touch();
                    let _ = tx
                        .send(TurnEvent::Error {
                            kind: "engine_error",
                            message: engine_error.to_string(),
                        })
                        .await;
                }
                Ok(Err(join_error)) => {
                    warn!(session_id = %entry.id, error = %join_error, "Turn task aborted");
                    entry.touch();
                    let _ = tx
                        .send(TurnEvent::Error {
                            kind: "engine_error",
                            message: "engine execution aborted".to_string(),
                        })
                        .await;
                }
                Err(_elapsed) => {
                    warn!(
                        session_id = %entry.id,
                        timeout_secs = turn_timeout.as_secs(),
                        "Turn exceeded time limit"
                    );
                    let _ = tx
                        .send(TurnEvent::Error {
                            kind: "timeout",
                            message: format!(
                                "turn exceeded the {}s limit",
                                turn_timeout.as_secs()
                            ),
                        })
                        .await;
                    // The engine cannot be interrupted; park the call so the
                    // slot frees only when it truly finishes, and shutdown
                    // still waits for it.
                    background.spawn(async move {
                        let _ = handle.await;
                        entry.touch();
                        debug!(session_id = %entry.id, "Timed-out turn finished in background");
                    });
                }
            }
        });
    }
}
