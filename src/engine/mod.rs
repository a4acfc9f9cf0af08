//! Engine contract.
//!
//! The coding engine is synchronous and non-reentrant: one invocation at a
//! time per conversation, each invocation free to mutate the conversation
//! and the files under the working directory. Progress is reported through
//! an [`OutputSink`]; the engine never touches the transport.

mod scripted;

pub use scripted::ScriptedEngine;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::api::EditFormat;
use crate::turn::OutputSink;

/// Long-lived conversation history owned exclusively by one session.
#[derive(Debug, Default)]
pub struct Conversation {
    pub exchanges: Vec<Exchange>,
}

/// One prompt/response pair retained in the conversation.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
}

/// Borrowed inputs for a single turn.
pub struct TurnInput<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub edit_format: EditFormat,
    pub workdir: &'a Path,
    /// Workdir-relative paths the engine may rewrite.
    pub files: &'a [PathBuf],
    /// Workdir-relative paths the engine may read but must not change.
    pub read_only_files: &'a [PathBuf],
}

/// What a successful turn produced, besides file edits on disk.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub tokens_sent: u64,
    pub tokens_received: u64,
    pub cost: f64,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("engine failure: {0}")]
    Failed(String),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io { path: path.into(), source }
    }
}

/// A conversational coding engine.
///
/// `execute_turn` runs on a blocking thread and may take arbitrarily long.
/// Implementations must not assume a tokio runtime context.
pub trait Engine: Send + Sync + 'static {
    fn execute_turn(
        &self,
        conversation: &mut Conversation,
        input: TurnInput<'_>,
        sink: &dyn OutputSink,
    ) -> Result<TurnOutcome, EngineError>;

    /// Model identifiers this engine can serve.
    fn models(&self) -> Vec<String>;
}
