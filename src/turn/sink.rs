//! Output sink bridging the engine's print-style emissions into the
//! turn's event channel.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::events::TurnEvent;

/// Capability object handed to the engine for reporting progress.
///
/// Called from the blocking thread running the engine; implementations
/// must be safe to invoke outside an async context.
pub trait OutputSink: Send + Sync {
    fn tool_output(&self, message: &str);
    fn tool_error(&self, message: &str);
    fn tool_warning(&self, message: &str);
    fn ai_output(&self, message: &str);
    fn assistant_output(&self, message: &str);
    fn file_write(&self, path: &Path, content_length: usize, success: bool);
}

/// Text captured during a turn, aggregated into the buffered result.
#[derive(Debug, Default)]
pub struct CapturedText {
    pub output: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CapturedText {
    #[must_use]
    pub fn output_joined(&self) -> String {
        self.output.join("\n")
    }

    #[must_use]
    pub fn errors_joined(&self) -> String {
        self.errors.join("\n")
    }

    #[must_use]
    pub fn warnings_joined(&self) -> String {
        self.warnings.join("\n")
    }
}

/// Sink that forwards each emission as a [`TurnEvent`] and mirrors the
/// text into capture buffers.
///
/// Sends block when the bounded channel is full, so a slow consumer
/// backpressures the engine thread. A closed channel (consumer gone)
/// silently discards the event; the turn still runs to completion.
pub struct ChannelSink {
    tx: mpsc::Sender<TurnEvent>,
    captured: Arc<Mutex<CapturedText>>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: mpsc::Sender<TurnEvent>, captured: Arc<Mutex<CapturedText>>) -> Self {
        Self { tx, captured }
    }

    fn emit(&self, event: TurnEvent) {
        let _ = self.tx.blocking_send(event);
    }

    fn capture(&self, push: impl FnOnce(&mut CapturedText)) {
        if let Ok(mut captured) = self.captured.lock() {
            push(&mut captured);
        }
    }
}

impl OutputSink for ChannelSink {
    fn tool_output(&self, message: &str) {
        self.capture(|c| c.output.push(message.to_string()));
        self.emit(TurnEvent::ToolOutput { message: message.to_string() });
    }

    fn tool_error(&self, message: &str) {
        self.capture(|c| c.errors.push(message.to_string()));
        self.emit(TurnEvent::ToolError { message: message.to_string() });
    }

    fn tool_warning(&self, message: &str) {
        self.capture(|c| c.warnings.push(message.to_string()));
        self.emit(TurnEvent::ToolWarning { message: message.to_string() });
    }

    fn ai_output(&self, message: &str) {
        self.capture(|c| c.output.push(format!("AI: {message}")));
        self.emit(TurnEvent::AiOutput { message: message.to_string() });
    }

    fn assistant_output(&self, message: &str) {
        self.capture(|c| c.output.push(format!("Assistant: {message}")));
        self.emit(TurnEvent::AssistantOutput { message: message.to_string() });
    }

    fn file_write(&self, path: &Path, content_length: usize, success: bool) {
        self.emit(TurnEvent::FileWrite {
            path: path.display().to_string(),
            content_length,
            success,
        });
    }
}

/// Sink that drops everything. Handy for engine unit tests.
pub struct NullSink;

impl OutputSink for NullSink {
    fn tool_output(&self, _message: &str) {}
    fn tool_error(&self, _message: &str) {}
    fn tool_warning(&self, _message: &str) {}
    fn ai_output(&self, _message: &str) {}
    fn assistant_output(&self, _message: &str) {}
    fn file_write(&self, _path: &Path, _content_length: usize, _success: bool) {}
}
