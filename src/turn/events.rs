//! Typed events produced while a turn runs.

use axum::response::sse::Event;
use serde::Serialize;

use crate::api::{TurnResult, sse};

/// One event on a turn's channel, in engine emission order.
///
/// Exactly one terminal event (`Complete` or `Error`) ends every turn.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    Start { message: String },
    Info { message: String },
    Processing { message: String },
    ToolOutput { message: String },
    ToolError { message: String },
    ToolWarning { message: String },
    AiOutput { message: String },
    AssistantOutput { message: String },
    FileWrite { path: String, content_length: usize, success: bool },
    Response { message: String },
    Complete(Box<TurnResult>),
    Error { kind: &'static str, message: String },
}

#[derive(Serialize)]
struct MessageData<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct FileWriteData<'a> {
    filename: &'a str,
    content_length: usize,
    success: bool,
}

#[derive(Serialize)]
struct ErrorData<'a> {
    kind: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct HeartbeatData<'a> {
    status: &'a str,
}

impl TurnEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TurnEvent::Start { .. } => sse::START,
            TurnEvent::Info { .. } => sse::INFO,
            TurnEvent::Processing { .. } => sse::PROCESSING,
            TurnEvent::ToolOutput { .. } => sse::TOOL_OUTPUT,
            TurnEvent::ToolError { .. } => sse::TOOL_ERROR,
            TurnEvent::ToolWarning { .. } => sse::TOOL_WARNING,
            TurnEvent::AiOutput { .. } => sse::AI_OUTPUT,
            TurnEvent::AssistantOutput { .. } => sse::ASSISTANT_OUTPUT,
            TurnEvent::FileWrite { .. } => sse::FILE_WRITE,
            TurnEvent::Response { .. } => sse::RESPONSE,
            TurnEvent::Complete(_) => sse::COMPLETE,
            TurnEvent::Error { .. } => sse::ERROR,
        }
    }

    /// Whether this event ends the turn's stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::Complete(_) | TurnEvent::Error { .. })
    }

    /// Encode as an SSE frame: event name plus JSON payload.
    #[must_use]
    pub fn to_sse(&self) -> Event {
        let event = Event::default().event(self.name());
        let encoded = match self {
            TurnEvent::Start { message }
            | TurnEvent::Info { message }
            | TurnEvent::Processing { message }
            | TurnEvent::ToolOutput { message }
            | TurnEvent::ToolError { message }
            | TurnEvent::ToolWarning { message }
            | TurnEvent::AiOutput { message }
            | TurnEvent::AssistantOutput { message }
            | TurnEvent::Response { message } => event.json_data(MessageData { message }),
            TurnEvent::FileWrite { path, content_length, success } => event.json_data(FileWriteData {
                filename: path,
                content_length: *content_length,
                success: *success,
            }),
            TurnEvent::Complete(result) => event.json_data(result),
            TurnEvent::Error { kind, message } => event.json_data(ErrorData { kind, message }),
        };
        encoded.unwrap_or_else(|_| Event::default().event(self.name()).data("{}"))
    }

    /// Keep-alive frame injected when the channel is idle.
    #[must_use]
    pub fn heartbeat_frame() -> Event {
        Event::default()
            .event(sse::HEARTBEAT)
            .json_data(HeartbeatData { status: "alive" })
            .unwrap_or_else(|_| Event::default().event(sse::HEARTBEAT).data("{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TurnResult;

    fn sample_result() -> TurnResult {
        TurnResult {
            session_id: "session_test".to_string(),
            response: "done".to_string(),
            edited_files: vec![],
            tokens_sent: 10,
            tokens_received: 5,
            cost: 0.0001,
            output: String::new(),
            errors: String::new(),
            warnings: String::new(),
        }
    }

    #[test]
    fn names_match_the_wire_protocol() {
        assert_eq!(TurnEvent::Start { message: String::new() }.name(), "start");
        assert_eq!(
            TurnEvent::FileWrite { path: "a".into(), content_length: 1, success: true }.name(),
            "file_write"
        );
        assert_eq!(TurnEvent::Complete(Box::new(sample_result())).name(), "complete");
        assert_eq!(TurnEvent::Error { kind: "timeout", message: String::new() }.name(), "error");
    }

    #[test]
    fn only_complete_and_error_are_terminal() {
        assert!(TurnEvent::Complete(Box::new(sample_result())).is_terminal());
        assert!(TurnEvent::Error { kind: "engine_error", message: String::new() }.is_terminal());
        assert!(!TurnEvent::Response { message: "x".into() }.is_terminal());
        assert!(!TurnEvent::Start { message: "x".into() }.is_terminal());
    }
}
