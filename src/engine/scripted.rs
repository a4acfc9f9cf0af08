//! Deterministic offline engine.
//!
//! Stands in for a real model-backed engine during development and in the
//! integration tests: emits the full sink event sequence, rewrites every
//! writable tracked file from the prompt, and reports plausible token
//! accounting. Given identical inputs it produces identical outputs.

use std::fs;
use std::path::Path;

use super::{Conversation, Engine, EngineError, Exchange, TurnInput, TurnOutcome};
use crate::turn::OutputSink;

const DEFAULT_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "claude-sonnet-4"];

const COST_PER_TOKEN: f64 = 0.000_002;

pub struct ScriptedEngine {
    models: Vec<String>,
}

impl ScriptedEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ScriptedEngine {
    fn execute_turn(
        &self,
        conversation: &mut Conversation,
        input: TurnInput<'_>,
        sink: &dyn OutputSink,
    ) -> Result<TurnOutcome, EngineError> {
        if !self.models.iter().any(|m| m == input.model) {
            return Err(EngineError::UnknownModel(input.model.to_string()));
        }

        sink.tool_output(&format!(
            "Working with {} editable and {} read-only file(s)",
            input.files.len(),
            input.read_only_files.len()
        ));

        let mut written = Vec::new();
        for rel in input.files {
            let path = input.workdir.join(rel);
            let existing = fs::read_to_string(&path).ok();
            let content = render_file(input.prompt, rel);
            // Skip unchanged files so repeated prompts converge to a no-op.
            if existing.as_deref() == Some(content.as_str()) {
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
            }
            fs::write(&path, &content).map_err(|e| EngineError::io(&path, e))?;
            sink.file_write(rel, content.len(), true);
            written.push(rel.display().to_string());
        }

        let response = if written.is_empty() {
            format!("No file changes were needed for: {}", input.prompt)
        } else {
            format!("Updated {} per your request: {}", written.join(", "), input.prompt)
        };
        sink.ai_output(&response);

        let tokens_sent = (input.prompt.split_whitespace().count() as u64 + 12)
            + input.files.len() as u64 * 16;
        let tokens_received = response.len() as u64 / 4 + 1;
        conversation.exchanges.push(Exchange {
            prompt: input.prompt.to_string(),
            response: response.clone(),
        });

        Ok(TurnOutcome {
            response,
            tokens_sent,
            tokens_received,
            cost: (tokens_sent + tokens_received) as f64 * COST_PER_TOKEN,
        })
    }

    fn models(&self) -> Vec<String> {
        self.models.clone()
    }
}

fn render_file(prompt: &str, rel: &Path) -> String {
    let comment = match rel.extension().and_then(|e| e.to_str()) {
        Some("py") => format!("# Generated for: {prompt}\n"),
        Some("html") => format!("<!-- Generated for: {prompt} -->\n"),
        _ => format!("// Generated for: {prompt}\n"),
    };
    format!("{comment}\n{prompt}\n")
}
