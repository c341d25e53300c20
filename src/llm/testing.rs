//! Completion fakes shared by unit tests.

use std::sync::Mutex;

use crate::chat::core::message::Message;
use crate::llm::{CompletionError, CompletionModel, GenerationParams};

/// Returns a fixed reply and records every conversation it was sent.
pub(crate) struct ScriptedModel {
    reply: String,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub(crate) fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Vec<Message>> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl CompletionModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(
        &self,
        messages: &[Message],
        _params: &GenerationParams,
    ) -> Result<String, CompletionError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        Ok(self.reply.clone())
    }
}

/// Always fails as an unavailable upstream would.
pub(crate) struct FailingModel;

impl CompletionModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn complete(
        &self,
        _messages: &[Message],
        _params: &GenerationParams,
    ) -> Result<String, CompletionError> {
        Err(CompletionError::HttpStatusNotOk {
            status: 429,
            body: "quota exceeded".to_string(),
        })
    }
}
