//! Offline completion backend for local runs and tests.

use crate::chat::core::message::{Message, Role};
use crate::llm::{CompletionError, CompletionModel, GenerationParams};

/// Replies by reflecting the latest user message back.
#[derive(Clone, Debug, Default)]
pub struct EchoModel;

impl EchoModel {
    /// Create the echo backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CompletionModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    fn complete(
        &self,
        messages: &[Message],
        _params: &GenerationParams,
    ) -> Result<String, CompletionError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .ok_or(CompletionError::MalformedResponse)?;
        Ok(format!("You said: {}", last_user.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_reflects_latest_user_turn() {
        let messages = vec![
            Message::system("sys"),
            Message::assistant("hello"),
            Message::user("first"),
            Message::assistant("ok"),
            Message::user("second"),
        ];
        let reply = EchoModel::new().complete(&messages, &GenerationParams::default());
        assert_eq!(reply.ok().as_deref(), Some("You said: second"));
    }

    #[test]
    fn test_echo_without_user_turn_is_malformed() {
        let messages = vec![Message::system("sys")];
        let reply = EchoModel::new().complete(&messages, &GenerationParams::default());
        assert!(matches!(reply, Err(CompletionError::MalformedResponse)));
    }
}
