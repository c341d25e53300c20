//! Role-tagged conversation messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chat::core::errors::ChatError;

/// Role of a message in the conversation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instruction derived from the active persona.
    System,
    /// User input.
    User,
    /// Model reply (or the persona's opening prompt).
    Assistant,
}

impl Role {
    /// Stable string form, as sent to the model API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Speaker label used in rendered transcripts, `None` for hidden roles.
    #[must_use]
    pub const fn speaker_label(self) -> Option<&'static str> {
        match self {
            Self::System => None,
            Self::User => Some("You"),
            Self::Assistant => Some("Assistant"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(value.to_string()),
        }
    }
}

/// One turn of role-tagged text.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the content.
    pub role: Role,
    /// Text payload.
    pub content: String,
}

impl Message {
    /// Build a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// User text that is known to be non-blank.
///
/// Blank submissions are rejected here, before they can reach a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserMessage(String);

impl UserMessage {
    /// Validate raw input.
    ///
    /// # Errors
    /// Returns [`ChatError::EmptyMessage`] if the text is empty or whitespace only.
    pub fn new(text: impl Into<String>) -> Result<Self, ChatError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        Ok(Self(text))
    }

    /// Borrow the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
