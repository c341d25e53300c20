//! Error types for the chat core.

use thiserror::Error;

use crate::llm::CompletionError;

/// Chat subsystem error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Persona identifier not present in the catalog.
    #[error("unknown persona: {0}")]
    UnknownPersona(String),
    /// Blank user submission.
    #[error("message must not be empty")]
    EmptyMessage,
    /// Model completion failed.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    /// Tokenizer could not be initialized for the configured model.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    /// Persona catalog could not be decoded.
    #[error("catalog error: {0}")]
    Catalog(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
