//! Model completion collaborators.
//!
//! The chat core only sees [`CompletionModel`]; concrete backends live in
//! the submodules.

pub mod echo;
pub mod openai_chat;
#[cfg(test)]
pub(crate) mod testing;

pub use echo::EchoModel;
pub use openai_chat::OpenAiChatModel;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chat::core::message::Message;

/// Errors produced by completion backends.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport-level failure (connect, timeout, TLS, body decode).
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("model service returned status {status}: {body}")]
    HttpStatusNotOk {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// The response did not contain a reply.
    #[error("model response malformed")]
    MalformedResponse,
    /// No API key was configured.
    #[error("api key is not configured")]
    MissingApiKey,
}

/// Generation parameters sent with every request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Creativity parameter.
    pub temperature: f32,
    /// Maximum reply length in tokens.
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1200,
        }
    }
}

/// A blocking chat completion backend.
///
/// Receives the full ordered conversation and returns one assistant reply.
pub trait CompletionModel: Send + Sync {
    /// Model name used for logging.
    fn name(&self) -> &str;

    /// Produce the next assistant reply for `messages`.
    ///
    /// # Errors
    /// Returns an error on transport, status or decoding failures.
    fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, CompletionError>;
}
