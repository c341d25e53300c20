//! Blocking client for OpenAI-compatible chat completion endpoints.
//!
//! Behaviour:
//! - `POST {api_url}/chat/completions` with the whole conversation.
//! - Bearer authentication from the configured key.
//! - No retries: any failure is returned to the caller as-is.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::chat::core::config::LlmConfig;
use crate::chat::core::message::Message;
use crate::llm::{CompletionError, CompletionModel, GenerationParams};

/// Connect timeout for the HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of error-body characters kept in errors.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat completions client.
pub struct OpenAiChatModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if no API key is configured or the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(CompletionError::MissingApiKey)?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: completions_endpoint(&config.api_url),
            api_key,
            model: config.model.clone(),
        })
    }
}

impl CompletionModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, CompletionError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "sending chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CompletionError::HttpStatusNotOk {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let parsed = response.json::<ChatCompletionResponse>()?;
        extract_reply(parsed)
    }
}

fn completions_endpoint(api_url: &str) -> String {
    format!("{}/chat/completions", api_url.trim_end_matches('/'))
}

fn extract_reply(response: ChatCompletionResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::MalformedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            completions_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_endpoint("http://localhost:8000/v1"),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Message::system("be kind"), Message::user("hello")];
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 1200,
        };
        let value = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["max_tokens"], 1200);
        assert_eq!(value["temperature"], 0.5);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_extract_reply_first_choice() -> Result<(), Box<dyn std::error::Error>> {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Peace be with you."}}]}"#,
        )?;
        assert_eq!(extract_reply(parsed)?, "Peace be with you.");
        Ok(())
    }

    #[test]
    fn test_extract_reply_malformed() -> Result<(), Box<dyn std::error::Error>> {
        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#)?;
        assert!(matches!(
            extract_reply(empty),
            Err(CompletionError::MalformedResponse)
        ));

        let null_content: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#)?;
        assert!(matches!(
            extract_reply(null_content),
            Err(CompletionError::MalformedResponse)
        ));
        Ok(())
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            OpenAiChatModel::new(&config),
            Err(CompletionError::MissingApiKey)
        ));
    }
}
