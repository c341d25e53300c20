//! Configuration for the chat service.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::usage::Pricing;
use crate::llm::GenerationParams;

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// HTTP shell settings.
    pub server: ServerConfig,
    /// Completion model settings.
    pub llm: LlmConfig,
    /// Per-1000-unit rates used for cost estimates.
    pub pricing: Pricing,
    /// Persona catalog source.
    pub catalog: CatalogConfig,
}

impl ChatConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a key lookup, starting from defaults.
    ///
    /// # Errors
    /// Returns an error if a value is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_var(&lookup, "BARNABAS_PORT")? {
            config.server.port = port;
        }
        if let Some(ttl) = parse_var(&lookup, "BARNABAS_SESSION_TTL_SECS")? {
            config.server.session_ttl_secs = ttl;
        }
        if let Some(dir) = lookup("BARNABAS_STATIC_DIR") {
            config.server.static_dir = PathBuf::from(dir);
        }
        if let Some(provider) = parse_var(&lookup, "BARNABAS_PROVIDER")? {
            config.llm.provider = provider;
        }
        if let Some(model) = lookup("BARNABAS_MODEL") {
            config.llm.model = model;
        }
        if let Some(api_url) = lookup("BARNABAS_API_URL") {
            config.llm.api_url = api_url;
        }
        config.llm.api_key = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty());
        if let Some(temperature) = parse_var(&lookup, "BARNABAS_TEMPERATURE")? {
            config.llm.temperature = temperature;
        }
        if let Some(max_tokens) = parse_var(&lookup, "BARNABAS_MAX_TOKENS")? {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(timeout) = parse_var(&lookup, "BARNABAS_TIMEOUT_SECS")? {
            config.llm.timeout_secs = timeout;
        }
        if let Some(rate) = parse_var(&lookup, "BARNABAS_PRICE_INPUT_PER_1K")? {
            config.pricing.input_per_1k = rate;
        }
        if let Some(rate) = parse_var(&lookup, "BARNABAS_PRICE_OUTPUT_PER_1K")? {
            config.pricing.output_per_1k = rate;
        }
        if let Some(path) = lookup("BARNABAS_PERSONAS") {
            config.catalog.path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatResult<()> {
        if self.llm.model.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "llm.model must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ChatError::InvalidConfig(
                "llm.temperature must be within 0.0..=2.0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(ChatError::InvalidConfig(
                "llm.max_tokens must be > 0".to_string(),
            ));
        }

        if self.server.session_ttl_secs == 0 {
            return Err(ChatError::InvalidConfig(
                "server.session_ttl_secs must be > 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ChatError::InvalidConfig(
                "llm.timeout_secs must be > 0".to_string(),
            ));
        }

        for (name, rate) in [
            ("pricing.input_per_1k", self.pricing.input_per_1k),
            ("pricing.output_per_1k", self.pricing.output_per_1k),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ChatError::InvalidConfig(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }

        if self.llm.provider == ProviderKind::OpenAi {
            Url::parse(&self.llm.api_url)?;
            if self.llm.api_key.is_none() {
                return Err(ChatError::InvalidConfig(format!(
                    "{API_KEY_ENV} must be set for the openai provider"
                )));
            }
        }

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ChatResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|err| ChatError::InvalidConfig(format!("{key}={raw}: {err}")))
        })
        .transpose()
}

/// HTTP shell settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Directory holding the single-page form.
    pub static_dir: PathBuf,
    /// Idle seconds after which a session is dropped.
    pub session_ttl_secs: u64,
}

impl ServerConfig {
    /// Idle time after which a session is dropped.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// How often idle sessions are swept: every minute, or sooner for
    /// short TTLs.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.session_ttl()
            .clamp(Duration::from_secs(1), Duration::from_secs(60))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: PathBuf::from("static"),
            session_ttl_secs: 3600,
        }
    }
}

/// Which completion backend to talk to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions endpoint.
    #[default]
    OpenAi,
    /// Offline echo model.
    Echo,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "echo" => Ok(Self::Echo),
            other => Err(format!("unknown provider {other}")),
        }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend kind.
    pub provider: ProviderKind,
    /// Model name, also used to pick the tokenizer.
    pub model: String,
    /// Base URL of the chat completions API.
    pub api_url: String,
    /// Bearer key; never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Creativity parameter.
    pub temperature: f32,
    /// Maximum reply length in tokens.
    pub max_tokens: u32,
    /// HTTP client timeout.
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Generation parameters sent with every request.
    #[must_use]
    pub const fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: "gpt-3.5-turbo".to_string(),
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 1200,
            timeout_secs: 120,
        }
    }
}

/// Persona catalog source.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// External JSON file; the bundled catalog is used when unset.
    pub path: Option<PathBuf>,
}
