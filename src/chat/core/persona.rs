//! Persona records and the canonical persona catalog.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::chat::core::errors::{ChatError, ChatResult};

/// Catalog shipped with the crate, used when no external file is configured.
pub const DEFAULT_CATALOG_JSON: &str = include_str!("../../../personas/catalog.json");

/// How explicitly a persona presents the gospel.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GospelClarity {
    /// Rarely brought up unless asked.
    Low,
    /// Offered when the conversation turns that way.
    #[default]
    Medium,
    /// Stated plainly.
    High,
}

impl GospelClarity {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for GospelClarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upper bound on the compiled keyword pattern of one anchor.
const ANCHOR_PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Text appended to a reply when the user's message mentions a keyword.
///
/// The keyword pattern is compiled by [`Anchor::new`] or when the owning
/// persona enters a [`PersonaCatalog`]; an uncompiled anchor never matches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Anchor {
    /// Case-insensitive substrings that trigger the anchor.
    pub keywords: Vec<String>,
    /// Text appended to the reply.
    pub text: String,
    #[serde(skip)]
    pattern: Option<Regex>,
}

impl PartialEq for Anchor {
    fn eq(&self, other: &Self) -> bool {
        self.keywords == other.keywords && self.text == other.text
    }
}

impl Eq for Anchor {}

impl Anchor {
    /// Build an anchor and compile its keyword pattern.
    ///
    /// # Errors
    /// Returns [`ChatError::InvalidConfig`] if the keywords cannot be compiled.
    pub fn new(keywords: Vec<String>, text: impl Into<String>) -> ChatResult<Self> {
        let mut anchor = Self {
            keywords,
            text: text.into(),
            pattern: None,
        };
        anchor.compile()?;
        Ok(anchor)
    }

    /// Whether `message` contains any of the keywords.
    #[must_use]
    pub fn matches(&self, message: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(message))
    }

    fn compile(&mut self) -> ChatResult<()> {
        let alternatives: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| regex::escape(k.trim()))
            .collect();
        if alternatives.is_empty() {
            self.pattern = None;
            return Ok(());
        }
        let re = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .size_limit(ANCHOR_PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| ChatError::InvalidConfig(format!("anchor keywords: {e}")))?;
        self.pattern = Some(re);
        Ok(())
    }
}

/// Immutable persona configuration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Stable catalog key, e.g. `just_talk`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Tone descriptor used in the opening instruction.
    pub tone: String,
    /// Long-form description.
    pub description: String,
    /// Opening assistant prompt shown at conversation start.
    pub starting_prompt: String,
    /// Candidate follow-up questions.
    #[serde(default)]
    pub follow_ups: Vec<String>,
    /// Full instruction text overriding the tone/description template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Emotionally healthy classification.
    #[serde(default)]
    pub emotionally_healthy: bool,
    /// Gospel clarity level.
    #[serde(default)]
    pub gospel_clarity_level: GospelClarity,
    /// Suggested external resources.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Optional keyword-triggered addition to replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
}

impl Persona {
    /// Instruction sent as the first (system) message of every conversation.
    #[must_use]
    pub fn system_instruction(&self) -> String {
        match &self.system_prompt {
            Some(prompt) => prompt.clone(),
            None => format!(
                "You are a {} spiritual companion. {}",
                self.tone, self.description
            ),
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    personas: Vec<Persona>,
}

/// Ordered, validated set of personas.
#[derive(Clone, Debug)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// Build a catalog from personas, validating invariants.
    ///
    /// # Errors
    /// Returns an error if the catalog is empty, an id is blank or duplicated,
    /// a starting prompt is blank, or anchor keywords fail to compile.
    pub fn new(mut personas: Vec<Persona>) -> ChatResult<Self> {
        if personas.is_empty() {
            return Err(ChatError::InvalidConfig(
                "persona catalog must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(personas.len());
        for persona in &personas {
            if persona.id.trim().is_empty() {
                return Err(ChatError::InvalidConfig(
                    "persona id must not be blank".to_string(),
                ));
            }
            if !seen.insert(persona.id.as_str()) {
                return Err(ChatError::InvalidConfig(format!(
                    "duplicate persona id {}",
                    persona.id
                )));
            }
            if persona.starting_prompt.trim().is_empty() {
                return Err(ChatError::InvalidConfig(format!(
                    "persona {} has a blank starting_prompt",
                    persona.id
                )));
            }
        }

        for persona in &mut personas {
            if let Some(anchor) = persona.anchor.as_mut() {
                anchor.compile().map_err(|e| match e {
                    ChatError::InvalidConfig(msg) => {
                        ChatError::InvalidConfig(format!("persona {}: {msg}", persona.id))
                    }
                    other => other,
                })?;
            }
        }

        Ok(Self { personas })
    }

    /// Parse a catalog from its JSON form (`{"personas": [...]}`).
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> ChatResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.personas)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> ChatResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Catalog bundled with the crate.
    ///
    /// # Errors
    /// Returns an error if the bundled JSON is invalid.
    pub fn builtin() -> ChatResult<Self> {
        Self::from_json(DEFAULT_CATALOG_JSON)
    }

    /// Look up a persona by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Look up a persona by id, failing on unknown ids.
    ///
    /// # Errors
    /// Returns [`ChatError::UnknownPersona`] if the id is not in the catalog.
    pub fn resolve(&self, id: &str) -> ChatResult<&Persona> {
        self.get(id)
            .ok_or_else(|| ChatError::UnknownPersona(id.to_string()))
    }

    /// First persona, used as the default selection.
    #[must_use]
    pub fn default_persona(&self) -> &Persona {
        &self.personas[0]
    }

    /// All personas in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    /// Number of personas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Always false for a validated catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
