//! Chat engine orchestration.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::chat::core::config::{ChatConfig, ProviderKind};
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::message::UserMessage;
use crate::chat::core::persona::{Persona, PersonaCatalog};
use crate::chat::session::conversation::ConversationSession;
use crate::chat::usage::{Pricing, TiktokenCounter, TokenCounter, UsageEstimate};
use crate::llm::{CompletionModel, EchoModel, GenerationParams, OpenAiChatModel};

/// Outcome of one completed turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnReport {
    /// Reply as stored in the session.
    pub reply: String,
    /// Estimated usage for the request/response pair.
    pub usage: UsageEstimate,
}

/// Collaborators the engine drives.
pub struct ChatBackends {
    /// Completion model.
    pub model: Arc<dyn CompletionModel>,
    /// Unit counter for usage estimates.
    pub counter: Arc<dyn TokenCounter>,
}

impl ChatBackends {
    /// Build backends selected by configuration.
    ///
    /// # Errors
    /// Returns an error if the model client or tokenizer cannot be created.
    pub fn from_config(config: &ChatConfig) -> ChatResult<Self> {
        let model: Arc<dyn CompletionModel> = match config.llm.provider {
            ProviderKind::OpenAi => Arc::new(OpenAiChatModel::new(&config.llm)?),
            ProviderKind::Echo => Arc::new(EchoModel::new()),
        };
        let counter = Arc::new(TiktokenCounter::for_model(&config.llm.model)?);
        Ok(Self { model, counter })
    }
}

/// Runs turns against a persona catalog, a model and a unit counter.
///
/// Sessions are owned by the caller and passed in by reference.
pub struct ChatEngine {
    catalog: PersonaCatalog,
    model: Arc<dyn CompletionModel>,
    counter: Arc<dyn TokenCounter>,
    pricing: Pricing,
    params: GenerationParams,
}

impl ChatEngine {
    /// Create an engine from explicit collaborators.
    #[must_use]
    pub fn new(config: &ChatConfig, catalog: PersonaCatalog, backends: ChatBackends) -> Self {
        Self {
            catalog,
            model: backends.model,
            counter: backends.counter,
            pricing: config.pricing,
            params: config.llm.generation_params(),
        }
    }

    /// Create an engine with the configured catalog and backends.
    ///
    /// # Errors
    /// Returns an error if configuration, catalog or backends are invalid.
    pub fn from_config(config: &ChatConfig) -> ChatResult<Self> {
        config.validate()?;
        let catalog = match &config.catalog.path {
            Some(path) => PersonaCatalog::load(path)?,
            None => PersonaCatalog::builtin()?,
        };
        info!(
            personas = catalog.len(),
            source = ?config.catalog.path,
            "persona catalog loaded"
        );
        let backends = ChatBackends::from_config(config)?;
        Ok(Self::new(config, catalog, backends))
    }

    /// Persona catalog.
    #[must_use]
    pub const fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    /// Persona metadata by id.
    ///
    /// # Errors
    /// Returns [`ChatError::UnknownPersona`] for ids outside the catalog.
    pub fn persona(&self, id: &str) -> ChatResult<&Persona> {
        self.catalog.resolve(id)
    }

    /// Rates used for estimates.
    #[must_use]
    pub const fn pricing(&self) -> Pricing {
        self.pricing
    }

    /// Name of the completion model.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Start a session with `persona_id`, or the catalog default.
    ///
    /// # Errors
    /// Returns [`ChatError::UnknownPersona`] for ids outside the catalog.
    pub fn start_session(&self, persona_id: Option<&str>) -> ChatResult<ConversationSession> {
        let persona = match persona_id {
            Some(id) => self.catalog.resolve(id)?,
            None => self.catalog.default_persona(),
        };
        debug!(persona = %persona.id, "session started");
        Ok(ConversationSession::new(persona))
    }

    /// Resolve `persona_id` and select it on `session`.
    ///
    /// Returns whether the persona changed.
    ///
    /// # Errors
    /// Returns [`ChatError::UnknownPersona`] for ids outside the catalog.
    pub fn select_persona(
        &self,
        session: &mut ConversationSession,
        persona_id: &str,
    ) -> ChatResult<bool> {
        let persona = self.catalog.resolve(persona_id)?;
        let changed = session.select_persona(persona);
        if changed {
            info!(persona = %persona.id, "persona switched, history cleared");
        }
        Ok(changed)
    }

    /// Run one full turn: append the user message, call the model, append
    /// the reply and estimate usage.
    ///
    /// Usage counts every message sent to the model as input and the raw
    /// model reply as output.
    ///
    /// # Errors
    /// Returns [`ChatError::EmptyMessage`] for blank input and
    /// [`ChatError::Completion`] when the model call fails.
    pub fn run_turn<R>(
        &self,
        session: &mut ConversationSession,
        text: &str,
        rng: &mut R,
    ) -> ChatResult<TurnReport>
    where
        R: Rng + ?Sized,
    {
        let message = UserMessage::new(text)?;
        let turn = session
            .submit_user_message(&message, self.model.as_ref(), &self.params, rng)
            .map_err(ChatError::from)?;

        let usage = self
            .pricing
            .estimate(self.counter.as_ref(), &turn.prompt_text, &turn.model_reply);

        info!(
            persona = %session.persona().id,
            model = self.model.name(),
            input_units = usage.input_units,
            output_units = usage.output_units,
            total_cost = usage.total_cost,
            "turn completed"
        );

        Ok(TurnReport {
            reply: turn.stored_reply,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::chat::core::message::Role;
    use crate::chat::core::persona::tests::persona;
    use crate::chat::usage::estimator::tests::WordCounter;
    use crate::llm::testing::{FailingModel, ScriptedModel};

    fn engine_with(model: Arc<dyn CompletionModel>) -> ChatResult<ChatEngine> {
        let catalog = PersonaCatalog::new(vec![
            persona("just_talk", "What's on your heart today?"),
            persona("evangelism", "Where are you at in your journey with faith or God?"),
        ])?;
        let backends = ChatBackends {
            model,
            counter: Arc::new(WordCounter),
        };
        Ok(ChatEngine::new(&ChatConfig::default(), catalog, backends))
    }

    #[test]
    fn test_start_session_default_and_named() -> ChatResult<()> {
        let engine = engine_with(Arc::new(ScriptedModel::new("ok")))?;
        assert_eq!(engine.start_session(None)?.persona().id, "just_talk");
        assert_eq!(
            engine.start_session(Some("evangelism"))?.persona().id,
            "evangelism"
        );
        assert!(matches!(
            engine.start_session(Some("missing")),
            Err(ChatError::UnknownPersona(_))
        ));
        Ok(())
    }

    #[test]
    fn test_run_turn_estimates_full_transcript_input() -> ChatResult<()> {
        let engine = engine_with(Arc::new(ScriptedModel::new("three word reply")))?;
        let mut session = engine.start_session(Some("just_talk"))?;
        let mut rng = StdRng::seed_from_u64(11);

        let report = engine.run_turn(&mut session, "anxious about work", &mut rng)?;

        let sent: String = session.messages()[..3]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(report.usage.input_units, WordCounter.count(&sent));
        assert_eq!(report.usage.output_units, 3);
        assert_eq!(report.reply, "three word reply");
        assert!(report.usage.total_cost > 0.0);
        Ok(())
    }

    #[test]
    fn test_run_turn_rejects_blank_input() -> ChatResult<()> {
        let model = Arc::new(ScriptedModel::new("ok"));
        let engine = engine_with(model.clone())?;
        let mut session = engine.start_session(None)?;
        let mut rng = StdRng::seed_from_u64(12);

        assert!(matches!(
            engine.run_turn(&mut session, "   ", &mut rng),
            Err(ChatError::EmptyMessage)
        ));
        assert_eq!(session.messages().len(), 2);
        assert!(model.calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_run_turn_propagates_model_failure() -> ChatResult<()> {
        let engine = engine_with(Arc::new(FailingModel))?;
        let mut session = engine.start_session(None)?;
        let mut rng = StdRng::seed_from_u64(13);

        let result = engine.run_turn(&mut session, "hello", &mut rng);
        assert!(matches!(result, Err(ChatError::Completion(_))));
        assert_eq!(session.messages().len(), 2);
        Ok(())
    }

    #[test]
    fn test_select_persona_via_engine() -> ChatResult<()> {
        let engine = engine_with(Arc::new(ScriptedModel::new("ok")))?;
        let mut session = engine.start_session(Some("just_talk"))?;
        let mut rng = StdRng::seed_from_u64(14);
        engine.run_turn(&mut session, "hello", &mut rng)?;

        assert!(!engine.select_persona(&mut session, "just_talk")?);
        assert_eq!(session.messages().len(), 4);

        assert!(engine.select_persona(&mut session, "evangelism")?);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].role, Role::Assistant);

        assert!(engine.select_persona(&mut session, "nope").is_err());
        assert_eq!(session.persona().id, "evangelism");
        Ok(())
    }

    #[test]
    fn test_from_config_with_echo_provider() -> ChatResult<()> {
        let mut config = ChatConfig::default();
        config.llm.provider = ProviderKind::Echo;
        let engine = ChatEngine::from_config(&config)?;
        assert_eq!(engine.model_name(), "echo");
        assert!(engine.persona("just_talk").is_ok());

        let mut session = engine.start_session(Some("just_talk"))?;
        let mut rng = StdRng::seed_from_u64(15);
        let report = engine.run_turn(&mut session, "I'm anxious about work", &mut rng)?;
        assert!(report.reply.starts_with("You said: I'm anxious about work"));
        assert!(report.usage.input_units > 0);
        Ok(())
    }

    #[test]
    fn test_from_config_rejects_missing_catalog_file() {
        let mut config = ChatConfig::default();
        config.llm.provider = ProviderKind::Echo;
        config.catalog.path = Some("/nonexistent/personas.json".into());
        assert!(matches!(
            ChatEngine::from_config(&config),
            Err(ChatError::Io(_))
        ));
    }
}
