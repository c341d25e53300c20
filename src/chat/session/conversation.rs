//! Conversation session state.
//!
//! A session holds the active persona and the ordered message sequence that
//! is replayed to the model on every turn. The sequence always starts with
//! `[system(persona), assistant(persona.starting_prompt)]` and is otherwise
//! append-only until the persona changes or a reset is requested.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::chat::core::message::{Message, UserMessage};
use crate::chat::core::persona::Persona;
use crate::chat::session::transcript::Transcript;
use crate::llm::{CompletionError, CompletionModel, GenerationParams};

/// Separator between the model reply and appended text.
const REPLY_SEPARATOR: &str = "\n\n";

/// What one successful submission produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmittedTurn {
    /// Concatenated content of every message sent to the model.
    pub prompt_text: String,
    /// Reply exactly as returned by the model.
    pub model_reply: String,
    /// Reply as stored in the session (anchor and follow-up appended).
    pub stored_reply: String,
}

/// Mutable state of one interactive conversation.
#[derive(Clone, Debug)]
pub struct ConversationSession {
    persona: Persona,
    messages: Vec<Message>,
}

impl ConversationSession {
    /// Start a conversation with `persona`.
    #[must_use]
    pub fn new(persona: &Persona) -> Self {
        Self {
            persona: persona.clone(),
            messages: initial_messages(persona),
        }
    }

    /// Active persona.
    #[must_use]
    pub const fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Ordered message sequence, system message included.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Switch persona. Returns `false` (and changes nothing) when `persona`
    /// is already active; otherwise prior history is discarded.
    pub fn select_persona(&mut self, persona: &Persona) -> bool {
        if persona.id == self.persona.id {
            return false;
        }
        self.persona = persona.clone();
        self.reset();
        true
    }

    /// Reinitialize the sequence for the current persona.
    pub fn reset(&mut self) {
        self.messages = initial_messages(&self.persona);
    }

    /// Append a user turn, ask the model for a reply with the full sequence
    /// as context, and append the reply.
    ///
    /// On failure the user turn is removed again so the session is exactly
    /// as before the call.
    ///
    /// # Errors
    /// Returns the model's error unchanged.
    pub fn submit_user_message<R>(
        &mut self,
        message: &UserMessage,
        model: &dyn CompletionModel,
        params: &GenerationParams,
        rng: &mut R,
    ) -> Result<SubmittedTurn, CompletionError>
    where
        R: Rng + ?Sized,
    {
        self.messages.push(Message::user(message.as_str()));
        let prompt_text: String = self.messages.iter().map(|m| m.content.as_str()).collect();

        let model_reply = match model.complete(&self.messages, params) {
            Ok(reply) => reply,
            Err(err) => {
                self.messages.pop();
                return Err(err);
            }
        };

        let stored_reply = decorate_reply(&self.persona, message.as_str(), &model_reply, rng);
        self.messages.push(Message::assistant(stored_reply.clone()));

        Ok(SubmittedTurn {
            prompt_text,
            model_reply,
            stored_reply,
        })
    }

    /// Labeled user/assistant turns, system message skipped.
    #[must_use]
    pub fn render_transcript(&self) -> Transcript<'_> {
        Transcript::new(&self.messages)
    }

    /// Transcript folded into the plain export form.
    #[must_use]
    pub fn transcript_text(&self) -> String {
        self.render_transcript().to_text()
    }
}

fn initial_messages(persona: &Persona) -> Vec<Message> {
    vec![
        Message::system(persona.system_instruction()),
        Message::assistant(persona.starting_prompt.clone()),
    ]
}

fn decorate_reply<R>(persona: &Persona, user_text: &str, reply: &str, rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    let mut out = reply.to_string();

    if let Some(anchor) = persona.anchor.as_ref().filter(|a| a.matches(user_text)) {
        out.push_str(REPLY_SEPARATOR);
        out.push_str(&anchor.text);
    }

    if let Some(follow_up) = persona.follow_ups.choose(rng) {
        out.push_str(REPLY_SEPARATOR);
        out.push_str(follow_up);
    }

    out
}
