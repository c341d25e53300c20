//! Chat subsystem for the Barnabas service.
//!
//! Organized into:
//! - `core`: configuration, errors, identifiers, messages and personas
//! - `session`: per-conversation state and transcript rendering
//! - `usage`: unit counting and cost estimation
//! - `engine`: one-turn orchestration over the pieces above

pub mod core;
pub mod engine;
pub mod session;
pub mod usage;

pub use self::core::{
    Anchor, CatalogConfig, ChatConfig, ChatError, ChatResult, GospelClarity, LlmConfig, Message,
    Persona, PersonaCatalog, ProviderKind, Role, ServerConfig, SessionId, UserMessage,
};
pub use engine::{ChatBackends, ChatEngine, TurnReport};
pub use session::{ConversationSession, SubmittedTurn, Transcript, TranscriptEntry};
pub use usage::{Pricing, TiktokenCounter, TokenCounter, UsageEstimate, estimate};
