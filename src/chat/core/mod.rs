//! Core chat types: configuration, errors, identifiers, messages, personas.

pub mod config;
pub mod errors;
pub mod ids;
pub mod message;
pub mod persona;

pub use config::{CatalogConfig, ChatConfig, LlmConfig, ProviderKind, ServerConfig};
pub use errors::{ChatError, ChatResult};
pub use ids::SessionId;
pub use message::{Message, Role, UserMessage};
pub use persona::{Anchor, GospelClarity, Persona, PersonaCatalog};
