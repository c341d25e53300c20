//! Session state: the ordered conversation for the active persona.

pub mod conversation;
pub mod transcript;

pub use conversation::{ConversationSession, SubmittedTurn};
pub use transcript::{Transcript, TranscriptEntry};
