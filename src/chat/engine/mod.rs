//! Turn orchestration over sessions, model and usage estimator.

pub mod core;

pub use self::core::{ChatBackends, ChatEngine, TurnReport};
