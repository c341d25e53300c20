//! Usage estimation: unit counting and cost conversion.

pub mod estimator;
pub mod tokenizer;

pub use estimator::{Pricing, UsageEstimate, estimate};
pub use tokenizer::{TiktokenCounter, TokenCounter};
