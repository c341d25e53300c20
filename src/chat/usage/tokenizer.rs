//! Sub-word unit counting.

use tiktoken_rs::CoreBPE;

use crate::chat::core::errors::{ChatError, ChatResult};

/// Counts model-specific sub-word units in arbitrary text.
///
/// Counting never fails: any valid UTF-8 string is tokenizable.
pub trait TokenCounter: Send + Sync {
    /// Number of units in `text`.
    fn count(&self, text: &str) -> usize;
}

/// BPE counter backed by `tiktoken-rs`.
pub struct TiktokenCounter {
    bpe: CoreBPE,
    encoding: &'static str,
}

impl TiktokenCounter {
    /// Resolve the encoding for `model`, falling back to `cl100k_base` for
    /// model names the tokenizer does not know.
    ///
    /// # Errors
    /// Returns an error if no encoding can be loaded at all.
    pub fn for_model(model: &str) -> ChatResult<Self> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Ok(Self {
                bpe,
                encoding: "model",
            }),
            Err(err) => {
                tracing::warn!(model, error = %err, "unknown tokenizer model, using cl100k_base");
                Self::cl100k()
            }
        }
    }

    /// The `cl100k_base` encoding.
    ///
    /// # Errors
    /// Returns an error if the encoding cannot be loaded.
    pub fn cl100k() -> ChatResult<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| ChatError::Tokenizer(e.to_string()))?;
        Ok(Self {
            bpe,
            encoding: "cl100k_base",
        })
    }

    /// Whether the encoding came from the model name or the fallback.
    #[must_use]
    pub const fn encoding(&self) -> &'static str {
        self.encoding
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cl100k_counts() -> ChatResult<()> {
        let counter = TiktokenCounter::cl100k()?;
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("hello world"), 2);
        assert!(counter.count("I'm anxious about work") >= 4);
        Ok(())
    }

    #[test]
    fn test_known_model_uses_its_encoding() -> ChatResult<()> {
        let counter = TiktokenCounter::for_model("gpt-3.5-turbo")?;
        assert_eq!(counter.encoding(), "model");
        Ok(())
    }

    #[test]
    fn test_unknown_model_falls_back() -> ChatResult<()> {
        let counter = TiktokenCounter::for_model("definitely-not-a-model")?;
        assert_eq!(counter.encoding(), "cl100k_base");
        assert_eq!(counter.count("hello world"), 2);
        Ok(())
    }

    #[test]
    fn test_more_text_never_counts_less() -> ChatResult<()> {
        let counter = TiktokenCounter::cl100k()?;
        let short = counter.count("Grace and peace");
        let long = counter.count("Grace and peace to you from God our Father");
        assert!(long >= short);
        Ok(())
    }
}
