//! Display rendering of a conversation.

use std::iter::FusedIterator;
use std::slice;

use serde::Serialize;

use crate::chat::core::message::Message;

/// One labeled, displayable turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct TranscriptEntry<'a> {
    /// `"You"` or `"Assistant"`.
    pub speaker: &'static str,
    /// Message text.
    pub text: &'a str,
}

/// Lazy view over the non-system messages of a session.
///
/// Finite and side-effect free. Cloning forks the cursor; call
/// `render_transcript` again for a fresh pass.
#[derive(Clone, Debug)]
pub struct Transcript<'a> {
    inner: slice::Iter<'a, Message>,
}

impl<'a> Transcript<'a> {
    pub(crate) fn new(messages: &'a [Message]) -> Self {
        Self {
            inner: messages.iter(),
        }
    }

    /// Fold the transcript into the export blob
    /// (`"You: ...\n\nAssistant: ...\n\n"`).
    #[must_use]
    pub fn to_text(self) -> String {
        let mut out = String::new();
        for entry in self {
            out.push_str(entry.speaker);
            out.push_str(": ");
            out.push_str(entry.text);
            out.push_str("\n\n");
        }
        out
    }
}

impl<'a> Iterator for Transcript<'a> {
    type Item = TranscriptEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find_map(|message| {
            message.role.speaker_label().map(|speaker| TranscriptEntry {
                speaker,
                text: &message.content,
            })
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl FusedIterator for Transcript<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Message> {
        vec![
            Message::system("hidden"),
            Message::assistant("What's on your heart today?"),
            Message::user("I'm anxious about work"),
            Message::assistant("That sounds heavy."),
        ]
    }

    #[test]
    fn test_system_message_is_skipped() {
        let messages = sample();
        let entries: Vec<_> = Transcript::new(&messages).collect();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.text != "hidden"));
        assert_eq!(
            entries.iter().map(|e| e.speaker).collect::<Vec<_>>(),
            vec!["Assistant", "You", "Assistant"]
        );
    }

    #[test]
    fn test_clone_forks_the_cursor() {
        let messages = sample();
        let mut first = Transcript::new(&messages);
        let _ = first.next();
        let forked = first.clone();
        assert_eq!(first.count(), 2);
        assert_eq!(forked.count(), 2);
    }

    #[test]
    fn test_to_text_format() {
        let messages = sample();
        assert_eq!(
            Transcript::new(&messages).to_text(),
            "Assistant: What's on your heart today?\n\nYou: I'm anxious about work\n\nAssistant: That sounds heavy.\n\n"
        );
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(Transcript::new(&[]).count(), 0);
        assert_eq!(Transcript::new(&[]).to_text(), "");
    }
}
