//! Transcript store: the ordered message history of one active session.

use crate::types::{Message, TranscriptEvent};

/// Ordered messages of the active session.
///
/// Never empty once constructed; element 0 is the assistant greeting right
/// after a reset. All mutation goes through [`Transcript::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Length of the transcript just after the open turn's user message.
    turn_base: Option<usize>,
}

impl Transcript {
    /// Create a transcript seeded with a greeting.
    pub fn seeded(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            turn_base: None,
        }
    }

    /// Discard everything and re-seed with a greeting.
    pub fn reset(&mut self, greeting: impl Into<String>) {
        self.messages.clear();
        self.messages.push(Message::assistant(greeting));
        self.turn_base = None;
    }

    /// Apply a reducer event.
    ///
    /// Turn output events rebuild the tail from the open turn's user message,
    /// so the trailing assistant message always holds the full output so far.
    /// Output events without an open turn are ignored.
    pub fn apply(&mut self, event: &TranscriptEvent) {
        match event {
            TranscriptEvent::UserSubmitted { content } => {
                self.messages.push(Message::user(content.clone()));
                self.turn_base = Some(self.messages.len());
            }
            TranscriptEvent::ChunkReceived { output } => {
                self.replace_turn_output(output);
            }
            TranscriptEvent::StreamCompleted => {}
            TranscriptEvent::AnswerReceived { content } => {
                self.replace_turn_output(content);
            }
            TranscriptEvent::RequestFailed { fallback } => {
                self.replace_turn_output(fallback);
            }
        }

        if event.closes_turn() {
            self.turn_base = None;
        }
    }

    fn replace_turn_output(&mut self, text: &str) {
        let Some(base) = self.turn_base else {
            tracing::debug!("Ignoring turn output with no open turn");
            return;
        };
        self.messages.truncate(base);
        self.messages.push(Message::assistant(text));
    }

    /// Get all messages.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether only the seed greeting is present.
    pub fn is_seed_only(&self) -> bool {
        self.messages.len() < 2
    }

    /// Whether a turn is open (user message appended, output pending).
    pub fn has_open_turn(&self) -> bool {
        self.turn_base.is_some()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
