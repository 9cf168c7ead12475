//! Transcript reducer events.

use serde::{Deserialize, Serialize};

/// A logical event applied to the transcript.
///
/// The session engine is the only producer; every branch of a submission
/// emits exactly one event per logical occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEvent {
    /// The user submitted text; opens a turn.
    UserSubmitted { content: String },
    /// A streamed turn produced more output. Carries the full accumulation.
    ChunkReceived { output: String },
    /// A streamed turn reached the end of its body.
    StreamCompleted,
    /// A single-shot turn produced its answer.
    AnswerReceived { content: String },
    /// The turn failed; the fallback text is shown in place of any output.
    RequestFailed { fallback: String },
}

impl TranscriptEvent {
    /// Whether this event closes the open turn.
    pub fn closes_turn(&self) -> bool {
        matches!(
            self,
            Self::StreamCompleted | Self::AnswerReceived { .. } | Self::RequestFailed { .. }
        )
    }
}
