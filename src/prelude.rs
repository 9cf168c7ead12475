//! Convenience re-exports for common use.

pub use crate::config::{CallPolicy, EndpointConfig};
pub use crate::error::{ParlanceError, Result};
pub use crate::provider::{ChatBackend, StreamingCall, TextCall};
pub use crate::session::{
    KnowledgeSource, SessionConfig, SessionEngine, SessionMode, SubmitOutcome, Transcript,
};
pub use crate::types::{Message, Role, TranscriptEvent};
pub use crate::upload::KnowledgeUploader;
