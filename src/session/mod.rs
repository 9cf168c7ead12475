//! Conversation sessions: transcript, context derivation and the engine.

pub mod config;
pub mod engine;
pub mod retrieval_log;
pub mod stream;
pub mod transcript;
pub mod window;

pub use config::{ChatbotRecord, KnowledgeSource, SessionConfig, SessionMode, DEFAULT_GREETING};
pub use engine::{
    SessionEngine, SubmitOutcome, TranscriptSink, PROMPT_FALLBACK, RETRIEVAL_FALLBACK,
};
pub use retrieval_log::RetrievalLog;
pub use transcript::Transcript;
pub use window::conversation_window;
