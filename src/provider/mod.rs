//! Backend capabilities the session engine depends on.
//!
//! The engine never talks HTTP itself: it needs a streaming call for prompt
//! mode and a single-shot text call for retrieval mode. `http` provides the
//! reqwest-backed implementation; tests substitute scripted backends.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::ParlanceError;
use crate::types::Message;

/// Raw body chunks of a streamed response.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ParlanceError>>;

/// Prompt-mode request body: `{prompt, input}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub prompt: String,
    /// Conversation window, oldest first, ending with the new user message.
    pub input: Vec<Message>,
}

/// Retrieval-mode request parameters, carried in the URL query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub query: String,
    pub namespace: String,
    pub index_name: String,
    /// Pipe-delimited log of earlier questions.
    pub questions: String,
    /// Pipe-delimited log of earlier answers.
    pub answers: String,
}

/// Retrieval-mode response body: `{response}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalAnswer {
    pub response: String,
}

/// Capability to issue a prompt-mode request and read its body as a stream.
///
/// A non-success status must surface as `Err` before any body is read.
#[async_trait]
pub trait StreamingCall: Send + Sync {
    async fn stream_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ByteStream, ParlanceError>;
}

/// Capability to issue a retrieval-mode request and decode one JSON answer.
#[async_trait]
pub trait TextCall: Send + Sync {
    async fn query_retrieval(
        &self,
        query: &RetrievalQuery,
    ) -> Result<RetrievalAnswer, ParlanceError>;
}

/// A backend able to serve both session modes.
pub trait ChatBackend: StreamingCall + TextCall {}

impl<T: StreamingCall + TextCall + ?Sized> ChatBackend for T {}

#[async_trait]
impl<T: StreamingCall + ?Sized> StreamingCall for Arc<T> {
    async fn stream_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ByteStream, ParlanceError> {
        (**self).stream_conversation(request).await
    }
}

#[async_trait]
impl<T: TextCall + ?Sized> TextCall for Arc<T> {
    async fn query_retrieval(
        &self,
        query: &RetrievalQuery,
    ) -> Result<RetrievalAnswer, ParlanceError> {
        (**self).query_retrieval(query).await
    }
}
