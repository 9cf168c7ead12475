//! Shared test helpers and a scripted chat backend.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::{mpsc, oneshot};
use futures::stream;

use parlance::error::ParlanceError;
use parlance::provider::{
    ByteStream, ConversationRequest, RetrievalAnswer, RetrievalQuery, StreamingCall, TextCall,
};
use parlance::session::TranscriptSink;
use parlance::types::Message;

/// Sender side of a gated stream; drop it to end the body.
pub type ChunkSender = mpsc::UnboundedSender<Result<Vec<u8>, ParlanceError>>;

enum StreamStep {
    Body(ByteStream),
    Fail(ParlanceError),
    Stall,
}

enum AnswerStep {
    Answer(String),
    Gated(oneshot::Receiver<String>),
    Fail(ParlanceError),
    Stall,
}

/// A backend that replays queued responses and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    streams: Mutex<VecDeque<StreamStep>>,
    answers: Mutex<VecDeque<AnswerStep>>,
    conversation_requests: Mutex<Vec<ConversationRequest>>,
    retrieval_queries: Mutex<Vec<RetrievalQuery>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a streamed body made of the given text chunks.
    pub fn queue_chunks(&self, chunks: &[&str]) {
        let items: Vec<Result<Vec<u8>, ParlanceError>> =
            chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        self.push_stream(StreamStep::Body(Box::pin(stream::iter(items))));
    }

    /// Queue a body that fails after the given chunks.
    pub fn queue_chunks_then_error(&self, chunks: &[&str]) {
        let mut items: Vec<Result<Vec<u8>, ParlanceError>> =
            chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        items.push(Err(ParlanceError::Stream("connection reset".to_string())));
        self.push_stream(StreamStep::Body(Box::pin(stream::iter(items))));
    }

    /// Queue a body whose chunks the test feeds by hand.
    pub fn queue_gated_stream(&self) -> ChunkSender {
        let (tx, rx) = mpsc::unbounded();
        self.push_stream(StreamStep::Body(Box::pin(rx)));
        tx
    }

    /// Queue a non-success status for the next prompt-mode request.
    pub fn queue_stream_status(&self, status: u16) {
        self.push_stream(StreamStep::Fail(ParlanceError::api(status, "scripted failure")));
    }

    /// Queue a prompt-mode request that never resolves.
    pub fn queue_stream_stall(&self) {
        self.push_stream(StreamStep::Stall);
    }

    pub fn queue_answer(&self, answer: &str) {
        self.push_answer(AnswerStep::Answer(answer.to_string()));
    }

    /// Queue an answer the test releases by hand.
    pub fn queue_gated_answer(&self) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.push_answer(AnswerStep::Gated(rx));
        tx
    }

    pub fn queue_answer_status(&self, status: u16) {
        self.push_answer(AnswerStep::Fail(ParlanceError::api(status, "index not found")));
    }

    pub fn queue_answer_stall(&self) {
        self.push_answer(AnswerStep::Stall);
    }

    pub fn conversation_requests(&self) -> Vec<ConversationRequest> {
        self.conversation_requests.lock().unwrap().clone()
    }

    pub fn retrieval_queries(&self) -> Vec<RetrievalQuery> {
        self.retrieval_queries.lock().unwrap().clone()
    }

    fn push_stream(&self, step: StreamStep) {
        self.streams.lock().unwrap().push_back(step);
    }

    fn push_answer(&self, step: AnswerStep) {
        self.answers.lock().unwrap().push_back(step);
    }
}

#[async_trait]
impl StreamingCall for ScriptedBackend {
    async fn stream_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ByteStream, ParlanceError> {
        self.conversation_requests.lock().unwrap().push(request.clone());
        let step = self.streams.lock().unwrap().pop_front();
        match step {
            Some(StreamStep::Body(body)) => Ok(body),
            Some(StreamStep::Fail(err)) => Err(err),
            Some(StreamStep::Stall) => futures::future::pending().await,
            None => Err(ParlanceError::Stream("no scripted stream".to_string())),
        }
    }
}

#[async_trait]
impl TextCall for ScriptedBackend {
    async fn query_retrieval(
        &self,
        query: &RetrievalQuery,
    ) -> Result<RetrievalAnswer, ParlanceError> {
        self.retrieval_queries.lock().unwrap().push(query.clone());
        let step = self.answers.lock().unwrap().pop_front();
        match step {
            Some(AnswerStep::Answer(response)) => Ok(RetrievalAnswer { response }),
            Some(AnswerStep::Gated(rx)) => rx
                .await
                .map(|response| RetrievalAnswer { response })
                .map_err(|_| ParlanceError::Stream("answer gate dropped".to_string())),
            Some(AnswerStep::Fail(err)) => Err(err),
            Some(AnswerStep::Stall) => futures::future::pending().await,
            None => Err(ParlanceError::Stream("no scripted answer".to_string())),
        }
    }
}

/// A transcript sink that records every published snapshot.
pub fn recording_sink() -> (TranscriptSink, Arc<Mutex<Vec<Vec<Message>>>>) {
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let recorder = snapshots.clone();
    let sink: TranscriptSink = Arc::new(move |messages: &[Message]| {
        recorder.lock().unwrap().push(messages.to_vec());
    });
    (sink, snapshots)
}
