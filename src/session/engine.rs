//! Session engine: the single mutation path into a conversation.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use tracing::{debug, warn};

use crate::config::CallPolicy;
use crate::error::{ParlanceError, Result};
use crate::provider::{ChatBackend, ConversationRequest, RetrievalQuery};
use crate::types::{Message, TranscriptEvent};
use crate::util::timeout::with_optional_timeout;

use super::config::{KnowledgeSource, SessionConfig, SessionMode, MIN_PROMPT_CHARS};
use super::retrieval_log::RetrievalLog;
use super::stream::accumulated_output;
use super::transcript::Transcript;
use super::window::conversation_window;

/// Assistant message shown when a prompt-mode turn fails.
pub const PROMPT_FALLBACK: &str =
    "Sorry, We ran into an error. Please refresh the page and try again.";

/// Assistant message shown when a retrieval-mode turn fails.
pub const RETRIEVAL_FALLBACK: &str =
    "Sorry, Your document is not in the index. Please upload a new document.";

/// Callback invoked with the full transcript after every change.
pub type TranscriptSink = Arc<dyn Fn(&[Message]) + Send + Sync>;

/// How a submitted turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend answered; the transcript holds its output.
    Answered,
    /// The backend failed; the transcript holds the fallback message.
    Degraded {
        status: Option<u16>,
        reason: String,
    },
}

impl SubmitOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered)
    }

    fn degraded(error: &ParlanceError) -> Self {
        Self::Degraded {
            status: error.status(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    config: SessionConfig,
    transcript: Transcript,
    retrieval_log: RetrievalLog,
    /// Bumped whenever the retrieval logs are replaced.
    log_generation: u64,
    input: String,
    busy: bool,
}

/// Request prepared while holding the state lock.
enum Dispatch {
    Prompt(ConversationRequest),
    Retrieval {
        query: RetrievalQuery,
        log_generation: u64,
    },
}

/// Orchestrates one conversation against a chat backend.
///
/// State sits behind a lock that is never held across a backend call, so the
/// presentation layer can read snapshots while a turn is in flight. At most
/// one submission runs at a time; a second one is rejected with
/// [`ParlanceError::Busy`].
pub struct SessionEngine<B> {
    backend: B,
    state: Arc<Mutex<SessionState>>,
    call_policy: CallPolicy,
    sink: Option<TranscriptSink>,
}

impl<B: ChatBackend> SessionEngine<B> {
    pub fn new(config: SessionConfig, backend: B) -> Self {
        let transcript = Transcript::seeded(config.greeting());
        Self {
            backend,
            state: Arc::new(Mutex::new(SessionState {
                config,
                transcript,
                retrieval_log: RetrievalLog::new(),
                log_generation: 0,
                input: String::new(),
                busy: false,
            })),
            call_policy: CallPolicy::default(),
            sink: None,
        }
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.call_policy = policy;
        self
    }

    pub fn with_transcript_sink(mut self, sink: TranscriptSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Transcript {
        self.state().transcript.clone()
    }

    /// Snapshot of the retrieval logs.
    pub fn retrieval_log(&self) -> RetrievalLog {
        self.state().retrieval_log.clone()
    }

    pub fn config(&self) -> SessionConfig {
        self.state().config.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state().busy
    }

    /// Pending input field contents.
    pub fn input(&self) -> String {
        self.state().input.clone()
    }

    /// Update the pending input field, capitalising its first character.
    pub fn set_input(&self, raw: &str) {
        self.state().input = capitalize_first(raw);
    }

    /// Whether `clear` would change anything.
    pub fn can_clear(&self) -> bool {
        !self.state().transcript.is_seed_only()
    }

    /// Reset the transcript to its greeting. Retrieval logs are kept.
    ///
    /// Returns `false` when only the greeting was present.
    pub fn clear(&self) -> bool {
        let snapshot = {
            let mut state = self.state();
            if state.transcript.is_seed_only() {
                return false;
            }
            let greeting = state.config.greeting().to_string();
            state.transcript.reset(greeting);
            state.transcript.messages().to_vec()
        };
        debug!("Transcript cleared");
        self.notify(&snapshot);
        true
    }

    /// Replace the session configuration.
    ///
    /// The transcript is re-seeded when the greeting changes and the retrieval
    /// logs reset when the knowledge source changes.
    pub fn update_config(&self, config: SessionConfig) {
        let snapshot = {
            let mut state = self.state();
            let greeting_changed = state.config.greeting() != config.greeting();
            if state.config.mode.knowledge_source() != config.mode.knowledge_source() {
                state.retrieval_log = RetrievalLog::new();
                state.log_generation += 1;
            }
            if greeting_changed {
                state.transcript.reset(config.greeting());
            }
            state.config = config;
            greeting_changed.then(|| state.transcript.messages().to_vec())
        };
        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }
    }

    /// Bind the session to a freshly uploaded knowledge source.
    pub fn set_knowledge_source(&self, source: KnowledgeSource) {
        let mut config = self.config();
        config.mode = SessionMode::retrieval(source);
        self.update_config(config);
    }

    /// Submit the pending input field.
    pub async fn submit_input(&self) -> Result<SubmitOutcome> {
        let text = self.input();
        self.submit(text).await
    }

    /// Submit one user message.
    ///
    /// Validation, precondition and busy failures return `Err` without
    /// touching the transcript. Otherwise the user message is appended before
    /// the backend is called, and backend failures end the turn with a
    /// fallback assistant message. The busy flag and input field are cleared
    /// once the turn ends, however it ends.
    pub async fn submit(&self, user_text: impl Into<String>) -> Result<SubmitOutcome> {
        let user_text = user_text.into();
        let (dispatch, snapshot) = {
            let mut state = self.state();
            let dispatch = prepare(&mut state, &user_text)?;
            debug!(mode = state.config.mode.name(), "Submission accepted");
            state.busy = true;
            state.transcript.apply(&TranscriptEvent::UserSubmitted {
                content: user_text.clone(),
            });
            (dispatch, state.transcript.messages().to_vec())
        };
        let _busy = BusyGuard {
            state: self.state.as_ref(),
        };
        self.notify(&snapshot);

        let outcome = match dispatch {
            Dispatch::Prompt(request) => self.run_prompt_turn(request).await,
            Dispatch::Retrieval {
                query,
                log_generation,
            } => self.run_retrieval_turn(query, log_generation).await,
        };
        Ok(outcome)
    }

    async fn run_prompt_turn(&self, request: ConversationRequest) -> SubmitOutcome {
        debug!(window = request.input.len(), "Prompt-mode turn");

        let bytes = match with_optional_timeout(
            self.call_policy.request_timeout,
            self.backend.stream_conversation(&request),
        )
        .await
        {
            Ok(bytes) => bytes,
            Err(e) => return self.fail_turn(PROMPT_FALLBACK, e),
        };

        let mut outputs = accumulated_output(bytes);
        let mut received_any = false;
        loop {
            let next = with_optional_timeout(self.call_policy.chunk_timeout, async {
                Ok(outputs.next().await)
            })
            .await;

            match next {
                Ok(Some(Ok(output))) => {
                    received_any = true;
                    self.publish(TranscriptEvent::ChunkReceived { output });
                }
                Ok(None) => break,
                Ok(Some(Err(e))) | Err(e) => return self.fail_turn(PROMPT_FALLBACK, e),
            }
        }

        if !received_any {
            self.publish(TranscriptEvent::ChunkReceived {
                output: String::new(),
            });
        }
        self.publish(TranscriptEvent::StreamCompleted);
        SubmitOutcome::Answered
    }

    async fn run_retrieval_turn(
        &self,
        query: RetrievalQuery,
        log_generation: u64,
    ) -> SubmitOutcome {
        debug!(
            index_name = %query.index_name,
            questions_len = query.questions.len(),
            answers_len = query.answers.len(),
            "Retrieval-mode turn"
        );

        let answer = match with_optional_timeout(
            self.call_policy.request_timeout,
            self.backend.query_retrieval(&query),
        )
        .await
        {
            Ok(answer) => answer,
            Err(e) => return self.fail_turn(RETRIEVAL_FALLBACK, e),
        };

        {
            let mut state = self.state();
            if state.log_generation == log_generation {
                state.retrieval_log.record_answer(&answer.response);
            } else {
                debug!("Knowledge source changed mid-turn; answer not logged");
            }
        }
        self.publish(TranscriptEvent::AnswerReceived {
            content: answer.response,
        });
        SubmitOutcome::Answered
    }

    fn fail_turn(&self, fallback: &str, error: ParlanceError) -> SubmitOutcome {
        warn!(error = %error, "Turn degraded to fallback message");
        let outcome = SubmitOutcome::degraded(&error);
        self.publish(TranscriptEvent::RequestFailed {
            fallback: fallback.to_string(),
        });
        outcome
    }

    fn publish(&self, event: TranscriptEvent) {
        let snapshot = {
            let mut state = self.state();
            state.transcript.apply(&event);
            state.transcript.messages().to_vec()
        };
        self.notify(&snapshot);
    }

    fn notify(&self, messages: &[Message]) {
        if let Some(sink) = &self.sink {
            sink(messages);
        }
    }
}

/// Validate a submission and build its request. Records the question in
/// retrieval mode; the request carries the logs as they stood beforehand.
/// The answer is only logged if the logs are still the ones the question
/// went into.
fn prepare(state: &mut SessionState, user_text: &str) -> Result<Dispatch> {
    if state.busy {
        return Err(ParlanceError::Busy);
    }
    if user_text.trim().is_empty() {
        return Err(ParlanceError::Validation(
            "Please enter a message.".to_string(),
        ));
    }

    match &state.config.mode {
        SessionMode::PromptDriven { prompt } => {
            if prompt.is_empty() {
                return Err(ParlanceError::Validation(
                    "Please enter a prompt for your chatbot.".to_string(),
                ));
            }
            if prompt.chars().count() < MIN_PROMPT_CHARS {
                return Err(ParlanceError::Validation(format!(
                    "Prompt must be at least {MIN_PROMPT_CHARS} characters long."
                )));
            }
            let input = conversation_window(state.transcript.messages(), Message::user(user_text));
            Ok(Dispatch::Prompt(ConversationRequest {
                prompt: prompt.clone(),
                input,
            }))
        }
        SessionMode::RetrievalDriven { source } => {
            if source.index_name.is_empty() {
                return Err(ParlanceError::Precondition(
                    "Please upload a document for your chatbot.".to_string(),
                ));
            }
            let query = RetrievalQuery {
                query: user_text.to_string(),
                namespace: source.namespace.clone(),
                index_name: source.index_name.clone(),
                questions: state.retrieval_log.questions_asked().to_string(),
                answers: state.retrieval_log.answers_given().to_string(),
            };
            state.retrieval_log.record_question(user_text);
            Ok(Dispatch::Retrieval {
                query,
                log_generation: state.log_generation,
            })
        }
    }
}

/// Clears the busy flag and input field when a submission ends or is dropped.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.busy = false;
        state.input.clear();
    }
}

fn capitalize_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
