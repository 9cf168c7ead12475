//! Session configuration: the immutable inputs a conversation is set up with.

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting used when no welcome message is configured.
pub const DEFAULT_GREETING: &str = "Hello, how can I help you today?";

/// Minimum accepted prompt length, in characters.
pub const MIN_PROMPT_CHARS: usize = 3;

/// An uploaded document or video transcript indexed by the retrieval backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnowledgeSource {
    /// Caller-generated opaque identifier correlating the upload with its index.
    pub namespace: String,
    pub index_name: String,
}

impl KnowledgeSource {
    pub fn new(namespace: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            index_name: index_name.into(),
        }
    }
}

/// Which backend answers a session's submissions. Chosen once at setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SessionMode {
    /// Free-form instruction plus a short rolling window, answered by stream.
    PromptDriven { prompt: String },
    /// Stateless question answering over an indexed knowledge source.
    RetrievalDriven { source: KnowledgeSource },
}

impl SessionMode {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self::PromptDriven {
            prompt: prompt.into(),
        }
    }

    pub fn retrieval(source: KnowledgeSource) -> Self {
        Self::RetrievalDriven { source }
    }

    /// Select a mode from loosely-populated fields.
    ///
    /// A non-empty `index_name` always wins, even when a prompt is also set.
    pub fn from_fields(
        prompt: Option<&str>,
        namespace: Option<&str>,
        index_name: Option<&str>,
    ) -> Self {
        match index_name.filter(|name| !name.is_empty()) {
            Some(index_name) => Self::RetrievalDriven {
                source: KnowledgeSource::new(namespace.unwrap_or_default(), index_name),
            },
            None => Self::PromptDriven {
                prompt: prompt.unwrap_or_default().to_string(),
            },
        }
    }

    pub fn knowledge_source(&self) -> Option<&KnowledgeSource> {
        match self {
            Self::RetrievalDriven { source } => Some(source),
            Self::PromptDriven { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PromptDriven { .. } => "prompt",
            Self::RetrievalDriven { .. } => "retrieval",
        }
    }
}

/// Everything a session needs from its chatbot configuration.
///
/// Replaced wholesale through `SessionEngine::update_config`; never mutated
/// field by field.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct SessionConfig {
    #[builder(into, default)]
    #[serde(default)]
    pub welcome_message: String,
    pub mode: SessionMode,
}

impl SessionConfig {
    /// Welcome text shown as the transcript seed.
    pub fn greeting(&self) -> &str {
        if self.welcome_message.is_empty() {
            DEFAULT_GREETING
        } else {
            &self.welcome_message
        }
    }

    /// Build a session configuration from a stored chatbot record.
    pub fn from_record(record: &ChatbotRecord) -> Self {
        Self {
            welcome_message: record.welcome_message.clone(),
            mode: SessionMode::from_fields(
                record.prompt.as_deref(),
                record.namespace.as_deref(),
                record.index_name.as_deref(),
            ),
        }
    }
}

/// A chatbot document as held by the persistence collaborator.
///
/// Sessions only read `welcome_message`, `prompt`, `namespace` and
/// `index_name`; the remaining fields are carried for callers that list or
/// render records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotRecord {
    #[serde(default)]
    pub chatbot_name: String,
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
