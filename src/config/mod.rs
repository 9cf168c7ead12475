//! Configuration system (layered: code > env > config file).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParlanceError;

/// Default prompt-mode endpoint, served next to the console.
pub const DEFAULT_CONVERSATION_URL: &str = "http://localhost:3000/api/conversation";

/// Default retrieval service hosting `/Chat`, `/PDUpload` and `/YTUpload`.
pub const DEFAULT_RETRIEVAL_BASE_URL: &str = "https://langchainchatbot-64e6d01e9116.herokuapp.com";

const ENV_CONVERSATION_URL: &str = "PARLANCE_CONVERSATION_URL";
const ENV_RETRIEVAL_URL: &str = "PARLANCE_RETRIEVAL_URL";

/// Where the backend collaborators live.
///
/// Resolution order:
/// 1. Explicit setters (`with_conversation_url`, `with_retrieval_base_url`)
/// 2. Environment (`PARLANCE_CONVERSATION_URL`, `PARLANCE_RETRIEVAL_URL`, `.env`)
/// 3. TOML config file
/// 4. Built-in defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub conversation_url: String,
    pub retrieval_base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            conversation_url: DEFAULT_CONVERSATION_URL.to_string(),
            retrieval_base_url: DEFAULT_RETRIEVAL_BASE_URL.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Config file (if present at the default location) overridden by environment.
    pub fn load() -> Result<Self, ParlanceError> {
        let base = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        let _ = dotenvy::dotenv();
        Ok(base.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ParlanceError> {
        toml::from_str(raw).map_err(|e| ParlanceError::Configuration(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ParlanceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Apply overrides from a variable lookup.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_CONVERSATION_URL).filter(|v| !v.trim().is_empty()) {
            self.conversation_url = url;
        }
        if let Some(url) = lookup(ENV_RETRIEVAL_URL).filter(|v| !v.trim().is_empty()) {
            self.retrieval_base_url = url;
        }
        self
    }

    pub fn with_conversation_url(mut self, url: impl Into<String>) -> Self {
        self.conversation_url = url.into();
        self
    }

    pub fn with_retrieval_base_url(mut self, url: impl Into<String>) -> Self {
        self.retrieval_base_url = url.into();
        self
    }

    /// Retrieval-mode question endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/Chat", self.retrieval_root())
    }

    /// Document upload endpoint.
    pub fn document_upload_url(&self) -> String {
        format!("{}/PDUpload", self.retrieval_root())
    }

    /// Video-URL upload endpoint.
    pub fn video_upload_url(&self) -> String {
        format!("{}/YTUpload", self.retrieval_root())
    }

    fn retrieval_root(&self) -> &str {
        self.retrieval_base_url.trim_end_matches('/')
    }
}

/// Default config file location (`<config dir>/parlance/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "parlance")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Timeout policy applied to backend calls.
///
/// Both limits default to `None`: a call or stream that never resolves keeps
/// the session busy until it is torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallPolicy {
    /// Limit on issuing a request and receiving its status (or JSON answer).
    pub request_timeout: Option<Duration>,
    /// Limit on the gap between consecutive stream chunks.
    pub chunk_timeout: Option<Duration>,
}

impl CallPolicy {
    /// Wait indefinitely.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = Some(timeout);
        self
    }
}
