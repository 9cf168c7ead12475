//! Shared HTTP client and the reqwest-backed chat backend.

use std::sync::OnceLock;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::config::EndpointConfig;
use crate::error::ParlanceError;

use super::{
    ByteStream, ConversationRequest, RetrievalAnswer, RetrievalQuery, StreamingCall, TextCall,
};

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No client-level timeout is set; waits are bounded only by the engine's
/// `CallPolicy`.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Map a non-success status and its body to an error.
pub fn status_to_error(status: u16, body: &str) -> ParlanceError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("error"))
                .map(|d| d.as_str().map(str::to_string).unwrap_or_else(|| d.to_string()))
        })
        .unwrap_or_else(|| body.to_string());
    ParlanceError::api(status, message)
}

/// Read the body of a non-success response into an error.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ParlanceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    status_to_error(status, &body)
}

/// Chat backend speaking to the conversation and retrieval endpoints over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoints: EndpointConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(endpoints: EndpointConfig) -> Self {
        Self {
            endpoints,
            client: shared_client().clone(),
        }
    }

    /// Use a caller-built client (proxies, custom TLS, client-level timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }
}

#[async_trait]
impl StreamingCall for HttpBackend {
    async fn stream_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ByteStream, ParlanceError> {
        debug!(
            url = %self.endpoints.conversation_url,
            window = request.input.len(),
            "stream_conversation"
        );

        let resp = self
            .client
            .post(&self.endpoints.conversation_url)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ParlanceError::Network));

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl TextCall for HttpBackend {
    async fn query_retrieval(
        &self,
        query: &RetrievalQuery,
    ) -> Result<RetrievalAnswer, ParlanceError> {
        let url = self.endpoints.chat_url();
        debug!(
            url = %url,
            index_name = %query.index_name,
            questions_len = query.questions.len(),
            answers_len = query.answers.len(),
            "query_retrieval"
        );

        let resp = self.client.post(&url).query(query).send().await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_detail_field() {
        let err = status_to_error(404, r#"{"detail": "index not found"}"#);
        match err {
            ParlanceError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "index not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_error_keeps_plain_bodies() {
        let err = status_to_error(500, "Internal Server Error");
        assert_eq!(err.to_string(), "API error (status 500): Internal Server Error");
    }
}
