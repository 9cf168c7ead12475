//! Knowledge-source uploads.
//!
//! Documents and video URLs are indexed by the retrieval service under a
//! freshly generated namespace. The returned [`KnowledgeSource`] is what a
//! session binds to via `SessionEngine::set_knowledge_source`.

mod multipart;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::error::ParlanceError;
use crate::provider::http::{error_from_response, shared_client};
use crate::session::KnowledgeSource;

use multipart::build_file_multipart;

const UNPROCESSABLE_ENTITY: u16 = 422;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    index_name: String,
}

/// Client for the document and video-URL upload endpoints.
#[derive(Debug, Clone)]
pub struct KnowledgeUploader {
    endpoints: EndpointConfig,
    client: reqwest::Client,
}

impl KnowledgeUploader {
    pub fn new(endpoints: EndpointConfig) -> Self {
        Self {
            endpoints,
            client: shared_client().clone(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Generate a namespace for a new upload.
    pub fn new_namespace() -> String {
        Uuid::new_v4().to_string()
    }

    /// Upload a document and return the source it was indexed as.
    pub async fn upload_document(
        &self,
        file_name: &str,
        mime_type: &str,
        contents: &[u8],
    ) -> Result<KnowledgeSource, ParlanceError> {
        if contents.is_empty() {
            return Err(ParlanceError::Validation(
                "Please select a file to upload.".to_string(),
            ));
        }

        let namespace = Self::new_namespace();
        let boundary = format!("parlance-{}", Uuid::new_v4().simple());
        let body = build_file_multipart(&boundary, file_name, mime_type, contents);
        let content_type = format!("multipart/form-data; boundary={boundary}");
        let content_type = HeaderValue::from_str(&content_type).map_err(|e| {
            ParlanceError::Validation(format!("Failed to build multipart content-type: {e}"))
        })?;

        debug!(namespace = %namespace, file_name, bytes = contents.len(), "upload_document");

        let resp = self
            .client
            .post(self.endpoints.document_upload_url())
            .query(&[("namespace", namespace.as_str())])
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        finish_upload(resp, namespace, "Please select a file to upload.").await
    }

    /// Index a video transcript by URL and return the resulting source.
    pub async fn upload_video_url(
        &self,
        video_url: &str,
    ) -> Result<KnowledgeSource, ParlanceError> {
        if video_url.trim().is_empty() {
            return Err(ParlanceError::Validation(
                "Please enter a valid URL.".to_string(),
            ));
        }

        let namespace = Self::new_namespace();
        debug!(namespace = %namespace, video_url, "upload_video_url");

        let resp = self
            .client
            .post(self.endpoints.video_upload_url())
            .query(&[("video_url", video_url), ("namespace", namespace.as_str())])
            .send()
            .await?;

        finish_upload(resp, namespace, "Please enter a valid URL.").await
    }
}

async fn finish_upload(
    resp: reqwest::Response,
    namespace: String,
    unprocessable_message: &str,
) -> Result<KnowledgeSource, ParlanceError> {
    let status = resp.status().as_u16();
    if status == UNPROCESSABLE_ENTITY {
        return Err(ParlanceError::Validation(unprocessable_message.to_string()));
    }
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }

    let body = resp.text().await?;
    let parsed: UploadResponse = serde_json::from_str(&body)?;
    Ok(KnowledgeSource::new(namespace, parsed.index_name))
}
