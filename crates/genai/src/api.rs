//! REST API client for the generative-AI endpoints.
//!
//! Wraps the Files API (resumable upload, state lookup, deletion) and
//! `models/{model}:generateContent` using [`reqwest`]. The API key is sent
//! in the `x-goog-api-key` header on every request.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::types::{GenerateContentRequest, GenerateContentResponse, RemoteFile, UploadFileResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Slowest sustained throughput an upload is allowed before it times out.
const MIN_UPLOAD_BYTES_PER_SEC: u64 = 256 * 1024;

/// HTTP client for the generative-AI API.
#[derive(Debug, Clone)]
pub struct GenAiApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum GenAiApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("GenAI API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The upload start call did not return a session URL.
    #[error("Upload session URL missing from response")]
    MissingUploadUrl,

    /// The model answered without any text.
    #[error("Empty response from model{}", .0.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyResponse(Option<String>),

    /// The API key contains characters not allowed in an HTTP header.
    #[error("Invalid API key format")]
    InvalidApiKey,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenAiApi {
    /// Create a client for `base_url` (no trailing slash) authenticating
    /// with `api_key`. `timeout` bounds every request except the upload
    /// body, which gets [`GenAiApi::upload_timeout`].
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GenAiApiError> {
        let mut key = HeaderValue::from_str(api_key).map_err(|_| GenAiApiError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Time allowed for sending `size` bytes: the request timeout plus one
    /// second per [`MIN_UPLOAD_BYTES_PER_SEC`].
    pub fn upload_timeout(&self, size: u64) -> Duration {
        self.timeout + Duration::from_secs(size / MIN_UPLOAD_BYTES_PER_SEC)
    }

    /// Upload `size` bytes from `file` as a new file using the resumable
    /// protocol.
    ///
    /// The first request opens an upload session and returns its URL in the
    /// `x-goog-upload-url` header; the second streams the bytes and finalizes.
    pub async fn upload_file(
        &self,
        file: tokio::fs::File,
        size: u64,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, GenAiApiError> {
        let length = size.to_string();
        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", &length)
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = Self::ensure_success(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(GenAiApiError::MissingUploadUrl)?;

        let response = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header(reqwest::header::CONTENT_LENGTH, &length)
            .timeout(self.upload_timeout(size))
            .body(reqwest::Body::from(file))
            .send()
            .await?;

        let uploaded: UploadFileResponse = Self::parse_response(response).await?;
        Ok(uploaded.file)
    }

    /// Fetch the current metadata of a file (`name` is `files/...`).
    pub async fn get_file(&self, name: &str) -> Result<RemoteFile, GenAiApiError> {
        let response = self
            .client
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Delete an uploaded file.
    pub async fn delete_file(&self, name: &str) -> Result<(), GenAiApiError> {
        let response = self
            .client
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Run `model` on `request`.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiApiError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GenAiApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GenAiApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GenAiApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), GenAiApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
