//! Prompt generation backend.
//!
//! [`PromptBackend`] is what the generation worker drives: upload a video,
//! wait for the API to finish processing it, request batches of prompts,
//! and delete the upload. [`GenAiClient`] is the production implementation
//! on top of [`GenAiApi`].

use std::path::Path;
use std::time::Duration;

use vidprompt_core::config::AppConfig;
use vidprompt_core::prompt_text::{self, BatchPromptInput, CONNECTION_TEST_PROMPT};
use vidprompt_core::video;

use crate::api::{GenAiApi, GenAiApiError};
use crate::types::{FileState, GenerateContentRequest, Part, RemoteFile};

/// Errors surfaced by a [`PromptBackend`].
#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    #[error(transparent)]
    Api(#[from] GenAiApiError),

    #[error("Video file not found: {0}")]
    FileNotFound(String),

    #[error("Video processing failed")]
    ProcessingFailed,

    #[error("Video processing did not finish within {seconds}s")]
    ProcessingTimeout { seconds: u64 },

    #[error("Uploaded file has no URI")]
    MissingUri,
}

/// A video that has been uploaded to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVideo {
    /// Resource name used for state lookups and deletion.
    pub name: String,
    /// URI referenced from generation requests, once known.
    pub uri: Option<String>,
    pub mime_type: String,
}

/// Parameters of one batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub complexity_desc: String,
    pub aspect_ratio: String,
    pub aspect_desc: String,
    pub variation_instruction: String,
    /// Number of prompts asked for in this batch.
    pub count: usize,
}

/// Backend the generation worker talks to.
#[async_trait::async_trait]
pub trait PromptBackend: Send + Sync {
    /// Upload a local video file.
    async fn upload_video(&self, path: &Path) -> Result<UploadedVideo, GenAiError>;

    /// Poll until the upload is usable. Fails if the API reports the file
    /// as failed or the wait exceeds the configured upload timeout.
    async fn wait_until_active(&self, file: &UploadedVideo) -> Result<UploadedVideo, GenAiError>;

    /// Ask for `request.count` prompts about `file`. Returns at most that many.
    async fn generate_prompts(
        &self,
        file: &UploadedVideo,
        request: &PromptRequest,
    ) -> Result<Vec<String>, GenAiError>;

    /// Remove the upload from the API.
    async fn delete_file(&self, file: &UploadedVideo) -> Result<(), GenAiError>;

    /// Send a trivial request to confirm key and model work.
    async fn test_connection(&self) -> Result<(), GenAiError>;
}

/// [`PromptBackend`] backed by the generative-AI REST API.
#[derive(Clone)]
pub struct GenAiClient {
    api: GenAiApi,
    model: String,
    poll_interval: Duration,
    upload_timeout: Duration,
}

impl GenAiClient {
    pub fn new(api: GenAiApi, model: String, poll_interval: Duration, upload_timeout: Duration) -> Self {
        Self {
            api,
            model,
            poll_interval,
            upload_timeout,
        }
    }

    /// Build a client from the `api` and `video` config sections.
    pub fn from_config(config: &AppConfig, api_key: &str) -> Result<Self, GenAiApiError> {
        let api = GenAiApi::new(
            &config.api.base_url,
            api_key,
            Duration::from_secs(config.api.request_timeout_seconds),
        )?;
        Ok(Self::new(
            api,
            config.api.model_name.clone(),
            Duration::from_secs(config.video.poll_interval_seconds.max(1)),
            Duration::from_secs(config.video.upload_timeout_seconds),
        ))
    }

    /// Same client talking to another model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_uploaded(file: RemoteFile, fallback_mime: &str) -> UploadedVideo {
        UploadedVideo {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type.unwrap_or_else(|| fallback_mime.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl PromptBackend for GenAiClient {
    async fn upload_video(&self, path: &Path) -> Result<UploadedVideo, GenAiError> {
        if !path.exists() {
            return Err(GenAiError::FileNotFound(path.display().to_string()));
        }

        let mime_type = video::mime_type_for(path);
        let display_name = video::display_name(path);
        let source = tokio::fs::File::open(path).await.map_err(GenAiApiError::from)?;
        let size = source.metadata().await.map_err(GenAiApiError::from)?.len();

        let file = self
            .api
            .upload_file(source, size, mime_type, &display_name)
            .await?;
        tracing::info!(
            file = %file.name,
            path = %path.display(),
            size_bytes = size,
            "Video uploaded",
        );
        Ok(Self::to_uploaded(file, mime_type))
    }

    async fn wait_until_active(&self, file: &UploadedVideo) -> Result<UploadedVideo, GenAiError> {
        let deadline = tokio::time::Instant::now() + self.upload_timeout;

        loop {
            let remote = self.api.get_file(&file.name).await?;
            match remote.state {
                FileState::Processing => {
                    if tokio::time::Instant::now() + self.poll_interval > deadline {
                        return Err(GenAiError::ProcessingTimeout {
                            seconds: self.upload_timeout.as_secs(),
                        });
                    }
                    tracing::debug!(file = %file.name, "Video still processing");
                    tokio::time::sleep(self.poll_interval).await;
                }
                FileState::Failed => {
                    tracing::warn!(file = %file.name, error = ?remote.error, "Video processing failed");
                    return Err(GenAiError::ProcessingFailed);
                }
                _ => {
                    tracing::debug!(file = %file.name, state = ?remote.state, "Video ready");
                    return Ok(Self::to_uploaded(remote, &file.mime_type));
                }
            }
        }
    }

    async fn generate_prompts(
        &self,
        file: &UploadedVideo,
        request: &PromptRequest,
    ) -> Result<Vec<String>, GenAiError> {
        let uri = file.uri.as_deref().ok_or(GenAiError::MissingUri)?;
        let instruction = prompt_text::build_batch_prompt(&BatchPromptInput {
            complexity_desc: &request.complexity_desc,
            aspect_ratio: &request.aspect_ratio,
            aspect_desc: &request.aspect_desc,
            variation_instruction: &request.variation_instruction,
            count: request.count,
        });

        let body = GenerateContentRequest::user(vec![
            Part::file(file.mime_type.clone(), uri),
            Part::text(instruction),
        ]);
        let response = self.api.generate_content(&self.model, &body).await?;

        let text = response.text().ok_or_else(|| {
            GenAiApiError::EmptyResponse(
                response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone()),
            )
        })?;

        let prompts = prompt_text::parse_batch_response(&text, request.count);
        tracing::debug!(
            file = %file.name,
            requested = request.count,
            received = prompts.len(),
            "Batch generated",
        );
        Ok(prompts)
    }

    async fn delete_file(&self, file: &UploadedVideo) -> Result<(), GenAiError> {
        self.api.delete_file(&file.name).await?;
        tracing::debug!(file = %file.name, "Uploaded file deleted");
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), GenAiError> {
        let body = GenerateContentRequest::user(vec![Part::text(CONNECTION_TEST_PROMPT)]);
        let response = self.api.generate_content(&self.model, &body).await?;
        match response.text() {
            Some(text) if !text.trim().is_empty() => {
                tracing::info!(model = %self.model, "GenAI connection test succeeded");
                Ok(())
            }
            _ => Err(GenAiApiError::EmptyResponse(None).into()),
        }
    }
}
