//! Prompt generation runs.
//!
//! [`PromptGenerator::start`] validates the request, marks the videos as
//! `processing` and spawns the worker. The worker checks the stop flag
//! between videos and between batches; once a stop is requested every video
//! it has not started yet goes back to `pending`.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vidprompt_core::config::AppConfig;
use vidprompt_core::error::CoreError;
use vidprompt_core::generation::{
    self, GenerationParams, GenerationStats, LAST_PARAMS_SETTING_KEY,
};
use vidprompt_core::types::DbId;
use vidprompt_core::video::{self, VideoStatus};
use vidprompt_db::models::prompt::CreatePrompt;
use vidprompt_db::models::video::Video;
use vidprompt_db::repositories::{PromptRepo, SettingRepo, VideoRepo};
use vidprompt_db::DbPool;
use vidprompt_genai::{PromptBackend, PromptRequest, UploadedVideo};

use crate::error::PipelineError;
use crate::events::GenerationEvent;

/// Broadcast channel capacity for generation events.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Per-video progress reported while uploading.
const UPLOAD_PROGRESS: f64 = 5.0;

/// Per-video progress once the upload is being processed remotely.
const PROCESSING_PROGRESS: f64 = 20.0;

/// Handle to a started run.
#[derive(Debug)]
pub struct RunHandle {
    pub run_id: String,
    /// Receiver subscribed before the worker was spawned, so no event is missed.
    pub events: broadcast::Receiver<GenerationEvent>,
    /// Resolves to the final counters when the worker exits.
    pub join: JoinHandle<GenerationStats>,
}

struct ActiveRun {
    run_id: String,
    cancel: CancellationToken,
}

/// Runs prompt generation in the background, one run at a time.
pub struct PromptGenerator {
    pool: DbPool,
    backend: Arc<dyn PromptBackend>,
    config: Arc<AppConfig>,
    event_tx: broadcast::Sender<GenerationEvent>,
    active: Arc<Mutex<Option<ActiveRun>>>,
}

impl PromptGenerator {
    pub fn new(pool: DbPool, backend: Arc<dyn PromptBackend>, config: Arc<AppConfig>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pool,
            backend,
            config,
            event_tx,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribe to events of the current and future runs.
    pub fn subscribe(&self) -> broadcast::Receiver<GenerationEvent> {
        self.event_tx.subscribe()
    }

    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Start generating prompts for `videos` with `params`.
    ///
    /// Fails with [`CoreError::Conflict`] while another run is active and
    /// with [`CoreError::Validation`] for an empty video list or parameters
    /// outside the configured ranges.
    pub async fn start(
        &self,
        params: GenerationParams,
        videos: Vec<Video>,
    ) -> Result<RunHandle, PipelineError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(CoreError::Conflict("Generation already in progress".to_string()).into());
        }
        if videos.is_empty() {
            return Err(CoreError::Validation("No videos provided".to_string()).into());
        }

        generation::validate_generation_params(&params, &self.config)?;
        let template = self.request_template(&params)?;

        if let Err(e) = SettingRepo::set_json(&self.pool, LAST_PARAMS_SETTING_KEY, &params).await {
            tracing::warn!(error = %e, "Failed to save last generation parameters");
        }

        let ids: Vec<DbId> = videos.iter().map(|v| v.id).collect();
        VideoRepo::reset_statuses(&self.pool, &ids, VideoStatus::Processing).await?;

        let run_id = uuid::Uuid::now_v7().to_string();
        let cancel = CancellationToken::new();
        *active = Some(ActiveRun {
            run_id: run_id.clone(),
            cancel: cancel.clone(),
        });
        drop(active);

        tracing::info!(
            run_id = %run_id,
            videos = videos.len(),
            prompts_per_video = params.prompts_per_video,
            complexity_level = params.complexity_level,
            variation_level = params.variation_level,
            aspect_ratio = %params.aspect_ratio,
            "Starting prompt generation",
        );

        let worker = Worker {
            pool: self.pool.clone(),
            backend: Arc::clone(&self.backend),
            event_tx: self.event_tx.clone(),
            cancel,
            params,
            template,
            batch_size: self.config.generation.max_prompts_per_batch as usize,
            supported_formats: self.config.video.supported_formats.clone(),
            max_file_bytes: self.config.max_file_size_bytes(),
        };

        let events = self.event_tx.subscribe();
        let active = Arc::clone(&self.active);
        let task_run_id = run_id.clone();
        let join = tokio::spawn(async move {
            let stats = worker.run(&task_run_id, videos).await;
            let mut slot = active.lock().await;
            if slot.as_ref().is_some_and(|r| r.run_id == task_run_id) {
                *slot = None;
            }
            stats
        });

        Ok(RunHandle {
            run_id,
            events,
            join,
        })
    }

    /// Request the active run to stop. Returns `false` when nothing runs.
    pub async fn stop(&self) -> bool {
        match self.active.lock().await.as_ref() {
            Some(run) => {
                tracing::info!(run_id = %run.run_id, "Stop requested");
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Resolve the level descriptions used in every batch request.
    fn request_template(&self, params: &GenerationParams) -> Result<PromptRequest, CoreError> {
        let complexity_desc = self
            .config
            .complexity_description(params.complexity_level)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "No description configured for complexity level {}",
                    params.complexity_level
                ))
            })?;
        let variation_instruction = self
            .config
            .variation_instruction(params.variation_level)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "No instruction configured for variation level {}",
                    params.variation_level
                ))
            })?;

        Ok(PromptRequest {
            complexity_desc: complexity_desc.to_string(),
            aspect_ratio: params.aspect_ratio.clone(),
            aspect_desc: self.config.aspect_description(&params.aspect_ratio).to_string(),
            variation_instruction: variation_instruction.to_string(),
            count: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Result of processing one video.
struct VideoOutcome {
    returned: usize,
    stored: usize,
    /// A stop was requested before all batches ran.
    interrupted: bool,
}

struct Worker {
    pool: DbPool,
    backend: Arc<dyn PromptBackend>,
    event_tx: broadcast::Sender<GenerationEvent>,
    cancel: CancellationToken,
    params: GenerationParams,
    template: PromptRequest,
    batch_size: usize,
    supported_formats: Vec<String>,
    max_file_bytes: u64,
}

impl Worker {
    async fn run(&self, run_id: &str, videos: Vec<Video>) -> GenerationStats {
        let total = videos.len();
        let mut stats = GenerationStats::new(total);

        self.emit(GenerationEvent::Started {
            run_id: run_id.to_string(),
            total_videos: total,
        });
        self.progress(5, "Starting batch generation...");

        for (index, video) in videos.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.release_unprocessed(&videos[index..]).await;
                break;
            }

            self.progress(
                generation::overall_progress(index, total, 0.0),
                format!("Processing: {}", video.filename),
            );

            match self.process_video(video, index, total).await {
                Ok(outcome) => {
                    stats.total_prompts += outcome.returned;
                    stats.successful_prompts += outcome.stored;

                    if outcome.interrupted && outcome.stored == 0 {
                        self.set_status(video.id, VideoStatus::Pending).await;
                        continue;
                    }

                    self.set_status(video.id, VideoStatus::Completed).await;
                    stats.processed_videos += 1;
                    tracing::info!(
                        video_id = video.id,
                        filename = %video.filename,
                        prompts_stored = outcome.stored,
                        "Video processed",
                    );
                    self.emit(GenerationEvent::VideoCompleted {
                        video_id: video.id,
                        filename: video.filename.clone(),
                        prompts_stored: outcome.stored,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        video_id = video.id,
                        filename = %video.filename,
                        error = %e,
                        "Failed to process video",
                    );
                    self.set_status(video.id, VideoStatus::Error).await;
                    stats.failed_videos += 1;
                    self.emit(GenerationEvent::VideoFailed {
                        video_id: video.id,
                        filename: video.filename.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let cancelled = self.cancel.is_cancelled();
        let message = if cancelled {
            format!("Generation stopped. {}", stats.completion_message())
        } else {
            self.progress(100, "Generation completed");
            stats.completion_message()
        };

        tracing::info!(
            run_id,
            cancelled,
            processed_videos = stats.processed_videos,
            failed_videos = stats.failed_videos,
            successful_prompts = stats.successful_prompts,
            "Prompt generation finished",
        );
        self.emit(GenerationEvent::Finished {
            stats: stats.clone(),
            cancelled,
            message,
        });
        stats
    }

    /// Validate, upload, generate every batch, and always delete the upload.
    async fn process_video(
        &self,
        video: &Video,
        index: usize,
        total: usize,
    ) -> Result<VideoOutcome, PipelineError> {
        let path = Path::new(&video.filepath);
        video::validate_video_file(path, &self.supported_formats, self.max_file_bytes).map_err(
            |e| match e {
                CoreError::Validation(msg) => {
                    CoreError::Validation(format!("Invalid video file: {msg}"))
                }
                other => other,
            },
        )?;

        self.progress(
            generation::overall_progress(index, total, UPLOAD_PROGRESS),
            format!("Uploading video: {}", video.filename),
        );
        let uploaded = self.backend.upload_video(path).await?;

        let result = self.generate_for_upload(video, &uploaded, index, total).await;

        if let Err(e) = self.backend.delete_file(&uploaded).await {
            tracing::warn!(
                video_id = video.id,
                file = %uploaded.name,
                error = %e,
                "Failed to delete uploaded file",
            );
        }
        result
    }

    async fn generate_for_upload(
        &self,
        video: &Video,
        uploaded: &UploadedVideo,
        index: usize,
        total: usize,
    ) -> Result<VideoOutcome, PipelineError> {
        self.progress(
            generation::overall_progress(index, total, PROCESSING_PROGRESS),
            "Processing video...",
        );
        let active = self.backend.wait_until_active(uploaded).await?;

        let batches = generation::plan_batches(self.params.prompts_per_video as usize, self.batch_size);
        let num_batches = batches.len();
        let mut outcome = VideoOutcome {
            returned: 0,
            stored: 0,
            interrupted: false,
        };

        for (batch, count) in batches.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                outcome.interrupted = true;
                break;
            }

            let message = if num_batches > 1 {
                format!("Generating batch {}/{num_batches} ({count} prompts)...", batch + 1)
            } else {
                format!("Generating {count} prompts...")
            };
            self.progress(
                generation::overall_progress(
                    index,
                    total,
                    generation::batch_progress(batch, num_batches),
                ),
                message,
            );

            let request = PromptRequest {
                count,
                ..self.template.clone()
            };
            let prompts = match self.backend.generate_prompts(&active, &request).await {
                Ok(prompts) => prompts,
                Err(e) => {
                    tracing::warn!(
                        video_id = video.id,
                        batch = batch + 1,
                        num_batches,
                        error = %e,
                        "Batch failed, continuing with next batch",
                    );
                    self.emit(GenerationEvent::BatchFailed {
                        video_id: video.id,
                        batch: batch + 1,
                        num_batches,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            outcome.returned += prompts.len();
            outcome.stored += self.store_prompts(video.id, &prompts).await?;
        }

        Ok(outcome)
    }

    /// Store the non-blank prompts, trimmed. Returns how many were stored.
    async fn store_prompts(&self, video_id: DbId, prompts: &[String]) -> Result<usize, sqlx::Error> {
        let mut stored = 0;
        for text in prompts.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            PromptRepo::create(
                &self.pool,
                &CreatePrompt {
                    video_id,
                    prompt_text: text.to_string(),
                    complexity_level: i64::from(self.params.complexity_level),
                    aspect_ratio: self.params.aspect_ratio.clone(),
                    variation_level: i64::from(self.params.variation_level),
                },
            )
            .await?;
            stored += 1;
        }
        Ok(stored)
    }

    /// Put videos the run never reached back to `pending`.
    async fn release_unprocessed(&self, videos: &[Video]) {
        let ids: Vec<DbId> = videos.iter().map(|v| v.id).collect();
        match VideoRepo::reset_statuses(&self.pool, &ids, VideoStatus::Pending).await {
            Ok(count) => tracing::info!(count, "Unprocessed videos reset to pending"),
            Err(e) => tracing::error!(error = %e, "Failed to reset unprocessed videos"),
        }
    }

    async fn set_status(&self, video_id: DbId, status: VideoStatus) {
        if let Err(e) = VideoRepo::update_status(&self.pool, video_id, status).await {
            tracing::error!(video_id, status = %status, error = %e, "Failed to update video status");
        }
    }

    fn progress(&self, percent: u8, message: impl Into<String>) {
        self.emit(GenerationEvent::Progress {
            percent,
            message: message.into(),
        });
    }

    fn emit(&self, event: GenerationEvent) {
        // No subscribers is fine; the run continues regardless.
        let _ = self.event_tx.send(event);
    }
}
