use vidprompt_core::error::CoreError;
use vidprompt_genai::GenAiError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Backend(#[from] GenAiError),
}
