//! Resolution of a [`GenerationMode`] into the videos to process.

use vidprompt_core::error::CoreError;
use vidprompt_core::generation::GenerationMode;
use vidprompt_core::types::DbId;
use vidprompt_db::models::video::Video;
use vidprompt_db::repositories::VideoRepo;
use vidprompt_db::DbPool;

use crate::error::PipelineError;

/// Videos picked by `mode`, in processing order.
///
/// `ids` is only consulted for [`GenerationMode::Selected`]. An empty result
/// is reported as a validation error carrying the user-facing message for
/// the mode.
pub async fn select_videos(
    pool: &DbPool,
    mode: GenerationMode,
    ids: &[DbId],
) -> Result<Vec<Video>, PipelineError> {
    let videos = match mode {
        GenerationMode::Selected => VideoRepo::list_by_ids(pool, ids).await?,
        GenerationMode::All => VideoRepo::list_all(pool).await?,
        GenerationMode::Ungenerated => VideoRepo::list_ungenerated(pool).await?,
    };

    if videos.is_empty() {
        return Err(CoreError::Validation(mode.empty_selection_message().to_string()).into());
    }

    tracing::debug!(mode = %mode, count = videos.len(), "Videos selected for generation");
    Ok(videos)
}
