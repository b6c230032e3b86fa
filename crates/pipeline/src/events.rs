//! Events published while a generation run is in progress.

use serde::Serialize;
use vidprompt_core::generation::GenerationStats;
use vidprompt_core::types::DbId;

/// A state change of the active generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// The worker picked up the run.
    Started { run_id: String, total_videos: usize },

    /// Overall progress.
    Progress {
        /// Completion percentage (0-100).
        percent: u8,
        message: String,
    },

    /// All batches of a video were attempted and its prompts stored.
    VideoCompleted {
        video_id: DbId,
        filename: String,
        prompts_stored: usize,
    },

    /// A video could not be processed; the run moves on to the next one.
    VideoFailed {
        video_id: DbId,
        filename: String,
        error: String,
    },

    /// One batch request failed; the remaining batches still run.
    BatchFailed {
        video_id: DbId,
        /// 1-based batch number.
        batch: usize,
        num_batches: usize,
        error: String,
    },

    /// The run ended, either normally or because a stop was requested.
    Finished {
        stats: GenerationStats,
        cancelled: bool,
        message: String,
    },
}
