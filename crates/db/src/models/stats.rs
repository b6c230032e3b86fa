//! Library-wide statistics.

use serde::Serialize;

/// Aggregate counters over videos and prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total_videos: i64,
    pub total_prompts: i64,
    pub copied_prompts: i64,
    pub pending_videos: i64,
    pub processing_videos: i64,
    pub completed_videos: i64,
    pub error_videos: i64,
}

impl LibraryStats {
    /// Share of prompts that were copied, in percent.
    pub fn copy_rate(&self) -> f64 {
        if self.total_prompts == 0 {
            0.0
        } else {
            self.copied_prompts as f64 / self.total_prompts as f64 * 100.0
        }
    }
}
