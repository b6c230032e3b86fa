//! Library-wide statistics queries.

use sqlx::SqlitePool;
use vidprompt_core::video::VideoStatus;

use crate::models::stats::LibraryStats;

/// Aggregates over `videos` and `prompts`.
pub struct StatsRepo;

impl StatsRepo {
    pub async fn get_stats(pool: &SqlitePool) -> Result<LibraryStats, sqlx::Error> {
        let (total_videos,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM videos")
            .fetch_one(pool)
            .await?;
        let (total_prompts, copied_prompts): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_copied = 1 THEN 1 ELSE 0 END), 0)
             FROM prompts",
        )
        .fetch_one(pool)
        .await?;

        let by_status: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM videos GROUP BY status")
                .fetch_all(pool)
                .await?;

        let mut stats = LibraryStats {
            total_videos,
            total_prompts,
            copied_prompts,
            ..LibraryStats::default()
        };
        for (status, count) in by_status {
            match status.parse::<VideoStatus>() {
                Ok(VideoStatus::Pending) => stats.pending_videos = count,
                Ok(VideoStatus::Processing) => stats.processing_videos = count,
                Ok(VideoStatus::Completed) => stats.completed_videos = count,
                Ok(VideoStatus::Error) => stats.error_videos = count,
                Err(_) => tracing::warn!(status = %status, count, "Unknown video status in database"),
            }
        }
        Ok(stats)
    }
}
