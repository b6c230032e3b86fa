//! Repository for the `prompts` table.

use chrono::Utc;
use sqlx::SqlitePool;
use vidprompt_core::types::DbId;

use crate::models::prompt::{CreatePrompt, Prompt, PROMPT_STATUS_GENERATED};

/// Column list for `prompts` queries.
const COLUMNS: &str = "id, video_id, prompt_text, complexity_level, aspect_ratio, \
    variation_level, status, is_copied, created_at";

/// Provides CRUD operations for generated prompts.
pub struct PromptRepo;

impl PromptRepo {
    /// Insert a generated prompt. Returns the created row.
    pub async fn create(pool: &SqlitePool, input: &CreatePrompt) -> Result<Prompt, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompts
                (video_id, prompt_text, complexity_level, aspect_ratio,
                 variation_level, status, is_copied, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(input.video_id)
            .bind(&input.prompt_text)
            .bind(input.complexity_level)
            .bind(&input.aspect_ratio)
            .bind(input.variation_level)
            .bind(PROMPT_STATUS_GENERATED)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE id = ?");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Prompts of a video, newest first.
    pub async fn list_by_video(
        pool: &SqlitePool,
        video_id: DbId,
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts
             WHERE video_id = ?
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }

    /// Flag a prompt as copied. Returns `true` if a row was updated.
    pub async fn mark_copied(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE prompts SET is_copied = 1 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flag every prompt of a video as copied. Returns the number updated.
    pub async fn mark_all_copied_for_video(
        pool: &SqlitePool,
        video_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE prompts SET is_copied = 1 WHERE video_id = ?")
            .bind(video_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete the prompts of one video. Returns the number removed.
    pub async fn delete_by_video(pool: &SqlitePool, video_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prompts WHERE video_id = ?")
            .bind(video_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every prompt, keeping the videos. Returns the number removed.
    pub async fn delete_all(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prompts").execute(pool).await?;
        Ok(result.rows_affected())
    }
}
