//! Repository for the `videos` table.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use vidprompt_core::types::DbId;
use vidprompt_core::video::VideoStatus;

use crate::models::video::{CreateVideo, Video, VideoWithCounts};

/// Column list for `videos` queries.
const COLUMNS: &str = "id, filename, filepath, filesize, duration_secs, status, \
    created_at, updated_at";

/// The same columns qualified with the `v` alias, for joins.
const V_COLUMNS: &str = "v.id, v.filename, v.filepath, v.filesize, v.duration_secs, \
    v.status, v.created_at, v.updated_at";

/// Library listing order: newest import first.
const ORDER: &str = "ORDER BY v.created_at DESC, v.id DESC";

/// Provides CRUD operations for imported videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new video with status `pending`. Returns the created row.
    ///
    /// Fails with a unique-constraint violation when the path is already
    /// in the library.
    pub async fn create(pool: &SqlitePool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO videos
                (filename, filepath, filesize, duration_secs, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&input.filename)
            .bind(&input.filepath)
            .bind(input.filesize)
            .bind(input.duration_secs)
            .bind(VideoStatus::Pending.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a video by its primary key.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = ?");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a video by its absolute file path.
    pub async fn find_by_path(
        pool: &SqlitePool,
        filepath: &str,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE filepath = ?");
        sqlx::query_as::<_, Video>(&query)
            .bind(filepath)
            .fetch_optional(pool)
            .await
    }

    /// All videos with prompt and copied counts, optionally filtered by status.
    pub async fn list_with_counts(
        pool: &SqlitePool,
        status: Option<VideoStatus>,
    ) -> Result<Vec<VideoWithCounts>, sqlx::Error> {
        let filter = if status.is_some() {
            "WHERE v.status = ?"
        } else {
            ""
        };
        let query = format!(
            "SELECT {V_COLUMNS},
                    COUNT(p.id) AS prompt_count,
                    COUNT(CASE WHEN p.is_copied = 1 THEN 1 END) AS copied_count
             FROM videos v
             LEFT JOIN prompts p ON p.video_id = v.id
             {filter}
             GROUP BY v.id
             {ORDER}"
        );
        let mut q = sqlx::query_as::<_, VideoWithCounts>(&query);
        if let Some(status) = status {
            q = q.bind(status.as_str());
        }
        q.fetch_all(pool).await
    }

    /// Every video in library order.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!("SELECT {V_COLUMNS} FROM videos v {ORDER}");
        sqlx::query_as::<_, Video>(&query).fetch_all(pool).await
    }

    /// Videos matching `ids`, returned in the order of `ids`.
    ///
    /// Unknown ids are skipped; duplicates collapse to their first position.
    pub async fn list_by_ids(pool: &SqlitePool, ids: &[DbId]) -> Result<Vec<Video>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id IN ({placeholders})");
        let mut q = sqlx::query_as::<_, Video>(&query);
        for id in ids {
            q = q.bind(*id);
        }
        let mut rows = q.fetch_all(pool).await?;

        let mut ordered = Vec::with_capacity(rows.len());
        for id in ids {
            if let Some(pos) = rows.iter().position(|v| v.id == *id) {
                ordered.push(rows.swap_remove(pos));
            }
        }
        Ok(ordered)
    }

    /// Videos that have no prompts yet, in library order.
    pub async fn list_ungenerated(pool: &SqlitePool) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {V_COLUMNS} FROM videos v
             WHERE NOT EXISTS (SELECT 1 FROM prompts p WHERE p.video_id = v.id)
             {ORDER}"
        );
        sqlx::query_as::<_, Video>(&query).fetch_all(pool).await
    }

    /// Videos with the given status, in library order.
    pub async fn list_by_status(
        pool: &SqlitePool,
        status: VideoStatus,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!("SELECT {V_COLUMNS} FROM videos v WHERE v.status = ? {ORDER}");
        sqlx::query_as::<_, Video>(&query)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
    }

    /// Set the status of one video. Returns `true` if a row was updated.
    pub async fn update_status(
        pool: &SqlitePool,
        id: DbId,
        status: VideoStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE videos SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the status of several videos. Returns the number of rows updated.
    pub async fn reset_statuses(
        pool: &SqlitePool,
        ids: &[DbId],
        status: VideoStatus,
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "UPDATE videos SET status = ?, updated_at = ? WHERE id IN ({placeholders})"
        );
        let mut q = sqlx::query(&query).bind(status.as_str()).bind(Utc::now());
        for id in ids {
            q = q.bind(*id);
        }
        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Move every `error` video back to `pending`. Returns the number reset.
    pub async fn reset_errors_to_pending(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE videos SET status = ?, updated_at = ? WHERE status = ?")
            .bind(VideoStatus::Pending.as_str())
            .bind(Utc::now())
            .bind(VideoStatus::Error.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete a video and, through the cascade, its prompts.
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every prompt and video. Returns the number of videos removed.
    pub async fn delete_all(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM prompts").execute(&mut *tx).await?;
        let result = sqlx::query("DELETE FROM videos").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Delete `completed` and `error` videos imported more than `days` ago.
    /// Returns the number of videos removed.
    ///
    /// A `days` value whose cutoff falls outside the representable date
    /// range is rejected with [`sqlx::Error::Encode`].
    pub async fn delete_older_than(pool: &SqlitePool, days: u32) -> Result<u64, sqlx::Error> {
        let cutoff = Duration::try_days(i64::from(days))
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or_else(|| {
                sqlx::Error::Encode(format!("cleanup cutoff of {days} days is out of range").into())
            })?;
        let result = sqlx::query(
            "DELETE FROM videos
             WHERE created_at < ?
               AND status IN (?, ?)",
        )
        .bind(cutoff)
        .bind(VideoStatus::Completed.as_str())
        .bind(VideoStatus::Error.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
