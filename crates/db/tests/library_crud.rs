//! Integration tests for the video/prompt/settings repositories.
//!
//! Each test runs against a fresh migrated in-memory database:
//! - Video round-trip and duplicate paths
//! - Prompt cascade on video delete
//! - Selection queries used by the generation modes
//! - Status resets, cleanup and statistics
//! - Settings upsert and JSON helpers

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use vidprompt_core::video::VideoStatus;
use vidprompt_db::models::prompt::CreatePrompt;
use vidprompt_db::models::video::CreateVideo;
use vidprompt_db::repositories::{PromptRepo, SettingRepo, StatsRepo, VideoRepo};
use vidprompt_db::DbPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn setup() -> DbPool {
    let pool = vidprompt_db::create_memory_pool().await.unwrap();
    vidprompt_db::run_migrations(&pool).await.unwrap();
    pool
}

fn new_video(name: &str) -> CreateVideo {
    CreateVideo {
        filename: name.to_string(),
        filepath: format!("/videos/{name}"),
        filesize: 1_048_576,
        duration_secs: Some(12.5),
    }
}

fn new_prompt(video_id: i64, text: &str) -> CreatePrompt {
    CreatePrompt {
        video_id,
        prompt_text: text.to_string(),
        complexity_level: 3,
        aspect_ratio: "16:9".to_string(),
        variation_level: 2,
    }
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// A saved video round-trips every field.
#[tokio::test]
async fn test_video_round_trip() {
    let pool = setup().await;
    vidprompt_db::health_check(&pool).await.unwrap();

    let created = VideoRepo::create(&pool, &new_video("beach.mp4")).await.unwrap();
    let found = VideoRepo::find_by_id(&pool, created.id).await.unwrap().unwrap();

    assert_eq!(found.filename, "beach.mp4");
    assert_eq!(found.filepath, "/videos/beach.mp4");
    assert_eq!(found.filesize, 1_048_576);
    assert_eq!(found.duration_secs, Some(12.5));
    assert_eq!(found.status(), Some(VideoStatus::Pending));
    assert_eq!(found.created_at, created.created_at);

    let by_path = VideoRepo::find_by_path(&pool, "/videos/beach.mp4")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_path.id, created.id);
}

/// Importing the same path twice violates the unique constraint.
#[tokio::test]
async fn test_duplicate_path_rejected() {
    let pool = setup().await;
    VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();

    let err = VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap_err();
    assert_matches!(err, sqlx::Error::Database(ref db) if db.is_unique_violation());
}

/// Deleting a video removes its prompts through the foreign key cascade.
#[tokio::test]
async fn test_delete_video_cascades_to_prompts() {
    let pool = setup().await;
    let video = VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();
    let prompt = PromptRepo::create(&pool, &new_prompt(video.id, "sunset"))
        .await
        .unwrap();

    assert!(VideoRepo::delete(&pool, video.id).await.unwrap());
    assert!(PromptRepo::find_by_id(&pool, prompt.id).await.unwrap().is_none());
    assert!(!VideoRepo::delete(&pool, video.id).await.unwrap());
}

/// A prompt cannot reference a missing video.
#[tokio::test]
async fn test_prompt_requires_existing_video() {
    let pool = setup().await;
    let err = PromptRepo::create(&pool, &new_prompt(999, "orphan"))
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(ref db) if db.is_foreign_key_violation());
}

// ---------------------------------------------------------------------------
// Selection queries
// ---------------------------------------------------------------------------

/// Listing carries prompt and copied counts, newest first.
#[tokio::test]
async fn test_list_with_counts() {
    let pool = setup().await;
    let first = VideoRepo::create(&pool, &new_video("first.mp4")).await.unwrap();
    let second = VideoRepo::create(&pool, &new_video("second.mp4")).await.unwrap();

    let p1 = PromptRepo::create(&pool, &new_prompt(first.id, "one")).await.unwrap();
    PromptRepo::create(&pool, &new_prompt(first.id, "two")).await.unwrap();
    PromptRepo::mark_copied(&pool, p1.id).await.unwrap();

    let rows = VideoRepo::list_with_counts(&pool, None).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].video.id, second.id);
    assert_eq!(rows[0].prompt_count, 0);
    assert_eq!(rows[1].video.id, first.id);
    assert_eq!(rows[1].prompt_count, 2);
    assert_eq!(rows[1].copied_count, 1);

    let pending = VideoRepo::list_with_counts(&pool, Some(VideoStatus::Error))
        .await
        .unwrap();
    assert!(pending.is_empty());
}

/// `list_by_ids` preserves the caller's order and skips unknown ids.
#[tokio::test]
async fn test_list_by_ids_keeps_input_order() {
    let pool = setup().await;
    let a = VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();
    let b = VideoRepo::create(&pool, &new_video("b.mp4")).await.unwrap();
    let c = VideoRepo::create(&pool, &new_video("c.mp4")).await.unwrap();

    let rows = VideoRepo::list_by_ids(&pool, &[c.id, 12345, a.id, b.id])
        .await
        .unwrap();
    let ids: Vec<i64> = rows.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![c.id, a.id, b.id]);

    assert!(VideoRepo::list_by_ids(&pool, &[]).await.unwrap().is_empty());
}

/// Only videos without prompts count as ungenerated.
#[tokio::test]
async fn test_list_ungenerated() {
    let pool = setup().await;
    let done = VideoRepo::create(&pool, &new_video("done.mp4")).await.unwrap();
    let fresh = VideoRepo::create(&pool, &new_video("fresh.mp4")).await.unwrap();
    PromptRepo::create(&pool, &new_prompt(done.id, "text")).await.unwrap();

    let rows = VideoRepo::list_ungenerated(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, fresh.id);
}

// ---------------------------------------------------------------------------
// Status changes and cleanup
// ---------------------------------------------------------------------------

/// Status updates, bulk resets and error-to-pending resets.
#[tokio::test]
async fn test_status_updates_and_resets() {
    let pool = setup().await;
    let a = VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();
    let b = VideoRepo::create(&pool, &new_video("b.mp4")).await.unwrap();

    assert!(VideoRepo::update_status(&pool, a.id, VideoStatus::Error).await.unwrap());
    assert_eq!(
        VideoRepo::reset_statuses(&pool, &[b.id], VideoStatus::Processing)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        VideoRepo::list_by_status(&pool, VideoStatus::Error).await.unwrap().len(),
        1
    );

    assert_eq!(VideoRepo::reset_errors_to_pending(&pool).await.unwrap(), 1);
    let a = VideoRepo::find_by_id(&pool, a.id).await.unwrap().unwrap();
    assert_eq!(a.status(), Some(VideoStatus::Pending));
    assert!(a.updated_at >= a.created_at);
}

/// Cleanup removes only old completed/error videos.
#[tokio::test]
async fn test_delete_older_than() {
    let pool = setup().await;
    let old_done = VideoRepo::create(&pool, &new_video("old_done.mp4")).await.unwrap();
    let old_pending = VideoRepo::create(&pool, &new_video("old_pending.mp4")).await.unwrap();
    let new_done = VideoRepo::create(&pool, &new_video("new_done.mp4")).await.unwrap();

    VideoRepo::update_status(&pool, old_done.id, VideoStatus::Completed).await.unwrap();
    VideoRepo::update_status(&pool, new_done.id, VideoStatus::Completed).await.unwrap();

    let long_ago = Utc::now() - Duration::days(40);
    sqlx::query("UPDATE videos SET created_at = ? WHERE id IN (?, ?)")
        .bind(long_ago)
        .bind(old_done.id)
        .bind(old_pending.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(VideoRepo::delete_older_than(&pool, 30).await.unwrap(), 1);
    assert!(VideoRepo::find_by_id(&pool, old_done.id).await.unwrap().is_none());
    assert!(VideoRepo::find_by_id(&pool, old_pending.id).await.unwrap().is_some());
    assert!(VideoRepo::find_by_id(&pool, new_done.id).await.unwrap().is_some());
}

/// An age too large for a date is an error, not a panic.
#[tokio::test]
async fn test_delete_older_than_out_of_range() {
    let pool = setup().await;
    let video = VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();
    VideoRepo::update_status(&pool, video.id, VideoStatus::Completed).await.unwrap();

    let result = VideoRepo::delete_older_than(&pool, u32::MAX).await;

    assert_matches!(result, Err(sqlx::Error::Encode(_)));
    assert!(VideoRepo::find_by_id(&pool, video.id).await.unwrap().is_some());
}

/// Clearing prompts keeps videos; clearing everything removes both.
#[tokio::test]
async fn test_clear_prompts_and_all() {
    let pool = setup().await;
    let a = VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();
    let b = VideoRepo::create(&pool, &new_video("b.mp4")).await.unwrap();
    PromptRepo::create(&pool, &new_prompt(a.id, "x")).await.unwrap();
    PromptRepo::create(&pool, &new_prompt(b.id, "y")).await.unwrap();

    assert_eq!(PromptRepo::delete_by_video(&pool, a.id).await.unwrap(), 1);
    assert_eq!(PromptRepo::delete_all(&pool).await.unwrap(), 1);
    assert_eq!(VideoRepo::list_all(&pool).await.unwrap().len(), 2);

    assert_eq!(VideoRepo::delete_all(&pool).await.unwrap(), 2);
    assert!(VideoRepo::list_all(&pool).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Prompts and statistics
// ---------------------------------------------------------------------------

/// Copy flags and aggregate statistics.
#[tokio::test]
async fn test_copy_flags_and_stats() {
    let pool = setup().await;
    let a = VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();
    let b = VideoRepo::create(&pool, &new_video("b.mp4")).await.unwrap();
    VideoRepo::update_status(&pool, b.id, VideoStatus::Completed).await.unwrap();

    for text in ["one", "two", "three"] {
        PromptRepo::create(&pool, &new_prompt(a.id, text)).await.unwrap();
    }
    PromptRepo::create(&pool, &new_prompt(b.id, "four")).await.unwrap();

    assert_eq!(PromptRepo::mark_all_copied_for_video(&pool, a.id).await.unwrap(), 3);

    let prompts = PromptRepo::list_by_video(&pool, a.id).await.unwrap();
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[0].prompt_text, "three");
    assert!(prompts.iter().all(|p| p.is_copied));
    assert_eq!(prompts[0].status, "generated");

    let stats = StatsRepo::get_stats(&pool).await.unwrap();
    assert_eq!(stats.total_videos, 2);
    assert_eq!(stats.total_prompts, 4);
    assert_eq!(stats.copied_prompts, 3);
    assert_eq!(stats.pending_videos, 1);
    assert_eq!(stats.completed_videos, 1);
    assert_eq!(stats.error_videos, 0);
    assert!((stats.copy_rate() - 75.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Settings upsert, list, JSON helpers and delete.
#[tokio::test]
async fn test_settings_round_trip() {
    let pool = setup().await;
    assert!(SettingRepo::get(&pool, "theme").await.unwrap().is_none());

    SettingRepo::set(&pool, "theme", "dark").await.unwrap();
    SettingRepo::set(&pool, "theme", "light").await.unwrap();
    assert_eq!(SettingRepo::get(&pool, "theme").await.unwrap().as_deref(), Some("light"));

    SettingRepo::set_json(&pool, "numbers", &vec![1, 2, 3]).await.unwrap();
    let numbers: Option<Vec<i32>> = SettingRepo::get_json(&pool, "numbers").await.unwrap();
    assert_eq!(numbers, Some(vec![1, 2, 3]));

    let malformed: Option<Vec<i32>> = SettingRepo::get_json(&pool, "theme").await.unwrap();
    assert!(malformed.is_none());

    let keys: Vec<String> = SettingRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.key)
        .collect();
    assert_eq!(keys, vec!["numbers", "theme"]);

    assert!(SettingRepo::delete(&pool, "theme").await.unwrap());
    assert!(!SettingRepo::delete(&pool, "theme").await.unwrap());
}

/// `VACUUM INTO` writes a usable copy of the database.
#[tokio::test]
async fn test_backup_to_file() {
    let pool = setup().await;
    VideoRepo::create(&pool, &new_video("a.mp4")).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("backup.db");
    vidprompt_db::backup_to(&pool, &dest).await.unwrap();

    let copy = vidprompt_db::create_pool(&dest).await.unwrap();
    let videos = VideoRepo::list_all(&copy).await.unwrap();
    assert_eq!(videos.len(), 1);
}
