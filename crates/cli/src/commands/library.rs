//! Video library commands: add, list, remove, clear, reset, stats.

use std::path::PathBuf;

use vidprompt_core::error::CoreError;
use vidprompt_core::probe;
use vidprompt_core::types::DbId;
use vidprompt_core::video::{self, VideoStatus};
use vidprompt_db::models::video::{CreateVideo, Video};
use vidprompt_db::repositories::{PromptRepo, StatsRepo, VideoRepo};

use crate::app::AppContext;
use crate::render;

/// Outcome of importing a batch of paths.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub added: Vec<Video>,
    /// User-facing notices for files that were skipped.
    pub skipped: Vec<String>,
}

/// Import files and folders into the library.
///
/// Folders are walked recursively and files with unsupported extensions
/// are ignored. Files already in the library and files above the size
/// limit are reported in [`ImportReport::skipped`].
pub async fn import_paths(ctx: &AppContext, paths: &[PathBuf]) -> anyhow::Result<ImportReport> {
    let formats = &ctx.config.video.supported_formats;
    let max_bytes = ctx.config.max_file_size_bytes();
    let mut report = ImportReport::default();

    for path in video::collect_video_files(paths, formats) {
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        let name = video::display_name(&path);
        let filepath = path.to_string_lossy().to_string();

        if VideoRepo::find_by_path(&ctx.pool, &filepath).await?.is_some() {
            report
                .skipped
                .push(format!("File {name} already exists in the list"));
            continue;
        }

        let size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read file metadata");
                report.skipped.push(format!("File {name} is not readable"));
                continue;
            }
        };
        if size > max_bytes {
            report.skipped.push(format!(
                "File {name} is larger than {}MB",
                ctx.config.video.max_file_size_mb
            ));
            continue;
        }

        let duration_secs = probe::probe_metadata(&path)
            .await
            .and_then(|m| m.duration_secs);

        let created = VideoRepo::create(
            &ctx.pool,
            &CreateVideo {
                filename: name,
                filepath,
                filesize: i64::try_from(size).unwrap_or(i64::MAX),
                duration_secs,
            },
        )
        .await?;
        tracing::info!(video_id = created.id, path = %created.filepath, "Video added");
        report.added.push(created);
    }

    Ok(report)
}

pub async fn add(ctx: &AppContext, paths: &[PathBuf]) -> anyhow::Result<()> {
    let report = import_paths(ctx, paths).await?;
    for video in &report.added {
        println!("Added #{} {}", video.id, video.filename);
    }
    for notice in &report.skipped {
        println!("{notice}");
    }
    if report.added.is_empty() && report.skipped.is_empty() {
        println!("No supported video files found");
    } else {
        println!("{} video(s) added", report.added.len());
    }
    Ok(())
}

pub async fn list(ctx: &AppContext, status: Option<VideoStatus>) -> anyhow::Result<()> {
    let videos = VideoRepo::list_with_counts(&ctx.pool, status).await?;
    if videos.is_empty() {
        println!("No videos");
    } else {
        print!("{}", render::video_table(&videos));
    }
    Ok(())
}

pub async fn remove(ctx: &AppContext, video_id: DbId) -> anyhow::Result<()> {
    let video = find_video(ctx, video_id).await?;
    VideoRepo::delete(&ctx.pool, video_id).await?;
    tracing::info!(video_id, "Video removed");
    println!("Removed {}", video.filename);
    Ok(())
}

/// Delete prompts of one video, or of every video when `video_id` is `None`.
/// Affected videos go back to `pending`.
pub async fn clear_prompts(ctx: &AppContext, video_id: Option<DbId>) -> anyhow::Result<u64> {
    match video_id {
        Some(id) => {
            find_video(ctx, id).await?;
            let removed = PromptRepo::delete_by_video(&ctx.pool, id).await?;
            VideoRepo::update_status(&ctx.pool, id, VideoStatus::Pending).await?;
            Ok(removed)
        }
        None => {
            let removed = PromptRepo::delete_all(&ctx.pool).await?;
            let ids: Vec<DbId> = VideoRepo::list_all(&ctx.pool)
                .await?
                .into_iter()
                .map(|v| v.id)
                .collect();
            VideoRepo::reset_statuses(&ctx.pool, &ids, VideoStatus::Pending).await?;
            Ok(removed)
        }
    }
}

pub async fn clear(ctx: &AppContext, video_id: Option<DbId>, all: bool, yes: bool) -> anyhow::Result<()> {
    if all {
        if !yes && !confirm("Delete ALL videos and prompts?")? {
            println!("Cancelled");
            return Ok(());
        }
        let removed = VideoRepo::delete_all(&ctx.pool).await?;
        tracing::info!(removed, "Library cleared");
        println!("Removed {removed} video(s) and their prompts");
        return Ok(());
    }

    let question = match video_id {
        Some(id) => format!("Delete all prompts of video #{id}?"),
        None => "Delete the prompts of every video?".to_string(),
    };
    if !yes && !confirm(&question)? {
        println!("Cancelled");
        return Ok(());
    }
    let removed = clear_prompts(ctx, video_id).await?;
    tracing::info!(removed, video_id = ?video_id, "Prompts cleared");
    println!("Removed {removed} prompt(s)");
    Ok(())
}

pub async fn reset(ctx: &AppContext, errors: bool, ids: &[DbId]) -> anyhow::Result<()> {
    if !errors && ids.is_empty() {
        anyhow::bail!("Nothing to reset: pass video ids or --errors");
    }

    let mut total = 0;
    if errors {
        total += VideoRepo::reset_errors_to_pending(&ctx.pool).await?;
    }
    if !ids.is_empty() {
        total += VideoRepo::reset_statuses(&ctx.pool, ids, VideoStatus::Pending).await?;
    }
    println!("{total} video(s) reset to pending");
    Ok(())
}

pub async fn stats(ctx: &AppContext) -> anyhow::Result<()> {
    let stats = StatsRepo::get_stats(&ctx.pool).await?;
    print!("{}", render::stats(&stats));
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_video(ctx: &AppContext, video_id: DbId) -> anyhow::Result<Video> {
    VideoRepo::find_by_id(&ctx.pool, video_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "video",
                id: video_id,
            }
            .into()
        })
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub(crate) fn confirm(question: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
