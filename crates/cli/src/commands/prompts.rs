//! Prompt browsing and copying. Copying prints to stdout.

use vidprompt_core::error::CoreError;
use vidprompt_core::types::DbId;
use vidprompt_db::models::prompt::Prompt;
use vidprompt_db::repositories::{PromptRepo, VideoRepo};

use crate::app::AppContext;
use crate::commands::library::find_video;
use crate::render;

pub async fn list(ctx: &AppContext, video_id: DbId) -> anyhow::Result<()> {
    let video = find_video(ctx, video_id).await?;
    let prompts = PromptRepo::list_by_video(&ctx.pool, video_id).await?;
    println!("{} ({} prompts)", video.filename, prompts.len());
    if prompts.is_empty() {
        println!("No prompts yet");
    } else {
        print!("{}", render::prompt_list(&prompts));
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, prompt_id: DbId) -> anyhow::Result<()> {
    let prompt = find_prompt(ctx, prompt_id).await?;
    let video = VideoRepo::find_by_id(&ctx.pool, prompt.video_id).await?;
    print!(
        "{}",
        render::prompt_details(&prompt, video.as_ref().map(|v| v.filename.as_str()))
    );
    Ok(())
}

/// Mark one prompt copied and return its text.
pub async fn copy_prompt(ctx: &AppContext, prompt_id: DbId) -> anyhow::Result<String> {
    let prompt = find_prompt(ctx, prompt_id).await?;
    PromptRepo::mark_copied(&ctx.pool, prompt_id).await?;
    tracing::debug!(prompt_id, "Prompt copied");
    Ok(prompt.prompt_text)
}

/// Numbered text of every prompt of a video, newest first, with all of
/// them marked copied. `None` when the video has no prompts.
pub async fn copy_all_prompts(ctx: &AppContext, video_id: DbId) -> anyhow::Result<Option<String>> {
    find_video(ctx, video_id).await?;
    let prompts = PromptRepo::list_by_video(&ctx.pool, video_id).await?;
    if prompts.is_empty() {
        return Ok(None);
    }

    let text = render::format_copy_all(&prompts);
    let marked = PromptRepo::mark_all_copied_for_video(&ctx.pool, video_id).await?;
    tracing::debug!(video_id, count = prompts.len(), marked, "All prompts copied");
    Ok(Some(text))
}

pub async fn copy(ctx: &AppContext, prompt_id: DbId) -> anyhow::Result<()> {
    let text = copy_prompt(ctx, prompt_id).await?;
    println!("{text}");
    tracing::info!(preview = %render::preview(&text, render::PREVIEW_LEN), "Prompt marked as copied");
    Ok(())
}

pub async fn copy_all(ctx: &AppContext, video_id: DbId) -> anyhow::Result<()> {
    match copy_all_prompts(ctx, video_id).await? {
        Some(text) => println!("{text}"),
        None => println!("No prompts to copy"),
    }
    Ok(())
}

async fn find_prompt(ctx: &AppContext, prompt_id: DbId) -> anyhow::Result<Prompt> {
    PromptRepo::find_by_id(&ctx.pool, prompt_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "prompt",
                id: prompt_id,
            }
            .into()
        })
}
