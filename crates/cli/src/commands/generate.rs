//! `generate`: run prompt generation in the foreground.
//!
//! Progress events are printed as they arrive. The first Ctrl-C asks the
//! worker to stop after the batch in flight; the command then waits for
//! the run to wind down so video statuses stay consistent.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use vidprompt_core::generation::{GenerationParams, LAST_PARAMS_SETTING_KEY};
use vidprompt_core::secrets;
use vidprompt_db::repositories::SettingRepo;
use vidprompt_genai::GenAiClient;
use vidprompt_pipeline::{select_videos, PromptGenerator};

use crate::app::AppContext;
use crate::cli::{GenerateArgs, ModeArg};
use crate::render;

/// Parameters for this run: configured defaults, or the previous run's
/// parameters with `--last`, overridden by explicit flags.
pub async fn resolve_params(ctx: &AppContext, args: &GenerateArgs) -> anyhow::Result<GenerationParams> {
    let mut params = if args.last {
        match SettingRepo::get_json::<GenerationParams>(&ctx.pool, LAST_PARAMS_SETTING_KEY).await? {
            Some(last) => last,
            None => {
                tracing::info!("No previous generation parameters, using defaults");
                GenerationParams::from_config(&ctx.config)
            }
        }
    } else {
        GenerationParams::from_config(&ctx.config)
    };

    if let Some(n) = args.prompts {
        params.prompts_per_video = n;
    }
    if let Some(level) = args.complexity {
        params.complexity_level = level;
    }
    if let Some(level) = args.variation {
        params.variation_level = level;
    }
    if let Some(ratio) = &args.aspect_ratio {
        params.aspect_ratio = ratio.clone();
    }
    Ok(params)
}

/// `--video` ids only make sense with `--mode selected`.
pub fn check_selection(args: &GenerateArgs) -> anyhow::Result<()> {
    if !args.videos.is_empty() && args.mode != ModeArg::Selected {
        anyhow::bail!("--video requires --mode selected");
    }
    Ok(())
}

pub async fn run(ctx: &AppContext, args: &GenerateArgs) -> anyhow::Result<()> {
    check_selection(args)?;
    let api_key = secrets::get_api_key(&ctx.config)?;
    let params = resolve_params(ctx, args).await?;
    let videos = select_videos(&ctx.pool, args.mode.into(), &args.videos).await?;

    let backend = GenAiClient::from_config(&ctx.config, &api_key)?;
    let generator = PromptGenerator::new(
        ctx.pool.clone(),
        Arc::new(backend),
        Arc::new(ctx.config.clone()),
    );

    let mut handle = generator.start(params, videos).await?;
    tracing::debug!(run_id = %handle.run_id, "Generation run started");

    let mut stop_requested = false;
    loop {
        tokio::select! {
            event = handle.events.recv() => match event {
                Ok(event) => {
                    println!("{}", render::event_line(&event));
                    if matches!(event, vidprompt_pipeline::GenerationEvent::Finished { .. }) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Progress output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c(), if !stop_requested => {
                stop_requested = true;
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                    continue;
                }
                if generator.stop().await {
                    println!("Stopping generation...");
                }
            }
        }
    }

    let stats = handle.join.await?;
    if stats.failed_videos > 0 {
        anyhow::bail!("{} video(s) failed", stats.failed_videos);
    }
    Ok(())
}
