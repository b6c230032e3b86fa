//! Command-line front end for vidprompt.
//!
//! The binary in `main.rs` loads the environment file, sets up tracing and
//! calls [`run`]; the subcommands live in [`commands`] so they can be tested
//! against an in-memory database.

pub mod app;
pub mod cli;
pub mod commands;
pub mod render;

use crate::app::AppContext;
use crate::cli::{ClearTarget, Cli, Command};

/// Execute one parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // Settings commands work without a database so a broken config
        // can still be reset.
        Command::Config { action } => commands::config::run(&cli.config, action),
        Command::ApiKey { action } => {
            let config = app::load_config(&cli.config)?;
            commands::api_key::run(&config, &cli.env_file, action).await
        }
        command => {
            let ctx = AppContext::open(&cli.config, &cli.env_file).await?;
            dispatch(&ctx, command).await
        }
    }
}

async fn dispatch(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    use commands::{db, generate, library, prompts, settings};

    match command {
        Command::Add { paths } => library::add(ctx, &paths).await,
        Command::List { status } => library::list(ctx, status.map(Into::into)).await,
        Command::Prompts { video_id } => prompts::list(ctx, video_id).await,
        Command::Show { prompt_id } => prompts::show(ctx, prompt_id).await,
        Command::Copy { prompt_id } => prompts::copy(ctx, prompt_id).await,
        Command::CopyAll { video_id } => prompts::copy_all(ctx, video_id).await,
        Command::Generate(args) => generate::run(ctx, &args).await,
        Command::Remove { video_id } => library::remove(ctx, video_id).await,
        Command::Clear { target } => match target {
            ClearTarget::Prompts { video, yes } => library::clear(ctx, video, false, yes).await,
            ClearTarget::All { yes } => library::clear(ctx, None, true, yes).await,
        },
        Command::Reset { errors, ids } => library::reset(ctx, errors, &ids).await,
        Command::Stats => library::stats(ctx).await,
        Command::Settings { action } => settings::run(ctx, action).await,
        Command::Db { action } => db::run(ctx, action).await,
        Command::Config { action } => commands::config::run(&ctx.config_path, action),
        Command::ApiKey { action } => {
            commands::api_key::run(&ctx.config, &ctx.env_path, action).await
        }
    }
}
