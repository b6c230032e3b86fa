//! `vidprompt` -- generate AI art prompts from video files.
//!
//! Imports videos into a local SQLite library, uploads them to the
//! generative-AI API and stores the prompts it returns.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default       | Description                                  |
//! |----------------------|----------|---------------|----------------------------------------------|
//! | `GENAI_API_KEY`      | for API  | --            | API key, usually read from the `.env` file   |
//! | `VIDPROMPT_CONFIG`   | no       | `config.json` | Path of the JSON settings file               |
//! | `VIDPROMPT_ENV_FILE` | no       | `.env`        | Path of the environment file                 |
//! | `VIDPROMPT_LOG_FORMAT` | no     | `text`        | `json` for one JSON object per log line      |
//! | `RUST_LOG`           | no       | `vidprompt=info` | Log filter                                |
//!
//! The environment file is loaded before logging starts, so `RUST_LOG` and
//! `VIDPROMPT_LOG_FORMAT` may be set there. `VIDPROMPT_CONFIG` and
//! `VIDPROMPT_ENV_FILE` are read while parsing arguments and must come from
//! the real environment.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidprompt_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = vidprompt_cli::app::prepare_env(&cli.env_file);
    init_tracing();
    env.log();

    match vidprompt_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vidprompt=info".into());

    let json = std::env::var("VIDPROMPT_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
