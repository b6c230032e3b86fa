//! `api-key`: store, inspect and test the GenAI API key.

use std::path::Path;

use vidprompt_core::config::AppConfig;
use vidprompt_core::secrets::{self, API_KEY_ENV};
use vidprompt_genai::{GenAiClient, PromptBackend};

use crate::cli::ApiKeyAction;

pub async fn run(config: &AppConfig, env_path: &Path, action: ApiKeyAction) -> anyhow::Result<()> {
    match action {
        ApiKeyAction::Set { key } => {
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("API key must not be empty");
            }
            secrets::set_api_key(env_path, key)?;
            println!("API key saved to {}", env_path.display());
        }
        ApiKeyAction::Show => match secrets::get_api_key(config) {
            Ok(key) => println!("{} ({})", secrets::mask_key(&key), key_source(config)),
            Err(e) => println!("{e}"),
        },
        ApiKeyAction::Test { model } => {
            let key = secrets::get_api_key(config)?;
            let mut client = GenAiClient::from_config(config, &key)?;
            if let Some(model) = model {
                client = client.with_model(model);
            }
            println!("Testing API with model {}...", client.model());
            match client.test_connection().await {
                Ok(()) => println!("API connection successful!"),
                Err(e) => anyhow::bail!("API connection failed: {e}"),
            }
        }
    }
    Ok(())
}

/// Where the effective key comes from.
fn key_source(config: &AppConfig) -> &'static str {
    let from_env = std::env::var(API_KEY_ENV).unwrap_or_default();
    if !from_env.trim().is_empty() && from_env.trim() != secrets::API_KEY_PLACEHOLDER {
        "environment"
    } else if !config.api.genai_api_key.trim().is_empty() {
        "config file"
    } else {
        "unset"
    }
}
