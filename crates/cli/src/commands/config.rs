//! `config`: view and edit the JSON settings file.

use std::path::Path;

use serde_json::Value;
use vidprompt_core::config::AppConfig;
use vidprompt_core::secrets;

use crate::app::load_config;
use crate::cli::ConfigAction;
use crate::commands::library::confirm;

pub fn run(config_path: &Path, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&masked(&config)?)?);
        }
        ConfigAction::Get { key } => {
            let config = load_config(config_path)?;
            println!("{}", display_value(&config.get(&key)?)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config(config_path)?;
            config.set(&key, &value)?;
            config.save(config_path)?;
            tracing::info!(key = %key, "Configuration updated");
            println!("{key} = {}", display_value(&config.get(&key)?)?);
        }
        ConfigAction::Reset { yes } => {
            if !yes && !confirm("Reset all settings to their defaults?")? {
                println!("Cancelled");
                return Ok(());
            }
            AppConfig::default().save(config_path)?;
            tracing::info!(path = %config_path.display(), "Configuration reset to defaults");
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}

/// Configuration as JSON with a stored API key masked.
pub fn masked(config: &AppConfig) -> anyhow::Result<Value> {
    let mut value = serde_json::to_value(config)?;
    if let Some(key) = value
        .get_mut("api")
        .and_then(|api| api.get_mut("genai_api_key"))
    {
        if let Some(raw) = key.as_str().filter(|s| !s.is_empty()) {
            *key = Value::String(secrets::mask_key(raw));
        }
    }
    Ok(value)
}

/// Strings print bare; everything else as pretty JSON.
pub fn display_value(value: &Value) -> anyhow::Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_key_is_masked() {
        let mut config = AppConfig::default();
        config.api.genai_api_key = "AIzaSyD-1234567890abcd".into();
        let value = masked(&config).unwrap();
        assert_eq!(value["api"]["genai_api_key"], "AIza…abcd");
        assert_eq!(value["api"]["model_name"], config.api.model_name.as_str());
    }

    #[test]
    fn display_value_keeps_strings_bare() {
        assert_eq!(display_value(&Value::from("16:9")).unwrap(), "16:9");
        assert_eq!(display_value(&Value::from(5)).unwrap(), "5");
    }

    #[test]
    fn set_then_save_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        run(
            &path,
            ConfigAction::Set {
                key: "generation.max_prompts_per_batch".into(),
                value: "8".into(),
            },
        )
        .unwrap();

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.generation.max_prompts_per_batch, 8);
    }

    #[test]
    fn reset_with_yes_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        run(&path, ConfigAction::Reset { yes: true }).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }
}
