//! API key storage in a `.env` file.
//!
//! The key lives in `GENAI_API_KEY`. It is read from the process
//! environment (populated from `.env` by [`dotenvy`]) and falls back to
//! `api.genai_api_key` in the JSON configuration.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::CoreError;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GENAI_API_KEY";

/// Value written into freshly created `.env` files.
pub const API_KEY_PLACEHOLDER: &str = "your_api_key_here";

/// Where a freshly created environment file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileSource {
    /// Copied from `.env.example` next to it.
    Example,
    /// Written from the built-in template with the placeholder key.
    Template,
}

/// Make sure `env_path` exists.
///
/// Copies `.env.example` from the same directory when present, otherwise
/// writes a template containing the placeholder key. Returns the source of
/// a newly created file, `None` when it already existed.
///
/// Runs before logging is set up, so callers report the outcome.
pub fn ensure_env_file(env_path: &Path) -> std::io::Result<Option<EnvFileSource>> {
    if env_path.exists() {
        return Ok(None);
    }

    let example = env_path.with_file_name(".env.example");
    if example.exists() {
        std::fs::copy(&example, env_path)?;
        Ok(Some(EnvFileSource::Example))
    } else {
        std::fs::write(
            env_path,
            format!("# Generative AI API configuration\n{API_KEY_ENV}={API_KEY_PLACEHOLDER}\n"),
        )?;
        Ok(Some(EnvFileSource::Template))
    }
}

/// Load `env_path` into the process environment, overriding existing values.
pub fn load_env_file(env_path: &Path) -> Result<(), dotenvy::Error> {
    dotenvy::from_path_override(env_path)
}

/// Resolve the configured API key.
///
/// Empty keys and the template placeholder count as "not configured".
pub fn get_api_key(config: &AppConfig) -> Result<String, CoreError> {
    let from_env = std::env::var(API_KEY_ENV).unwrap_or_default();
    let key = if from_env.trim().is_empty() {
        config.api.genai_api_key.clone()
    } else {
        from_env
    };
    let key = key.trim().to_string();

    if key.is_empty() || key == API_KEY_PLACEHOLDER {
        return Err(CoreError::Configuration(format!(
            "GenAI API key not configured. Please set {API_KEY_ENV} in .env file"
        )));
    }
    Ok(key)
}

/// Write `api_key` into `env_path`, replacing an existing `GENAI_API_KEY=`
/// line or appending one. Other lines are preserved. The key is also
/// exported into the current process environment.
pub fn set_api_key(env_path: &Path, api_key: &str) -> std::io::Result<()> {
    let existing = match std::fs::read_to_string(env_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let prefix = format!("{API_KEY_ENV}=");
    let mut found = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(&prefix) {
                found = true;
                format!("{prefix}{api_key}")
            } else {
                line.to_string()
            }
        })
        .collect();
    if !found {
        lines.push(format!("{prefix}{api_key}"));
    }

    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(env_path, content)?;

    std::env::set_var(API_KEY_ENV, api_key);
    tracing::info!(path = %env_path.display(), "API key saved");
    Ok(())
}

/// Mask a key for display, keeping the first and last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
