//! Application configuration stored as a JSON file.
//!
//! The file is split into four sections (`api`, `video`, `generation`,
//! `database`). Values are addressed with dot-notation key paths such as
//! `generation.max_prompts_per_batch`, which is how the command-line
//! `config get` / `config set` subcommands expose them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default Generative Language API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Errors raised while loading, saving or editing the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config key not found: {0}")]
    UnknownKey(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Generative-AI API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Fallback key used when `GENAI_API_KEY` is not set in the environment.
    pub genai_api_key: String,
    pub model_name: String,
    pub available_models: Vec<String>,
    pub base_url: String,
    /// Timeout applied to every individual HTTP request.
    pub request_timeout_seconds: u64,
}

/// Video file acceptance and upload settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Lower-case extensions including the leading dot.
    pub supported_formats: Vec<String>,
    pub max_file_size_mb: u64,
    pub min_file_size_mb: u64,
    pub max_file_size_limit: u64,
    /// Upper bound on waiting for an uploaded file to become active.
    pub upload_timeout_seconds: u64,
    pub min_upload_timeout: u64,
    pub max_upload_timeout: u64,
    /// Delay between file-state polls while the API processes an upload.
    pub poll_interval_seconds: u64,
}

/// Prompt generation defaults and ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub default_prompts_per_video: u32,
    pub min_prompts_per_video: u32,
    pub max_prompts_per_video: u32,
    pub max_prompts_per_batch: u32,
    pub default_complexity_level: u32,
    pub min_complexity_level: u32,
    pub max_complexity_level: u32,
    /// One description per complexity level, lowest level first.
    pub complexity_levels: Vec<String>,
    pub default_variation_level: u32,
    pub min_variation_level: u32,
    pub max_variation_level: u32,
    /// Keyed by the level rendered as a string (`"1"`, `"2"`, ...).
    pub variation_instructions: BTreeMap<String, String>,
    pub default_aspect_ratio: String,
    pub available_aspect_ratios: Vec<String>,
    /// Human-readable description per aspect ratio.
    pub aspect_ratios: BTreeMap<String, String>,
}

/// Local database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Relative paths are resolved against the config file's directory.
    pub filename: String,
    /// `0` disables automatic cleanup at startup.
    pub auto_cleanup_days: u32,
    pub min_cleanup_days: u32,
    pub max_cleanup_days: u32,
    /// Take a backup next to the database before automatic cleanup.
    pub backup_enabled: bool,
}

/// The complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub video: VideoConfig,
    pub generation: GenerationConfig,
    pub database: DatabaseConfig,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            genai_api_key: String::new(),
            model_name: "gemini-2.5-flash".to_string(),
            available_models: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.5-pro".to_string(),
                "gemini-2.0-flash".to_string(),
            ],
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: 120,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            supported_formats: [
                ".mp4", ".mov", ".avi", ".mkv", ".webm", ".m4v", ".mpeg", ".mpg", ".wmv", ".flv",
                ".3gp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_file_size_mb: 200,
            min_file_size_mb: 1,
            max_file_size_limit: 2000,
            upload_timeout_seconds: 300,
            min_upload_timeout: 30,
            max_upload_timeout: 1800,
            poll_interval_seconds: 2,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let variation_instructions = [
            ("1", "Keep every prompt very close to the original video content"),
            ("2", "Allow minor variations in style, lighting or framing"),
            ("3", "Balance faithfulness with moderate creative reinterpretation"),
            ("4", "Explore bold alternative styles, moods and camera work"),
            ("5", "Treat the video as loose inspiration and maximise creative diversity"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let aspect_ratios: BTreeMap<String, String> = [
            ("16:9", "Landscape widescreen"),
            ("9:16", "Vertical portrait for mobile and social"),
            ("1:1", "Square"),
            ("4:3", "Standard format"),
            ("21:9", "Cinematic ultrawide"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            default_prompts_per_video: 5,
            min_prompts_per_video: 1,
            max_prompts_per_video: 50,
            max_prompts_per_batch: 5,
            default_complexity_level: 3,
            min_complexity_level: 1,
            max_complexity_level: 5,
            complexity_levels: vec![
                "Simple - short prompt naming the main subject and action".to_string(),
                "Basic - subject, action and setting".to_string(),
                "Moderate - subject, action, setting, lighting and mood".to_string(),
                "Detailed - adds camera movement, composition and visual style".to_string(),
                "Expert - cinematic shot-by-shot direction with technical detail".to_string(),
            ],
            default_variation_level: 3,
            min_variation_level: 1,
            max_variation_level: 5,
            variation_instructions,
            default_aspect_ratio: "16:9".to_string(),
            available_aspect_ratios: vec![
                "16:9".to_string(),
                "9:16".to_string(),
                "1:1".to_string(),
                "4:3".to_string(),
                "21:9".to_string(),
            ],
            aspect_ratios,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            filename: "video_prompts.db".to_string(),
            auto_cleanup_days: 0,
            min_cleanup_days: 1,
            max_cleanup_days: 365,
            backup_enabled: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading / saving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load the configuration from `path`.
    ///
    /// A missing file is created with the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::warn!(path = %path.display(), "Config file not found, wrote defaults");
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write the configuration to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    // -- Dot-notation access --

    /// Look up a value by dot-notation key path, e.g. `api.model_name`.
    ///
    /// A path naming a whole section returns the section object.
    pub fn get(&self, key_path: &str) -> Result<Value, ConfigError> {
        let root = serde_json::to_value(self)?;
        let mut current = &root;
        for key in key_path.split('.') {
            current = current
                .get(key)
                .ok_or_else(|| ConfigError::UnknownKey(key_path.to_string()))?;
        }
        Ok(current.clone())
    }

    /// Update a value by dot-notation key path.
    ///
    /// `raw` is parsed as JSON when the existing value is not a string, so
    /// `5`, `true` and `[".mp4"]` become a number, a boolean and an array.
    /// The updated configuration must still validate; otherwise it is
    /// rejected and `self` is left unchanged.
    pub fn set(&mut self, key_path: &str, raw: &str) -> Result<(), ConfigError> {
        let mut root = serde_json::to_value(&*self)?;

        let (parents, last) = match key_path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, key_path),
        };

        let mut current = &mut root;
        if let Some(parents) = parents {
            for key in parents.split('.') {
                current = current
                    .get_mut(key)
                    .ok_or_else(|| ConfigError::UnknownKey(key_path.to_string()))?;
            }
        }

        let slot = current
            .as_object_mut()
            .and_then(|obj| obj.get_mut(last))
            .ok_or_else(|| ConfigError::UnknownKey(key_path.to_string()))?;

        *slot = if slot.is_string() {
            Value::String(raw.to_string())
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        };

        let updated: AppConfig = serde_json::from_value(root)
            .map_err(|e| ConfigError::Invalid(format!("{key_path}: {e}")))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    // -- Validation --

    /// Check that ranges, defaults and lookup tables are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        let v = &self.video;
        let d = &self.database;

        check_range(
            "generation.default_prompts_per_video",
            g.min_prompts_per_video.max(1) as u64,
            g.default_prompts_per_video as u64,
            g.max_prompts_per_video as u64,
        )?;
        check_range(
            "generation.default_complexity_level",
            g.min_complexity_level.max(1) as u64,
            g.default_complexity_level as u64,
            g.max_complexity_level as u64,
        )?;
        check_range(
            "generation.default_variation_level",
            g.min_variation_level.max(1) as u64,
            g.default_variation_level as u64,
            g.max_variation_level as u64,
        )?;
        check_range(
            "video.max_file_size_mb",
            v.min_file_size_mb,
            v.max_file_size_mb,
            v.max_file_size_limit,
        )?;
        check_range(
            "video.upload_timeout_seconds",
            v.min_upload_timeout,
            v.upload_timeout_seconds,
            v.max_upload_timeout,
        )?;

        if g.max_prompts_per_batch == 0 {
            return Err(ConfigError::Invalid(
                "generation.max_prompts_per_batch must be at least 1".to_string(),
            ));
        }
        if v.poll_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "video.poll_interval_seconds must be at least 1".to_string(),
            ));
        }

        let complexity_count = (g.max_complexity_level - g.min_complexity_level + 1) as usize;
        if g.complexity_levels.len() != complexity_count {
            return Err(ConfigError::Invalid(format!(
                "generation.complexity_levels must have {complexity_count} entries, got {}",
                g.complexity_levels.len()
            )));
        }

        for level in g.min_variation_level..=g.max_variation_level {
            if !g.variation_instructions.contains_key(&level.to_string()) {
                return Err(ConfigError::Invalid(format!(
                    "generation.variation_instructions is missing level {level}"
                )));
            }
        }

        if !g.available_aspect_ratios.contains(&g.default_aspect_ratio) {
            return Err(ConfigError::Invalid(format!(
                "generation.default_aspect_ratio '{}' is not one of: {}",
                g.default_aspect_ratio,
                g.available_aspect_ratios.join(", ")
            )));
        }
        if let Some(missing) = g
            .available_aspect_ratios
            .iter()
            .find(|r| !g.aspect_ratios.contains_key(*r))
        {
            return Err(ConfigError::Invalid(format!(
                "generation.aspect_ratios has no description for '{missing}'"
            )));
        }

        if d.auto_cleanup_days != 0 {
            check_range(
                "database.auto_cleanup_days",
                d.min_cleanup_days as u64,
                d.auto_cleanup_days as u64,
                d.max_cleanup_days as u64,
            )?;
        }

        if d.filename.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database.filename must not be empty".to_string(),
            ));
        }
        if self.api.model_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "api.model_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    // -- Typed accessors --

    /// Inclusive `(min, max)` prompts-per-video range.
    pub fn prompts_range(&self) -> (u32, u32) {
        (
            self.generation.min_prompts_per_video,
            self.generation.max_prompts_per_video,
        )
    }

    /// Inclusive `(min, max)` complexity range.
    pub fn complexity_range(&self) -> (u32, u32) {
        (
            self.generation.min_complexity_level,
            self.generation.max_complexity_level,
        )
    }

    /// Inclusive `(min, max)` variation range.
    pub fn variation_range(&self) -> (u32, u32) {
        (
            self.generation.min_variation_level,
            self.generation.max_variation_level,
        )
    }

    /// Description for a complexity level, if the level is in range.
    pub fn complexity_description(&self, level: u32) -> Option<&str> {
        let min = self.generation.min_complexity_level;
        level
            .checked_sub(min)
            .and_then(|idx| self.generation.complexity_levels.get(idx as usize))
            .map(String::as_str)
    }

    /// Instruction text for a variation level.
    pub fn variation_instruction(&self, level: u32) -> Option<&str> {
        self.generation
            .variation_instructions
            .get(&level.to_string())
            .map(String::as_str)
    }

    /// Description for an aspect ratio, falling back to `"Standard format"`.
    pub fn aspect_description(&self, ratio: &str) -> &str {
        self.generation
            .aspect_ratios
            .get(ratio)
            .map(String::as_str)
            .unwrap_or("Standard format")
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.video.max_file_size_mb * 1024 * 1024
    }

    /// Resolve the database file path relative to `base_dir`.
    pub fn database_path(&self, base_dir: &Path) -> PathBuf {
        let file = Path::new(&self.database.filename);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            base_dir.join(file)
        }
    }
}

fn check_range(name: &str, min: u64, value: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::Invalid(format!(
            "{name}: minimum {min} exceeds maximum {max}"
        )));
    }
    if value < min || value > max {
        return Err(ConfigError::Invalid(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn load_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api": {"model_name": "gemini-2.5-pro"}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.api.model_name, "gemini-2.5-pro");
        assert_eq!(config.generation.max_prompts_per_batch, 5);
    }

    #[test]
    fn load_invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert_matches!(AppConfig::load(&path), Err(ConfigError::Parse(_)));
    }

    #[test]
    fn get_nested_value() {
        let config = AppConfig::default();
        assert_eq!(
            config.get("generation.max_prompts_per_batch").unwrap(),
            serde_json::json!(5)
        );
        assert!(config.get("database").unwrap().is_object());
    }

    #[test]
    fn get_unknown_key_fails() {
        let config = AppConfig::default();
        assert_matches!(
            config.get("generation.nope"),
            Err(ConfigError::UnknownKey(key)) if key == "generation.nope"
        );
    }

    #[test]
    fn set_parses_numbers() {
        let mut config = AppConfig::default();
        config.set("generation.max_prompts_per_batch", "3").unwrap();
        assert_eq!(config.generation.max_prompts_per_batch, 3);
    }

    #[test]
    fn set_keeps_string_values_verbatim() {
        let mut config = AppConfig::default();
        config.set("generation.default_aspect_ratio", "9:16").unwrap();
        config.set("api.model_name", "123").unwrap();
        assert_eq!(config.generation.default_aspect_ratio, "9:16");
        assert_eq!(config.api.model_name, "123");
    }

    #[test]
    fn set_rejects_invalid_result_and_leaves_config_unchanged() {
        let mut config = AppConfig::default();
        let err = config
            .set("generation.default_aspect_ratio", "7:3")
            .unwrap_err();
        assert_matches!(err, ConfigError::Invalid(_));
        assert_eq!(config.generation.default_aspect_ratio, "16:9");
    }

    #[test]
    fn set_rejects_wrong_type() {
        let mut config = AppConfig::default();
        assert_matches!(
            config.set("generation.max_prompts_per_batch", "many"),
            Err(ConfigError::Invalid(_))
        );
    }

    #[test]
    fn set_unknown_key_fails() {
        let mut config = AppConfig::default();
        assert_matches!(
            config.set("video.colour", "red"),
            Err(ConfigError::UnknownKey(_))
        );
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let mut config = AppConfig::default();
        config.generation.max_prompts_per_batch = 0;
        assert_matches!(config.validate(), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn complexity_description_is_offset_by_minimum() {
        let config = AppConfig::default();
        assert!(config.complexity_description(1).unwrap().starts_with("Simple"));
        assert!(config.complexity_description(5).unwrap().starts_with("Expert"));
        assert!(config.complexity_description(0).is_none());
        assert!(config.complexity_description(6).is_none());
    }

    #[test]
    fn aspect_description_falls_back() {
        let config = AppConfig::default();
        assert_eq!(config.aspect_description("1:1"), "Square");
        assert_eq!(config.aspect_description("2:1"), "Standard format");
    }

    #[test]
    fn database_path_resolves_relative_names() {
        let mut config = AppConfig::default();
        let base = Path::new("/data/app");
        assert_eq!(
            config.database_path(base),
            PathBuf::from("/data/app/video_prompts.db")
        );

        config.database.filename = "/var/lib/prompts.db".to_string();
        assert_eq!(
            config.database_path(base),
            PathBuf::from("/var/lib/prompts.db")
        );
    }

    #[test]
    fn saved_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.set("database.auto_cleanup_days", "30").unwrap();
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }
}
