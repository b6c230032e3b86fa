//! Startup sequence and the state shared by subcommands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use vidprompt_core::config::AppConfig;
use vidprompt_core::secrets::{self, EnvFileSource};
use vidprompt_db::repositories::VideoRepo;
use vidprompt_db::DbPool;

/// Loaded configuration plus an open, migrated database.
pub struct AppContext {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub env_path: PathBuf,
    pub pool: DbPool,
}

impl AppContext {
    /// Full startup: configuration, database, migrations and auto-cleanup.
    ///
    /// Expects [`prepare_env`] to have run.
    pub async fn open(config_path: &Path, env_path: &Path) -> anyhow::Result<Self> {
        let config = load_config(config_path)?;

        let db_path = config.database_path(&base_dir(config_path));
        let pool = vidprompt_db::create_pool(&db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        vidprompt_db::health_check(&pool).await?;
        vidprompt_db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::debug!(path = %db_path.display(), "Database ready");

        let ctx = Self {
            config,
            config_path: config_path.to_path_buf(),
            env_path: env_path.to_path_buf(),
            pool,
        };

        if let Err(e) = ctx.auto_cleanup().await {
            tracing::warn!(error = %e, "Automatic cleanup failed");
        }
        if secrets::get_api_key(&ctx.config).is_err() {
            tracing::warn!("GenAI API key not configured, prompt generation is unavailable");
        }

        Ok(ctx)
    }

    /// Context over an already migrated pool, skipping the startup side effects.
    pub fn from_parts(config: AppConfig, config_path: PathBuf, env_path: PathBuf, pool: DbPool) -> Self {
        Self {
            config,
            config_path,
            env_path,
            pool,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path(&base_dir(&self.config_path))
    }

    /// Delete old finished videos when `database.auto_cleanup_days` is set,
    /// taking a backup first when `database.backup_enabled` is on.
    /// Returns the number of videos removed.
    pub async fn auto_cleanup(&self) -> anyhow::Result<u64> {
        let days = self.config.database.auto_cleanup_days;
        if days == 0 {
            return Ok(0);
        }

        if self.config.database.backup_enabled {
            let dest = backup_path(&self.database_path(), chrono::Utc::now());
            vidprompt_db::backup_to(&self.pool, &dest)
                .await
                .with_context(|| format!("Failed to back up database to {}", dest.display()))?;
        }

        let removed = VideoRepo::delete_older_than(&self.pool, days).await?;
        if removed > 0 {
            tracing::info!(days, removed, "Old videos cleaned up");
        }
        Ok(removed)
    }
}

/// Outcome of [`prepare_env`], logged by [`EnvSetup::log`] once tracing is up.
#[derive(Debug)]
pub struct EnvSetup {
    pub path: PathBuf,
    pub created: Option<EnvFileSource>,
    pub error: Option<anyhow::Error>,
}

impl EnvSetup {
    pub fn log(&self) {
        let path = &self.path;
        match self.created {
            Some(EnvFileSource::Example) => tracing::warn!(
                path = %path.display(),
                "Created .env from example, edit it and add your API key",
            ),
            Some(EnvFileSource::Template) => tracing::warn!(
                path = %path.display(),
                "Created .env with default template, edit it and add your API key",
            ),
            None => {}
        }
        match &self.error {
            Some(e) => tracing::warn!(
                path = %path.display(),
                error = %format!("{e:#}"),
                "Environment file not loaded",
            ),
            None => tracing::debug!(path = %path.display(), "Loaded environment file"),
        }
    }
}

/// Create the environment file if missing and load it into the process
/// environment. Runs before tracing is initialised so `RUST_LOG` and
/// `VIDPROMPT_LOG_FORMAT` may come from the file.
pub fn prepare_env(env_path: &Path) -> EnvSetup {
    let mut setup = EnvSetup {
        path: env_path.to_path_buf(),
        created: None,
        error: None,
    };
    match secrets::ensure_env_file(env_path) {
        Ok(created) => {
            setup.created = created;
            if let Err(e) = secrets::load_env_file(env_path) {
                setup.error = Some(e.into());
            }
        }
        Err(e) => {
            setup.error = Some(anyhow::Error::new(e).context("Could not create environment file"));
        }
    }
    setup
}

pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    AppConfig::load(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}

/// Directory relative paths in the configuration are resolved against.
pub fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<db>.<timestamp>.bak` next to the database file.
pub fn backup_path(db_path: &Path, now: chrono::DateTime<chrono::Utc>) -> PathBuf {
    let mut name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "database".to_string());
    name.push_str(&format!(".{}.bak", now.format("%Y%m%d-%H%M%S")));
    db_path.with_file_name(name)
}
