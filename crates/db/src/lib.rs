//! SQLite persistence for the video library.
//!
//! The pool, migrations and backup helpers live here; table access goes
//! through the zero-sized repositories in [`repositories`].

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::SqlitePool;

/// Open (creating if needed) the database file at `path`.
///
/// Every connection has foreign keys enabled so deleting a video cascades
/// to its prompts.
pub async fn create_pool(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Single-connection in-memory database.
///
/// The connection never expires, otherwise the database would vanish
/// between queries.
pub async fn create_memory_pool() -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Write a consistent copy of the database to `dest` using `VACUUM INTO`.
///
/// `dest` must not exist yet.
pub async fn backup_to(pool: &DbPool, dest: &Path) -> Result<(), sqlx::Error> {
    let dest = dest.to_string_lossy().to_string();
    sqlx::query("VACUUM INTO ?").bind(&dest).execute(pool).await?;
    tracing::info!(path = %dest, "Database backup written");
    Ok(())
}
