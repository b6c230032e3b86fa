//! `db`: database location, backups and cleanup.

use vidprompt_db::repositories::VideoRepo;

use crate::app::AppContext;
use crate::cli::DbAction;

/// Retention used by `db cleanup` when neither `--days` nor
/// `database.auto_cleanup_days` is set.
const DEFAULT_CLEANUP_DAYS: u32 = 30;

pub async fn run(ctx: &AppContext, action: DbAction) -> anyhow::Result<()> {
    match action {
        DbAction::Where => println!("{}", ctx.database_path().display()),
        DbAction::Backup { path } => {
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            vidprompt_db::backup_to(&ctx.pool, &path).await?;
            println!("Backup written to {}", path.display());
        }
        DbAction::Cleanup { days } => {
            let (days, removed) = cleanup(ctx, days).await?;
            println!("Removed {removed} video(s) older than {days} days");
        }
    }
    Ok(())
}

/// Delete finished videos older than `requested` days, falling back to the
/// configured retention. Returns the retention used and the number removed.
///
/// An explicit value must lie within `database.min_cleanup_days` and
/// `database.max_cleanup_days`.
pub async fn cleanup(ctx: &AppContext, requested: Option<u32>) -> anyhow::Result<(u32, u64)> {
    let db = &ctx.config.database;
    if let Some(days) = requested {
        if !(db.min_cleanup_days..=db.max_cleanup_days).contains(&days) {
            anyhow::bail!(
                "Cleanup days must be between {} and {}, got {days}",
                db.min_cleanup_days,
                db.max_cleanup_days
            );
        }
    }

    let days = cleanup_days(requested, db.auto_cleanup_days);
    let removed = VideoRepo::delete_older_than(&ctx.pool, days).await?;
    tracing::info!(days, removed, "Manual cleanup finished");
    Ok((days, removed))
}

fn cleanup_days(requested: Option<u32>, configured: u32) -> u32 {
    match (requested, configured) {
        (Some(days), _) => days,
        (None, 0) => DEFAULT_CLEANUP_DAYS,
        (None, days) => days,
    }
}
