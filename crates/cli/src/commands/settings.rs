//! `settings`: the key-value table stored alongside the library.

use anyhow::Context;
use vidprompt_db::repositories::SettingRepo;

use crate::app::AppContext;
use crate::cli::SettingsAction;

pub async fn run(ctx: &AppContext, action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::List => {
            let settings = SettingRepo::list(&ctx.pool).await?;
            if settings.is_empty() {
                println!("No settings stored");
            }
            for s in settings {
                println!("{} = {}  ({})", s.key, s.value, s.updated_at.format("%Y-%m-%d %H:%M"));
            }
        }
        SettingsAction::Get { key } => {
            let value = SettingRepo::get(&ctx.pool, &key)
                .await?
                .with_context(|| format!("Setting {key} not found"))?;
            println!("{value}");
        }
        SettingsAction::Set { key, value } => {
            SettingRepo::set(&ctx.pool, &key, &value).await?;
            tracing::info!(key = %key, "Setting stored");
        }
        SettingsAction::Delete { key } => {
            if !SettingRepo::delete(&ctx.pool, &key).await? {
                anyhow::bail!("Setting {key} not found");
            }
            tracing::info!(key = %key, "Setting deleted");
        }
    }
    Ok(())
}
