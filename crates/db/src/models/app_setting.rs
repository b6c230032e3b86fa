//! Key-value application settings.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vidprompt_core::types::Timestamp;

/// A row from the `app_settings` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AppSetting {
    pub key: String,
    pub value: String,
    pub updated_at: Timestamp,
}
