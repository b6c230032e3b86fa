//! Repository for the `app_settings` key-value table.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::app_setting::AppSetting;

const COLUMNS: &str = "key, value, updated_at";

/// Provides get/set access to application settings.
pub struct SettingRepo;

impl SettingRepo {
    /// Value stored under `key`, if any.
    pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Insert or replace the value stored under `key`.
    pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<AppSetting, sqlx::Error> {
        let query = format!(
            "INSERT INTO app_settings (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT (key) DO UPDATE
             SET value = excluded.value,
                 updated_at = excluded.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AppSetting>(&query)
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    /// All settings ordered by key.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<AppSetting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM app_settings ORDER BY key");
        sqlx::query_as::<_, AppSetting>(&query).fetch_all(pool).await
    }

    /// Remove `key`. Returns `true` if it existed.
    pub async fn delete(pool: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM app_settings WHERE key = ?")
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Read a JSON-encoded value. A value that no longer deserializes is
    /// logged and treated as absent.
    pub async fn get_json<T: DeserializeOwned>(
        pool: &SqlitePool,
        key: &str,
    ) -> Result<Option<T>, sqlx::Error> {
        let Some(raw) = Self::get(pool, key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring malformed setting value");
                Ok(None)
            }
        }
    }

    /// Store `value` JSON-encoded under `key`.
    pub async fn set_json<T: Serialize>(
        pool: &SqlitePool,
        key: &str,
        value: &T,
    ) -> Result<AppSetting, sqlx::Error> {
        let raw = serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        Self::set(pool, key, &raw).await
    }
}
