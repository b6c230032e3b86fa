//! Generated prompt models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vidprompt_core::types::{DbId, Timestamp};

/// Status written for every prompt returned by the API.
pub const PROMPT_STATUS_GENERATED: &str = "generated";

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `prompts` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Prompt {
    pub id: DbId,
    pub video_id: DbId,
    pub prompt_text: String,
    pub complexity_level: i64,
    pub aspect_ratio: String,
    pub variation_level: i64,
    pub status: String,
    pub is_copied: bool,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for storing one generated prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrompt {
    pub video_id: DbId,
    pub prompt_text: String,
    pub complexity_level: i64,
    pub aspect_ratio: String,
    pub variation_level: i64,
}
