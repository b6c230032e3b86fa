//! Video models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vidprompt_core::types::{DbId, Timestamp};
use vidprompt_core::video::VideoStatus;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Video {
    pub id: DbId,
    pub filename: String,
    pub filepath: String,
    /// Size in bytes at import time.
    pub filesize: i64,
    pub duration_secs: Option<f64>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Video {
    /// Parsed status; `None` for values written outside this crate.
    pub fn status(&self) -> Option<VideoStatus> {
        self.status.parse().ok()
    }
}

/// A video together with its prompt counters, as shown in the library listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub video: Video,
    pub prompt_count: i64,
    pub copied_count: i64,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for importing a video file.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideo {
    pub filename: String,
    pub filepath: String,
    pub filesize: i64,
    pub duration_secs: Option<f64>,
}
