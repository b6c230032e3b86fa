//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vidprompt_core::generation::GenerationMode;
use vidprompt_core::types::DbId;
use vidprompt_core::video::VideoStatus;

/// Generate AI art prompts from video files.
#[derive(Debug, Parser)]
#[command(name = "vidprompt", version, about)]
pub struct Cli {
    /// JSON settings file; created with defaults when missing.
    #[arg(long, global = true, env = "VIDPROMPT_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// Environment file holding GENAI_API_KEY.
    #[arg(long, global = true, env = "VIDPROMPT_ENV_FILE", default_value = ".env")]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import video files or folders (recursively).
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List videos with their prompt counts.
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// List the prompts of a video.
    Prompts { video_id: DbId },

    /// Print one prompt in full.
    Show { prompt_id: DbId },

    /// Print a prompt and mark it copied.
    Copy { prompt_id: DbId },

    /// Print every prompt of a video, numbered, and mark them copied.
    CopyAll { video_id: DbId },

    /// Generate prompts for videos.
    Generate(GenerateArgs),

    /// Remove a video and its prompts.
    Remove { video_id: DbId },

    /// Delete prompts or the whole library.
    Clear {
        #[command(subcommand)]
        target: ClearTarget,
    },

    /// Reset video statuses to pending.
    Reset {
        /// Reset every video currently in error.
        #[arg(long)]
        errors: bool,
        ids: Vec<DbId>,
    },

    /// Library statistics.
    Stats,

    /// Show or edit the settings file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Key-value application settings stored in the database.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage the API key.
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },

    /// Database maintenance.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Which videos to process.
    #[arg(long, value_enum, default_value_t = ModeArg::Ungenerated)]
    pub mode: ModeArg,

    /// Video id for `--mode selected`; repeatable.
    #[arg(long = "video", value_name = "ID")]
    pub videos: Vec<DbId>,

    /// Prompts per video.
    #[arg(long)]
    pub prompts: Option<u32>,

    #[arg(long)]
    pub complexity: Option<u32>,

    #[arg(long)]
    pub variation: Option<u32>,

    #[arg(long)]
    pub aspect_ratio: Option<String>,

    /// Start from the parameters of the previous run.
    #[arg(long)]
    pub last: bool,
}

#[derive(Debug, Subcommand)]
pub enum ClearTarget {
    /// Delete prompts, of one video or of all videos.
    Prompts {
        #[arg(long)]
        video: Option<DbId>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete all videos and prompts.
    All {
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the whole configuration.
    Show,
    /// Print one value by dotted key, e.g. `generation.max_prompts_per_batch`.
    Get { key: String },
    /// Set one value by dotted key; the value is parsed as JSON when possible.
    Set { key: String, value: String },
    /// Overwrite the settings file with the defaults.
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
    Delete { key: String },
}

#[derive(Debug, Subcommand)]
pub enum ApiKeyAction {
    /// Store the key in the environment file.
    Set { key: String },
    /// Send a test request.
    Test {
        /// Model to test instead of the configured one.
        #[arg(long)]
        model: Option<String>,
    },
    /// Print the masked key and where it comes from.
    Show,
}

#[derive(Debug, Subcommand)]
pub enum DbAction {
    /// Print the database file location.
    Where,
    /// Write a copy of the database.
    Backup { path: PathBuf },
    /// Delete completed and failed videos older than N days.
    Cleanup {
        #[arg(long)]
        days: Option<u32>,
    },
}

// ---------------------------------------------------------------------------
// Value enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Selected,
    All,
    Ungenerated,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Selected => GenerationMode::Selected,
            ModeArg::All => GenerationMode::All,
            ModeArg::Ungenerated => GenerationMode::Ungenerated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Processing,
    Completed,
    Error,
}

impl From<StatusArg> for VideoStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => VideoStatus::Pending,
            StatusArg::Processing => VideoStatus::Processing,
            StatusArg::Completed => VideoStatus::Completed,
            StatusArg::Error => VideoStatus::Error,
        }
    }
}
