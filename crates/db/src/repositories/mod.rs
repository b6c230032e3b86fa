//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&SqlitePool` as the first argument.

pub mod prompt_repo;
pub mod setting_repo;
pub mod stats_repo;
pub mod video_repo;

pub use prompt_repo::PromptRepo;
pub use setting_repo::SettingRepo;
pub use stats_repo::StatsRepo;
pub use video_repo::VideoRepo;
