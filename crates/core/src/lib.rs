//! Domain layer for vidprompt.
//!
//! Pure types and functions shared by the database, API client, pipeline
//! and command-line crates. The only I/O performed here is reading and
//! writing the configuration / `.env` files and invoking `ffprobe`.

pub mod config;
pub mod error;
pub mod generation;
pub mod probe;
pub mod prompt_text;
pub mod secrets;
pub mod types;
pub mod video;
