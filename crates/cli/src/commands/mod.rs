pub mod api_key;
pub mod config;
pub mod db;
pub mod generate;
pub mod library;
pub mod prompts;
pub mod settings;
