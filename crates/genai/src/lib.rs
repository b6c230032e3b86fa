//! Client for the generative-AI REST API.
//!
//! [`api::GenAiApi`] is a thin wrapper over the HTTP endpoints (file upload,
//! file state, generation, deletion). [`client::GenAiClient`] builds on it
//! to implement [`client::PromptBackend`], the seam the generation pipeline
//! talks to.

pub mod api;
pub mod client;
pub mod types;

pub use api::{GenAiApi, GenAiApiError};
pub use client::{GenAiClient, GenAiError, PromptBackend, PromptRequest, UploadedVideo};
