//! Background prompt generation.
//!
//! [`generator::PromptGenerator`] owns at most one running generation at a
//! time. Each run is a spawned task that walks the selected videos in
//! order, uploads each one through a [`vidprompt_genai::PromptBackend`],
//! requests prompts in batches and stores them. Progress is published as
//! [`events::GenerationEvent`]s on a broadcast channel.

pub mod error;
pub mod events;
pub mod generator;
pub mod selection;

pub use error::PipelineError;
pub use events::GenerationEvent;
pub use generator::{PromptGenerator, RunHandle};
pub use selection::select_videos;
