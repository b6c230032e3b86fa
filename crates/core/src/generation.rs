//! Generation parameters, selection modes, batch planning and run statistics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::CoreError;

/// Settings key under which the last-used parameters are stored.
pub const LAST_PARAMS_SETTING_KEY: &str = "generation.last_params";

/// Share of the progress bar covered by the per-video loop.
const VIDEO_PROGRESS_SPAN: f64 = 90.0;

/// Per-video progress once the upload has finished.
const BATCH_PROGRESS_START: f64 = 25.0;

/// Share of per-video progress covered by the batch loop.
const BATCH_PROGRESS_SPAN: f64 = 70.0;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which videos a generation run picks up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Explicitly chosen video ids.
    Selected,
    /// Every video in the library.
    All,
    /// Videos without any prompt yet.
    #[default]
    Ungenerated,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::Selected => "selected",
            GenerationMode::All => "all",
            GenerationMode::Ungenerated => "ungenerated",
        }
    }

    /// User-facing message when the mode selects nothing.
    pub fn empty_selection_message(self) -> &'static str {
        match self {
            GenerationMode::Selected => "Please select one or more videos to process.",
            GenerationMode::All => "No videos found. Please add videos first.",
            GenerationMode::Ungenerated => {
                "No ungenerated videos found. All videos already have prompts."
            }
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "selected" => Ok(GenerationMode::Selected),
            "all" => Ok(GenerationMode::All),
            "ungenerated" => Ok(GenerationMode::Ungenerated),
            other => Err(CoreError::Validation(format!(
                "Invalid generation mode '{other}'. Must be one of: selected, all, ungenerated"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters applied to every video of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompts_per_video: u32,
    pub complexity_level: u32,
    pub aspect_ratio: String,
    pub variation_level: u32,
}

impl GenerationParams {
    /// Defaults taken from the `generation` config section.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            prompts_per_video: config.generation.default_prompts_per_video,
            complexity_level: config.generation.default_complexity_level,
            aspect_ratio: config.generation.default_aspect_ratio.clone(),
            variation_level: config.generation.default_variation_level,
        }
    }
}

/// Check `params` against the configured ranges and aspect ratios.
pub fn validate_generation_params(
    params: &GenerationParams,
    config: &AppConfig,
) -> Result<(), CoreError> {
    let (min_prompts, max_prompts) = config.prompts_range();
    if !(min_prompts..=max_prompts).contains(&params.prompts_per_video) {
        return Err(CoreError::Validation(format!(
            "Invalid prompts_per_video (must be {min_prompts}-{max_prompts})"
        )));
    }

    let (min_c, max_c) = config.complexity_range();
    if !(min_c..=max_c).contains(&params.complexity_level) {
        return Err(CoreError::Validation(format!(
            "Invalid complexity_level (must be {min_c}-{max_c})"
        )));
    }

    let (min_v, max_v) = config.variation_range();
    if !(min_v..=max_v).contains(&params.variation_level) {
        return Err(CoreError::Validation(format!(
            "Invalid variation_level (must be {min_v}-{max_v})"
        )));
    }

    let valid = &config.generation.available_aspect_ratios;
    if !valid.iter().any(|r| r == &params.aspect_ratio) {
        return Err(CoreError::Validation(format!(
            "Invalid aspect_ratio. Valid options: {}",
            valid.join(", ")
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Batch planning and progress
// ---------------------------------------------------------------------------

/// Split `total` prompts into `ceil(total / max_per_batch)` batches.
///
/// Every batch holds `max_per_batch` prompts except the last, which takes
/// the remainder. A zero batch size is treated as one.
pub fn plan_batches(total: usize, max_per_batch: usize) -> Vec<usize> {
    let max = max_per_batch.max(1);
    let num_batches = total.div_ceil(max);
    (0..num_batches)
        .map(|b| {
            let start = b * max;
            (total - start).min(max)
        })
        .collect()
}

/// Overall progress at the start of the video at `index`.
pub fn video_base_progress(index: usize, total_videos: usize) -> f64 {
    if total_videos == 0 {
        return 0.0;
    }
    index as f64 / total_videos as f64 * VIDEO_PROGRESS_SPAN
}

/// Progress within one video at the start of batch `batch` of `num_batches`.
pub fn batch_progress(batch: usize, num_batches: usize) -> f64 {
    if num_batches == 0 {
        return BATCH_PROGRESS_START;
    }
    BATCH_PROGRESS_START + batch as f64 / num_batches as f64 * BATCH_PROGRESS_SPAN
}

/// Map a per-video sub-progress onto the overall bar, clamped to 0..=100.
pub fn overall_progress(index: usize, total_videos: usize, sub_progress: f64) -> u8 {
    let base = video_base_progress(index, total_videos);
    let scaled = if total_videos == 0 {
        0.0
    } else {
        sub_progress / total_videos as f64
    };
    (base + scaled).clamp(0.0, 100.0) as u8
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters accumulated during one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_videos: usize,
    /// Videos that finished without error.
    pub processed_videos: usize,
    /// Prompts returned by the API, including blank ones.
    pub total_prompts: usize,
    /// Prompts actually stored.
    pub successful_prompts: usize,
    pub failed_videos: usize,
}

impl GenerationStats {
    pub fn new(total_videos: usize) -> Self {
        Self {
            total_videos,
            ..Self::default()
        }
    }

    /// Summary shown when a run ends.
    pub fn completion_message(&self) -> String {
        if self.failed_videos == 0 {
            format!(
                "Successfully generated {} prompts from {} videos",
                self.successful_prompts, self.processed_videos
            )
        } else {
            format!(
                "Generated {} prompts from {} videos. {} videos failed.",
                self.successful_prompts, self.processed_videos, self.failed_videos
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn params() -> GenerationParams {
        GenerationParams::from_config(&AppConfig::default())
    }

    // -- plan_batches --

    #[test]
    fn twenty_prompts_make_four_batches_of_five() {
        assert_eq!(plan_batches(20, 5), vec![5, 5, 5, 5]);
    }

    #[test]
    fn remainder_goes_to_last_batch() {
        assert_eq!(plan_batches(12, 5), vec![5, 5, 2]);
        assert_eq!(plan_batches(3, 5), vec![3]);
    }

    #[test]
    fn zero_total_is_empty_and_zero_batch_is_one() {
        assert!(plan_batches(0, 5).is_empty());
        assert_eq!(plan_batches(3, 0), vec![1, 1, 1]);
    }

    // -- progress --

    #[test]
    fn progress_arithmetic() {
        assert_eq!(video_base_progress(0, 4), 0.0);
        assert_eq!(video_base_progress(2, 4), 45.0);
        assert_eq!(batch_progress(0, 4), 25.0);
        assert_eq!(batch_progress(2, 4), 60.0);
        assert_eq!(overall_progress(1, 2, 100.0), 95);
        assert_eq!(overall_progress(0, 0, 50.0), 0);
    }

    // -- validation --

    #[test]
    fn defaults_are_valid() {
        validate_generation_params(&params(), &AppConfig::default()).unwrap();
    }

    #[test]
    fn complexity_out_of_range() {
        let mut p = params();
        p.complexity_level = 6;
        let err = validate_generation_params(&p, &AppConfig::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Invalid complexity_level (must be 1-5)");
    }

    #[test]
    fn variation_out_of_range() {
        let mut p = params();
        p.variation_level = 0;
        let err = validate_generation_params(&p, &AppConfig::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("Invalid variation_level"));
    }

    #[test]
    fn prompts_out_of_range() {
        let mut p = params();
        p.prompts_per_video = 0;
        let err = validate_generation_params(&p, &AppConfig::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("Invalid prompts_per_video"));
    }

    #[test]
    fn unknown_aspect_ratio() {
        let mut p = params();
        p.aspect_ratio = "3:2".into();
        let err = validate_generation_params(&p, &AppConfig::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("Valid options: 16:9"));
    }

    // -- mode --

    #[test]
    fn mode_parsing_and_default() {
        assert_eq!(GenerationMode::default(), GenerationMode::Ungenerated);
        assert_eq!("ALL".parse::<GenerationMode>().unwrap(), GenerationMode::All);
        assert!("some".parse::<GenerationMode>().is_err());
    }

    // -- stats --

    #[test]
    fn completion_messages() {
        let mut stats = GenerationStats::new(3);
        assert_eq!(stats.total_prompts, 0);
        stats.processed_videos = 3;
        stats.successful_prompts = 15;
        assert_eq!(
            stats.completion_message(),
            "Successfully generated 15 prompts from 3 videos"
        );

        stats.failed_videos = 1;
        stats.successful_prompts = 10;
        assert_eq!(
            stats.completion_message(),
            "Generated 10 prompts from 3 videos. 1 videos failed."
        );
    }
}
