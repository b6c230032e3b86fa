//! Plain-text formatting for terminal output.

use vidprompt_db::models::prompt::Prompt;
use vidprompt_db::models::stats::LibraryStats;
use vidprompt_db::models::video::VideoWithCounts;
use vidprompt_pipeline::GenerationEvent;

/// Width of prompt snippets in listings.
pub const SNIPPET_LEN: usize = 60;

/// Width of the prompt preview printed after `copy`.
pub const PREVIEW_LEN: usize = 100;

/// Human-readable file size.
pub fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes.max(0) as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// `m:ss`, or `h:mm:ss` for an hour or more; `-` when unknown.
pub fn format_duration(secs: Option<f64>) -> String {
    let Some(secs) = secs.filter(|s| s.is_finite() && *s >= 0.0) else {
        return "-".to_string();
    };
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Single-line snippet cut at a word boundary.
pub fn snippet(text: &str, max_len: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= max_len {
        return flat.to_string();
    }
    let head: String = flat.chars().take(max_len).collect();
    let cut = match head.rsplit_once(' ') {
        Some((before, _)) if !before.is_empty() => before,
        _ => head.as_str(),
    };
    format!("{cut}...")
}

/// Hard cut after `max_len` characters.
pub fn preview(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_len).collect();
        format!("{head}...")
    }
}

/// Every prompt numbered from 1, separated by a blank line.
pub fn format_copy_all(prompts: &[Prompt]) -> String {
    prompts
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}", i + 1, p.prompt_text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

pub fn video_table(videos: &[VideoWithCounts]) -> String {
    let name_width = videos
        .iter()
        .map(|v| v.video.filename.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(8, 48);

    let mut out = format!(
        "{:>5}  {:<name_width$}  {:>10}  {:>8}  {:<10}  {:>7}  {:>6}  {}\n",
        "ID", "Filename", "Size", "Duration", "Status", "Prompts", "Copied", "Added"
    );
    for row in videos {
        let v = &row.video;
        out.push_str(&format!(
            "{:>5}  {:<name_width$}  {:>10}  {:>8}  {:<10}  {:>7}  {:>6}  {}\n",
            v.id,
            preview(&v.filename, name_width),
            format_size(v.filesize),
            format_duration(v.duration_secs),
            v.status,
            row.prompt_count,
            row.copied_count,
            v.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out
}

pub fn prompt_list(prompts: &[Prompt]) -> String {
    let mut out = String::new();
    for (i, p) in prompts.iter().enumerate() {
        let mark = if p.is_copied { " ✓" } else { "" };
        out.push_str(&format!(
            "{}. [#{}] {}{}\n",
            i + 1,
            p.id,
            snippet(&p.prompt_text, SNIPPET_LEN),
            mark
        ));
    }
    out
}

pub fn prompt_details(prompt: &Prompt, video_filename: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Prompt #{}\n", prompt.id));
    if let Some(name) = video_filename {
        out.push_str(&format!("Video:      {name} (#{})\n", prompt.video_id));
    }
    out.push_str(&format!("Complexity: {}\n", prompt.complexity_level));
    out.push_str(&format!("Aspect:     {}\n", prompt.aspect_ratio));
    out.push_str(&format!("Variation:  {}\n", prompt.variation_level));
    out.push_str(&format!("Copied:     {}\n", if prompt.is_copied { "yes" } else { "no" }));
    out.push_str(&format!("Created:    {}\n", prompt.created_at.format("%Y-%m-%d %H:%M:%S")));
    out.push('\n');
    out.push_str(&prompt.prompt_text);
    out.push('\n');
    out
}

pub fn stats(stats: &LibraryStats) -> String {
    format!(
        "Videos:     {}\n  pending:    {}\n  processing: {}\n  completed:  {}\n  error:      {}\nPrompts:    {}\nCopied:     {} ({:.1}%)\n",
        stats.total_videos,
        stats.pending_videos,
        stats.processing_videos,
        stats.completed_videos,
        stats.error_videos,
        stats.total_prompts,
        stats.copied_prompts,
        stats.copy_rate(),
    )
}

/// One progress line per event.
pub fn event_line(event: &GenerationEvent) -> String {
    match event {
        GenerationEvent::Started { total_videos, .. } => {
            format!("Generation started for {total_videos} video(s)...")
        }
        GenerationEvent::Progress { percent, message } => format!("[{percent:>3}%] {message}"),
        GenerationEvent::VideoCompleted {
            filename,
            prompts_stored,
            ..
        } => format!("  done: {filename} ({prompts_stored} prompts)"),
        GenerationEvent::VideoFailed { filename, error, .. } => {
            format!("  failed: {filename}: {error}")
        }
        GenerationEvent::BatchFailed {
            batch,
            num_batches,
            error,
            ..
        } => format!("  batch {batch}/{num_batches} failed: {error}"),
        GenerationEvent::Finished { message, .. } => message.clone(),
    }
}
