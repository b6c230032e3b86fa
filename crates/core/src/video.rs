//! Video file status, format checks and import helpers.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of bytes read when checking that a file is readable.
const READ_PROBE_BYTES: usize = 1024;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Processing status of a video record, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl VideoStatus {
    pub const ALL: [VideoStatus; 4] = [
        VideoStatus::Pending,
        VideoStatus::Processing,
        VideoStatus::Completed,
        VideoStatus::Error,
    ];

    /// Database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Error => "error",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid video status '{s}'. Must be one of: pending, processing, completed, error"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Format checks
// ---------------------------------------------------------------------------

/// Lower-cased extension of `path` including the leading dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Whether `path` has one of the `supported` extensions (case-insensitive).
pub fn is_supported_format(path: &Path, supported: &[String]) -> bool {
    extension_of(path)
        .map(|ext| supported.iter().any(|s| s.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// MIME type used when uploading a video.
pub fn mime_type_for(path: &Path) -> &'static str {
    match extension_of(path).as_deref() {
        Some(".mp4") | Some(".m4v") => "video/mp4",
        Some(".mov") => "video/quicktime",
        Some(".avi") => "video/x-msvideo",
        Some(".mkv") => "video/x-matroska",
        Some(".webm") => "video/webm",
        Some(".mpeg") | Some(".mpg") => "video/mpeg",
        Some(".wmv") => "video/x-ms-wmv",
        Some(".flv") => "video/x-flv",
        Some(".3gp") => "video/3gpp",
        _ => "application/octet-stream",
    }
}

/// File name component used as the display name of a video.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Validate that a video can be sent to the generation API.
///
/// Checks, in order: the file exists, its extension is supported, its size
/// does not exceed `max_bytes`, and its first bytes can be read.
pub fn validate_video_file(
    path: &Path,
    supported: &[String],
    max_bytes: u64,
) -> Result<(), CoreError> {
    if !path.is_file() {
        return Err(CoreError::Validation("File does not exist".to_string()));
    }

    if !is_supported_format(path, supported) {
        let ext = extension_of(path).unwrap_or_default();
        return Err(CoreError::Validation(format!("Unsupported format: {ext}")));
    }

    let size = std::fs::metadata(path)
        .map_err(|_| CoreError::Validation("File is not readable".to_string()))?
        .len();
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "File too large: {:.1}MB",
            size as f64 / (1024.0 * 1024.0)
        )));
    }

    let mut buf = [0u8; READ_PROBE_BYTES];
    std::fs::File::open(path)
        .and_then(|mut f| f.read(&mut buf))
        .map_err(|_| CoreError::Validation("File is not readable".to_string()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Expand `inputs` into the list of supported video files.
///
/// Directories are walked recursively; entries inside a directory are
/// visited in sorted order so repeated imports are deterministic. Explicit
/// file arguments with an unsupported extension are skipped. Unreadable
/// directories are logged and skipped.
pub fn collect_video_files(inputs: &[PathBuf], supported: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk_dir(input, supported, &mut found);
        } else if is_supported_format(input, supported) {
            found.push(input.clone());
        } else {
            tracing::debug!(path = %input.display(), "Skipping unsupported file");
        }
    }
    found
}

fn walk_dir(dir: &Path, supported: &[String], found: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Cannot read directory");
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            walk_dir(&path, supported, found);
        } else if is_supported_format(&path, supported) {
            found.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn formats() -> Vec<String> {
        vec![".mp4".to_string(), ".mov".to_string()]
    }

    #[test]
    fn status_parses_known_values() {
        for status in VideoStatus::ALL {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
        assert!("done".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn supported_format_is_case_insensitive() {
        assert!(is_supported_format(Path::new("/a/clip.MP4"), &formats()));
        assert!(is_supported_format(Path::new("clip.mov"), &formats()));
        assert!(!is_supported_format(Path::new("clip.txt"), &formats()));
        assert!(!is_supported_format(Path::new("noext"), &formats()));
    }

    #[test]
    fn mime_type_mapping() {
        assert_eq!(mime_type_for(Path::new("a.MOV")), "video/quicktime");
        assert_eq!(mime_type_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(mime_type_for(Path::new("a.bin")), "application/octet-stream");
    }

    #[test]
    fn validate_missing_file() {
        let err = validate_video_file(Path::new("/no/such/file.mp4"), &formats(), 1024).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "File does not exist");
    }

    #[test]
    fn validate_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let err = validate_video_file(&path, &formats(), 1024).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Unsupported format: .txt");
    }

    #[test]
    fn validate_rejects_large_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.mp4");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let err = validate_video_file(&path, &formats(), 1024).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("File too large"));
    }

    #[test]
    fn validate_accepts_small_supported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.mp4");
        std::fs::write(&path, vec![1u8; 512]).unwrap();

        validate_video_file(&path, &formats(), 1024).unwrap();
    }

    #[test]
    fn collect_walks_directories_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("a.MOV"), b"x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::write(nested.join("c.mp4"), b"x").unwrap();

        let found = collect_video_files(&[dir.path().to_path_buf()], &formats());
        let names: Vec<String> = found.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.MOV", "b.mp4", "c.mp4"]);
    }

    #[test]
    fn collect_skips_unsupported_explicit_files() {
        let found = collect_video_files(
            &[PathBuf::from("x.mp4"), PathBuf::from("y.doc")],
            &formats(),
        );
        assert_eq!(found, vec![PathBuf::from("x.mp4")]);
    }
}
