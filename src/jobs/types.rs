use chrono::{DateTime, Utc};
use mediaforge_common::{JobId, JobStatus, MediaCategory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The upload a job was created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl OriginalFile {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }

    /// Describe a local file, taking its size from the filesystem.
    pub fn from_path(path: &Path, mime_type: impl Into<String>) -> std::io::Result<Self> {
        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, size, mime_type))
    }

    pub fn category(&self) -> MediaCategory {
        MediaCategory::from_mime(&self.mime_type)
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("file")
    }
}

/// MIME type implied by a file's extension, for callers that have no
/// declared type. Unrecognised extensions map to `application/octet-stream`.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "opus" => "audio/opus",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Whole percent, never decreasing while the job runs.
    pub progress: u8,
    pub original_file: OriginalFile,
    /// The option payload as submitted.
    pub options: serde_json::Value,
    /// Download locator, set on completion.
    pub result: Option<String>,
    /// Where the converted file was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(original_file: OriginalFile, options: serde_json::Value) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            progress: 0,
            original_file,
            options,
            result: None,
            output_path: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Suggested file name for the converted output.
    pub fn download_name(&self) -> Option<String> {
        let ext = self.output_path.as_deref()?.extension()?.to_str()?;
        Some(format!("{}_converted.{}", self.original_file.stem(), ext))
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.started_at.get_or_insert_with(Utc::now);
    }

    pub(crate) fn complete(&mut self, result: String, output_path: PathBuf) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.output_path = Some(output_path);
        self.error = None;
        self.completed_at.get_or_insert_with(Utc::now);
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.result = None;
        self.completed_at.get_or_insert_with(Utc::now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a/Photo.JPG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("clip.mkv")), "video/x-matroska");
        assert_eq!(guess_mime(Path::new("song.flac")), "audio/flac");
        assert_eq!(guess_mime(Path::new("README")), "application/octet-stream");
        assert_eq!(
            MediaCategory::from_mime(guess_mime(Path::new("x.wav"))),
            MediaCategory::Audio
        );
    }

    #[test]
    fn test_stem_and_download_name() {
        let mut job = Job::new(
            OriginalFile::new("holiday.clip.mov", 10, "video/quicktime"),
            serde_json::json!({}),
        );
        assert_eq!(job.original_file.stem(), "holiday.clip");
        assert_eq!(job.download_name(), None);

        job.complete("/api/download/x".into(), PathBuf::from("/out/x_converted.mp4"));
        assert_eq!(job.download_name().as_deref(), Some("holiday.clip_converted.mp4"));
    }

    #[test]
    fn test_category_from_mime() {
        let file = OriginalFile::new("a.flac", 1, "audio/flac");
        assert_eq!(file.category(), MediaCategory::Audio);
        assert_eq!(OriginalFile::new("", 0, "text/plain").stem(), "file");
    }

    #[test]
    fn test_completion_time_set_once() {
        let mut job = Job::new(OriginalFile::new("a.png", 1, "image/png"), serde_json::json!({}));
        job.start();
        job.fail("boom".into());
        let first = job.completed_at;
        job.fail("again".into());
        assert_eq!(job.completed_at, first);
    }
}
