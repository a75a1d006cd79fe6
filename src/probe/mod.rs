//! File identification.
//!
//! Shells out to the inspector that fits the file's category and republishes
//! what it printed. Images go through `magick identify -verbose`, audio and
//! video through `ffprobe`'s JSON writer, anything else gets filesystem
//! metadata.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use mediaforge_av::ToolPaths;
use mediaforge_common::MediaCategory;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::process::Command;

/// What the inspector reported about a file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: MediaCategory,
    pub mime_type: String,
    /// Which tool produced `details`.
    pub tool: String,
    pub details: Value,
    pub raw_output: String,
}

/// Identify `path`, choosing the inspector from `mime_type`.
pub async fn identify(tools: &ToolPaths, path: &Path, mime_type: &str) -> Result<Identification> {
    let meta = tokio::fs::metadata(path).await?;
    let category = MediaCategory::from_mime(mime_type);
    tracing::debug!(path = %path.display(), %category, "identifying file");

    let (tool, details, raw_output) = match category {
        MediaCategory::Image => {
            let raw = inspect(&tools.imagemagick, &["identify", "-verbose"], path).await?;
            ("ImageMagick identify", parse_verbose(&raw), raw)
        }
        MediaCategory::Video | MediaCategory::Audio => {
            let raw = inspect(
                &tools.ffprobe,
                &["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"],
                path,
            )
            .await?;
            let details = serde_json::from_str(&raw)
                .map_err(|e| Error::Identify(format!("failed to parse ffprobe output: {e}")))?;
            ("FFprobe", details, raw)
        }
        MediaCategory::Unknown => (
            "filesystem metadata",
            filesystem_details(&meta),
            format!("Generic file analysis for: {}", path.display()),
        ),
    };

    Ok(Identification {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        file_size: meta.len(),
        file_type: category,
        mime_type: mime_type.to_string(),
        tool: tool.to_string(),
        details,
        raw_output,
    })
}

async fn inspect(program: &Path, args: &[&str], path: &Path) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .arg(path)
        .output()
        .await
        .map_err(|e| Error::Identify(format!("failed to run {}: {e}", program.display())))?;

    if !output.status.success() {
        return Err(Error::Identify(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `key: value` lines of `identify -verbose` output. Later keys win.
fn parse_verbose(raw: &str) -> Value {
    let mut details = Map::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                details.insert(key.to_string(), Value::String(value.trim().to_string()));
            }
        }
    }
    Value::Object(details)
}

fn filesystem_details(meta: &std::fs::Metadata) -> Value {
    let mut details = Map::new();
    details.insert("size_bytes".into(), meta.len().into());
    details.insert("readonly".into(), meta.permissions().readonly().into());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        details.insert(
            "permissions".into(),
            format!("{:o}", meta.permissions().mode() & 0o7777).into(),
        );
    }
    if let Ok(modified) = meta.modified() {
        let modified: DateTime<Utc> = modified.into();
        details.insert("modification_time".into(), modified.to_rfc3339().into());
    }
    Value::Object(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbose() {
        let raw = "Image:\n  Filename: a.png\n  Geometry: 800x600+0+0\n  \
                   Colorspace: sRGB\n\n  empty\n";
        let details = parse_verbose(raw);
        assert_eq!(details["Geometry"], "800x600+0+0");
        assert_eq!(details["Colorspace"], "sRGB");
        assert_eq!(details["Image"], "");
        assert!(details.get("empty").is_none());
    }

    #[tokio::test]
    async fn test_unknown_type_uses_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let id = identify(&ToolPaths::default(), &path, "text/plain").await.unwrap();
        assert_eq!(id.tool, "filesystem metadata");
        assert_eq!(id.file_type, MediaCategory::Unknown);
        assert_eq!(id.file_size, 5);
        assert_eq!(id.details["size_bytes"], 5);
        assert!(id.raw_output.contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_missing_inspector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"data").unwrap();
        let tools = ToolPaths {
            ffprobe: "/nonexistent/ffprobe".into(),
            ..ToolPaths::default()
        };
        let err = identify(&tools, &path, "video/mp4").await.unwrap_err();
        assert!(matches!(err, Error::Identify(_)));
    }
}
