//! External tool detection and management.

use crate::command::Encoder;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executable name of the ffprobe inspector.
pub const FFPROBE: &str = "ffprobe";

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use mediaforge_av::check_tool;
///
/// let info = check_tool("magick");
/// if info.available {
///     println!("ImageMagick: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_with_arg(name, "-version")
}

/// Check if a tool is available using a custom version argument.
pub fn check_tool_with_arg(name: &str, version_arg: &str) -> ToolInfo {
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => ToolInfo {
            name: name.to_string(),
            available: true,
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string()),
            path: which::which(name).ok(),
        },
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check every tool a conversion or identification may invoke.
pub fn check_tools(paths: &ToolPaths) -> Vec<ToolInfo> {
    [
        (Encoder::Ffmpeg.program_name(), &paths.ffmpeg),
        (FFPROBE, &paths.ffprobe),
        (Encoder::ImageMagick.program_name(), &paths.imagemagick),
    ]
    .into_iter()
    .map(|(name, path)| ToolInfo {
        name: name.to_string(),
        ..check_tool(&path.to_string_lossy())
    })
    .collect()
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    require_tool(name)
}

/// Resolved executables for the encoders and the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub imagemagick: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(Encoder::Ffmpeg.program_name()),
            ffprobe: PathBuf::from(FFPROBE),
            imagemagick: PathBuf::from(Encoder::ImageMagick.program_name()),
        }
    }
}

impl ToolPaths {
    /// Resolve each tool from its configured override or `PATH`.
    ///
    /// A tool that cannot be found keeps its bare name, so the failure shows
    /// up as a start failure when a job actually needs it.
    pub fn resolve(
        ffmpeg: Option<&Path>,
        ffprobe: Option<&Path>,
        imagemagick: Option<&Path>,
    ) -> Self {
        let defaults = Self::default();
        let pick = |name: &str, configured: Option<&Path>, fallback: PathBuf| {
            get_tool_path(name, configured).unwrap_or_else(|_| {
                tracing::warn!(tool = name, "tool not found, falling back to bare name");
                configured.map(Path::to_path_buf).unwrap_or(fallback)
            })
        };
        Self {
            ffmpeg: pick(Encoder::Ffmpeg.program_name(), ffmpeg, defaults.ffmpeg),
            ffprobe: pick(FFPROBE, ffprobe, defaults.ffprobe),
            imagemagick: pick(
                Encoder::ImageMagick.program_name(),
                imagemagick,
                defaults.imagemagick,
            ),
        }
    }

    /// Executable for `encoder`.
    pub fn program(&self, encoder: Encoder) -> &Path {
        match encoder {
            Encoder::Ffmpeg => &self.ffmpeg,
            Encoder::ImageMagick => &self.imagemagick,
        }
    }
}
