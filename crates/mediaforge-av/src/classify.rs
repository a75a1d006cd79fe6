//! Failure classification for encoder processes.
//!
//! A non-zero exit is mapped onto a [`FailureKind`] with a message a user can
//! act on. Substring patterns in the diagnostic tail win; exit code 8 without
//! a recognised pattern runs a set of local heuristics that each contribute a
//! suggestion. Every message ends with the full invocation.

use crate::command::ArgumentSequence;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// ffmpeg's exit status for parameter and data errors.
pub const PARAMETER_ERROR_EXIT: i32 = 8;

/// Taxonomy of encoder failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FileNotFound,
    Permission,
    CorruptInput,
    MissingDecoder,
    MissingEncoder,
    ParameterError,
    Generic,
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub kind: FailureKind,
    pub exit_code: Option<i32>,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything known about a failed invocation.
#[derive(Debug, Clone, Copy)]
pub struct RawFailure<'a> {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Retained diagnostic lines.
    pub diagnostics: &'a str,
    pub invocation: &'a ArgumentSequence,
    pub input: &'a Path,
    pub output: &'a Path,
}

/// Classify a failed run.
pub fn classify(failure: &RawFailure<'_>) -> Diagnosis {
    let tool = failure.invocation.encoder();
    let command = failure.invocation.to_string();
    let input = failure.input.display();
    let output = failure.output.display();
    let diagnosis = |kind, text: String| Diagnosis {
        kind,
        exit_code: failure.exit_code,
        message: format!("{}. Command: {}", text, command),
        suggestions: Vec::new(),
    };

    let text = failure.diagnostics;
    if text.contains("No such file or directory") {
        return diagnosis(
            FailureKind::FileNotFound,
            format!(
                "file not found: input file '{}' may have been moved or deleted during processing",
                input
            ),
        );
    }
    if text.contains("Permission denied") {
        return diagnosis(
            FailureKind::Permission,
            format!(
                "permission error: insufficient permissions to read '{}' or write to '{}'",
                input, output
            ),
        );
    }
    if text.contains("Invalid data found") {
        return diagnosis(
            FailureKind::CorruptInput,
            format!(
                "corrupted file: the input file '{}' appears to be corrupted \
                 or in an unsupported format",
                input
            ),
        );
    }
    if text.contains("Decoder not found") || text.contains("Unknown decoder") {
        return diagnosis(
            FailureKind::MissingDecoder,
            format!("codec not supported: {} cannot decode the input file format", tool),
        );
    }
    if text.contains("Encoder not found") || text.contains("Unknown encoder") {
        return diagnosis(
            FailureKind::MissingEncoder,
            format!(
                "output format not supported: {} cannot encode to the requested output format",
                tool
            ),
        );
    }

    let detail = last_line(text);
    match failure.exit_code {
        Some(PARAMETER_ERROR_EXIT) => {
            let suggestions = parameter_suggestions(failure);
            let base = format!(
                "{} parameter/data error (exit code {}): {}",
                tool, PARAMETER_ERROR_EXIT, detail
            );
            let text = if suggestions.is_empty() {
                format!(
                    "{}. This usually indicates invalid filter parameters, corrupted input \
                     data, or an incompatible format conversion",
                    base
                )
            } else {
                format!("{}. Possible issues: {}", base, suggestions.join("; "))
            };
            Diagnosis {
                suggestions,
                ..diagnosis(FailureKind::ParameterError, text)
            }
        }
        Some(1) => diagnosis(
            FailureKind::Generic,
            format!(
                "{} general error (exit code 1): {}. This usually indicates invalid \
                 parameters or an unsupported codec",
                tool, detail
            ),
        ),
        Some(code) => diagnosis(
            FailureKind::Generic,
            format!("{} conversion failed (exit code {}): {}", tool, code, detail),
        ),
        None => diagnosis(
            FailureKind::Generic,
            format!("{} was terminated by a signal: {}", tool, detail),
        ),
    }
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no diagnostic output")
}

fn parameter_suggestions(failure: &RawFailure<'_>) -> Vec<String> {
    let mut suggestions = Vec::new();

    if fs::metadata(failure.input).is_err() {
        suggestions.push("Input file is not accessible".to_string());
    }

    let output_dir = failure
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if !is_writable(output_dir) {
        suggestions.push("Output directory is not writable".to_string());
    }

    for arg in failure.invocation.args() {
        for segment in arg.split(',') {
            if has_zero_scale(segment) {
                suggestions.push("Invalid scale dimensions (width or height is 0)".to_string());
            }
            if has_zero_sigma(segment) {
                suggestions.push("Invalid blur sigma value".to_string());
            }
        }
    }

    let ext = |p: &Path| {
        p.extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    };
    if ext(failure.input).is_some() && ext(failure.input) == ext(failure.output) {
        suggestions.push(
            "Input and output formats are the same - consider changing output format".to_string(),
        );
    }

    suggestions
}

/// Whether a uniquely named scratch file can be created in `dir`. The file
/// is removed when dropped.
fn is_writable(dir: &Path) -> bool {
    tempfile::NamedTempFile::new_in(dir).is_ok()
}

fn has_zero_scale(segment: &str) -> bool {
    let Some(params) = segment.trim().strip_prefix("scale=") else {
        return false;
    };
    params
        .split(':')
        .take(2)
        .any(|dim| dim.trim().parse::<f64>().map(|v| v == 0.0).unwrap_or(false))
}

fn has_zero_sigma(segment: &str) -> bool {
    let segment = segment.trim();
    if !segment.starts_with("gblur") {
        return false;
    }
    segment
        .split(|c| c == '=' || c == ':')
        .collect::<Vec<_>>()
        .windows(2)
        .any(|w| w[0] == "sigma" && w[1].parse::<f64>().map(|v| v == 0.0).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Encoder;
    use std::path::PathBuf;

    fn sequence(args: &[&str]) -> ArgumentSequence {
        ArgumentSequence::new(Encoder::Ffmpeg, args.iter().map(|s| s.to_string()).collect())
    }

    fn run(
        code: Option<i32>,
        diagnostics: &str,
        seq: &ArgumentSequence,
        input: &Path,
        output: &Path,
    ) -> Diagnosis {
        classify(&RawFailure {
            exit_code: code,
            diagnostics,
            invocation: seq,
            input,
            output,
        })
    }

    #[test]
    fn test_substring_patterns() {
        let seq = sequence(&["-i", "a.mp4", "-y", "b.webm"]);
        let (i, o) = (Path::new("a.mp4"), Path::new("b.webm"));
        let cases = [
            ("a.mp4: No such file or directory", FailureKind::FileNotFound),
            ("b.webm: Permission denied", FailureKind::Permission),
            ("a.mp4: Invalid data found when processing input", FailureKind::CorruptInput),
            ("Decoder not found", FailureKind::MissingDecoder),
            ("Unknown encoder 'libfoo'", FailureKind::MissingEncoder),
        ];
        for (text, kind) in cases {
            let d = run(Some(1), text, &seq, i, o);
            assert_eq!(d.kind, kind, "{text}");
            assert!(d.message.ends_with("Command: ffmpeg -i a.mp4 -y b.webm"));
        }
    }

    #[test]
    fn test_pattern_wins_over_exit_8() {
        let seq = sequence(&["-i", "a.wav", "-y", "b.mp3"]);
        let d = run(Some(8), "x: Permission denied", &seq, Path::new("a.wav"), Path::new("b.mp3"));
        assert_eq!(d.kind, FailureKind::Permission);
    }

    #[test]
    fn test_exit_8_heuristics() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        fs::write(&input, b"data").unwrap();
        let output = dir.path().join("out.mp4");
        let seq = sequence(&[
            "-i",
            "clip.mp4",
            "-vf",
            "scale=0:480,gblur=sigma=0",
            "-y",
            "out.mp4",
        ]);

        let d = run(Some(8), "Error reinitializing filters!", &seq, &input, &output);
        assert_eq!(d.kind, FailureKind::ParameterError);
        assert_eq!(
            d.suggestions,
            vec![
                "Invalid scale dimensions (width or height is 0)",
                "Invalid blur sigma value",
                "Input and output formats are the same - consider changing output format",
            ]
        );
        assert!(d.message.contains("Possible issues: Invalid scale"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_writable_check_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_writable(dir.path()));
        assert!(is_writable(dir.path()));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        assert!(!is_writable(Path::new("/nonexistent-mediaforge-dir")));
    }

    #[test]
    fn test_exit_8_without_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        fs::write(&input, b"data").unwrap();
        let output = dir.path().join("out.webm");
        let seq = sequence(&[
            "-i",
            "clip.mp4",
            "-vf",
            "scale=800:-2,gblur=sigma=0.5",
            "-y",
            "out.webm",
        ]);

        let d = run(Some(8), "", &seq, &input, &output);
        assert_eq!(d.kind, FailureKind::ParameterError);
        assert!(d.suggestions.is_empty());
        assert!(d.message.contains("invalid filter parameters"));
        assert!(d.message.contains("no diagnostic output"));
    }

    #[test]
    fn test_missing_input_suggestion() {
        let dir = tempfile::tempdir().unwrap();
        let seq = sequence(&["-i", "gone.wav", "-y", "out.mp3"]);
        let d = run(
            Some(8),
            "",
            &seq,
            &dir.path().join("gone.wav"),
            &dir.path().join("out.mp3"),
        );
        assert_eq!(d.suggestions, vec!["Input file is not accessible"]);
    }

    #[test]
    fn test_unwritable_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        fs::write(&input, b"data").unwrap();
        let output = PathBuf::from("/nonexistent-mediaforge-dir/out.mp3");
        let seq = sequence(&["-i", "a.wav", "-y", "/nonexistent-mediaforge-dir/out.mp3"]);

        let d = run(Some(8), "", &seq, &input, &output);
        assert!(d
            .suggestions
            .contains(&"Output directory is not writable".to_string()));
    }

    #[test]
    fn test_generic_codes() {
        let seq = sequence(&["-i", "a", "-y", "b"]);
        let d = run(
            Some(1),
            "line one\nConversion failed!\n",
            &seq,
            Path::new("a"),
            Path::new("b"),
        );
        assert_eq!(d.kind, FailureKind::Generic);
        assert!(d.message.starts_with("ffmpeg general error (exit code 1): Conversion failed!"));

        let d = run(Some(234), "", &seq, Path::new("a"), Path::new("b"));
        assert!(d.message.contains("exit code 234"));

        let d = run(None, "", &seq, Path::new("a"), Path::new("b"));
        assert!(d.message.contains("terminated by a signal"));
    }

    #[test]
    fn test_zero_dimension_parsing() {
        assert!(has_zero_scale("scale=0:720"));
        assert!(has_zero_scale("scale=1280:0"));
        assert!(!has_zero_scale("scale=800:-1"));
        assert!(!has_zero_scale("scale=1080:720"));
        assert!(has_zero_sigma("gblur=sigma=0"));
        assert!(!has_zero_sigma("gblur=sigma=0.5"));
        assert!(!has_zero_sigma("eq=gamma=0"));
    }
}
