//! Encoder command construction.
//!
//! Builders translate a validated [`OptionSet`] into one or more
//! [`ArgumentSequence`]s. Pixel and sample transforms are collected in a
//! [`FilterChain`] and serialized exactly once, so token order is decided by
//! the order of `push` calls and never by inspecting earlier tokens.

use crate::options::OptionSet;
use crate::Result;
use std::fmt;
use std::path::{Path, PathBuf};

mod audio;
mod image;
pub mod tempo;
mod video;

pub use audio::build_audio;
pub use image::build_image;
pub use video::build_video;

/// File name of the lossless intermediate inside a job's staging directory.
pub const STAGING_FILE_NAME: &str = "staging.png";

/// External program an [`ArgumentSequence`] is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoder {
    /// The audio/video transcoder.
    Ffmpeg,
    /// ImageMagick's `magick` front end.
    ImageMagick,
}

impl Encoder {
    /// Default executable name.
    pub fn program_name(self) -> &'static str {
        match self {
            Self::Ffmpeg => "ffmpeg",
            Self::ImageMagick => "magick",
        }
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program_name())
    }
}

/// Ordered tokens for one encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSequence {
    encoder: Encoder,
    args: Vec<String>,
}

impl ArgumentSequence {
    pub fn new(encoder: Encoder, args: Vec<String>) -> Self {
        Self { encoder, args }
    }

    pub fn encoder(&self) -> Encoder {
        self.encoder
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Index of the first token equal to `token`.
    pub fn position(&self, token: &str) -> Option<usize> {
        self.args.iter().position(|a| a == token)
    }

    /// Value following `flag`, e.g. the chain after `-vf`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.position(flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ArgumentSequence {
    /// Shell-like rendering used in logs and failure messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encoder)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Ordered list of filter expressions serialized into a single `-vf`/`-af`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    segments: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<String>) -> &mut Self {
        self.segments.push(segment.into());
        self
    }

    pub fn extend(&mut self, segments: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Comma-joined chain, or `None` when nothing was pushed.
    pub fn serialize(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.segments.join(","))
    }
}

/// Token accumulator shared by the builders.
#[derive(Debug, Default)]
pub(crate) struct Args(Vec<String>);

impl Args {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, token: impl Into<String>) -> &mut Self {
        self.0.push(token.into());
        self
    }

    pub(crate) fn pair(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.0.push(flag.to_string());
        self.0.push(value.into());
        self
    }

    pub(crate) fn path(&mut self, path: &Path) -> &mut Self {
        self.0.push(path.to_string_lossy().into_owned());
        self
    }

    /// `flag <chain>` when the chain is non-empty.
    pub(crate) fn chain(&mut self, flag: &str, chain: &FilterChain) -> &mut Self {
        if let Some(serialized) = chain.serialize() {
            self.pair(flag, serialized);
        }
        self
    }

    /// ffmpeg trailer: overwrite and write to `output`.
    pub(crate) fn overwrite_output(&mut self, output: &Path) -> &mut Self {
        self.push("-y").path(output)
    }

    pub(crate) fn finish(self, encoder: Encoder) -> ArgumentSequence {
        ArgumentSequence::new(encoder, self.0)
    }
}

/// Every invocation needed to produce one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    passes: Vec<ArgumentSequence>,
    output: PathBuf,
    staging_file: Option<PathBuf>,
}

impl ConversionPlan {
    pub(crate) fn single(pass: ArgumentSequence, output: &Path) -> Self {
        Self {
            passes: vec![pass],
            output: output.to_path_buf(),
            staging_file: None,
        }
    }

    pub(crate) fn staged(
        first: ArgumentSequence,
        second: ArgumentSequence,
        staging_file: PathBuf,
        output: &Path,
    ) -> Self {
        Self {
            passes: vec![first, second],
            output: output.to_path_buf(),
            staging_file: Some(staging_file),
        }
    }

    /// Invocations in execution order.
    pub fn passes(&self) -> &[ArgumentSequence] {
        &self.passes
    }

    /// Final output path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Intermediate file the first pass writes, if any.
    pub fn staging_file(&self) -> Option<&Path> {
        self.staging_file.as_deref()
    }
}

/// Build the plan for `options`.
///
/// `staging_dir` is only written to when the plan needs an intermediate file;
/// the caller owns its lifetime.
pub fn build(
    options: &OptionSet,
    input: &Path,
    output: &Path,
    staging_dir: &Path,
) -> Result<ConversionPlan> {
    match options {
        OptionSet::Image(o) => build_image(o, input, output, staging_dir),
        OptionSet::Video(o) => {
            build_video(o, input, output).map(|p| ConversionPlan::single(p, output))
        }
        OptionSet::Audio(o) => {
            build_audio(o, input, output).map(|p| ConversionPlan::single(p, output))
        }
    }
}

/// `-ss <start> -t <duration>` for a trim window.
pub(crate) fn push_trim(args: &mut Args, trim: Option<&crate::options::TrimRange>) {
    if let Some(trim) = trim {
        args.pair("-ss", format!("{:.2}", trim.start_time))
            .pair("-t", format!("{:.2}", trim.duration()));
    }
}
