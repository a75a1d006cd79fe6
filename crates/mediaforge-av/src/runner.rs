//! Encoder process supervision.
//!
//! [`ProcessRunner::run`] spawns one invocation, streams its stderr through
//! [`LineSplitter`] and [`ProgressParser`], and turns a non-zero exit into a
//! classified [`Error::ProcessRuntime`].

use crate::classify::{classify, RawFailure};
use crate::command::ArgumentSequence;
use crate::progress::{DiagnosticTail, LineKind, LineSplitter, ProgressParser};
use crate::tools::ToolPaths;
use crate::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Default number of diagnostic lines kept for error messages.
pub const DEFAULT_TAIL_LINES: usize = 200;

const READ_CHUNK: usize = 4096;

/// Receives whole-percent progress from a running process.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Sink that discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8) {}
}

/// Spawns encoder invocations.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    tools: ToolPaths,
    tail_lines: usize,
}

impl ProcessRunner {
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }

    /// Bound the diagnostic tail kept for failures.
    pub fn with_tail_lines(mut self, lines: usize) -> Self {
        self.tail_lines = lines;
        self
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Run `invocation` to completion.
    ///
    /// Progress is only reported when it increases. `input` and `output` are
    /// used for failure diagnosis.
    pub async fn run(
        &self,
        invocation: &ArgumentSequence,
        input: &Path,
        output: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let encoder = invocation.encoder();
        let program = self.tools.program(encoder);
        tracing::debug!(command = %invocation, "spawning encoder");

        let mut child = Command::new(program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::process_start(
                    encoder.program_name(),
                    format!("failed to spawn {}: {e}", program.display()),
                )
            })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process_start(encoder.program_name(), "stderr unavailable"))?;

        let mut splitter = LineSplitter::new();
        let mut parser = ProgressParser::new()?;
        let mut tail = DiagnosticTail::new(self.tail_lines);
        let mut last_reported: Option<u8> = None;
        let mut handle_line = |line: String| match parser.observe(&line) {
            LineKind::Progress(Some(pct)) => {
                if last_reported.map_or(true, |last| pct > last) {
                    last_reported = Some(pct);
                    progress.report(pct);
                }
            }
            LineKind::Progress(None) | LineKind::Duration => {}
            LineKind::Other => tail.push(line),
        };

        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = stderr.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            for line in splitter.feed(&buf[..n]) {
                handle_line(line);
            }
        }
        if let Some(line) = splitter.finish() {
            handle_line(line);
        }

        let status = child.wait().await?;
        if status.success() {
            tracing::debug!(encoder = %encoder, "encoder finished");
            return Ok(());
        }

        let diagnostics = tail.joined();
        let diagnosis = classify(&RawFailure {
            exit_code: status.code(),
            diagnostics: &diagnostics,
            invocation,
            input,
            output,
        });
        tracing::warn!(
            encoder = %encoder,
            exit_code = ?status.code(),
            kind = ?diagnosis.kind,
            "encoder failed"
        );
        Err(Error::ProcessRuntime(diagnosis))
    }
}
