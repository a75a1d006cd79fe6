//! Encoder diagnostic stream parsing.
//!
//! ffmpeg rewrites its status line in place with `\r`, so the stream is split
//! on both carriage returns and newlines before any line is inspected.

use crate::{Error, Result};
use regex::Regex;
use std::collections::VecDeque;

const DURATION_PATTERN: &str = r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})";
const TIME_PATTERN: &str = r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})";

/// Longest segment held while waiting for a terminator.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Splits a byte stream into lines on `\n` and `\r`.
///
/// Partial lines are held until the terminator arrives or [`finish`] is
/// called. A segment reaching [`MAX_LINE_BYTES`] is emitted as a line of its
/// own, so unterminated output never accumulates. Empty lines are dropped.
///
/// [`finish`]: LineSplitter::finish
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `chunk` and return every line it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if let Some(line) = self.take() {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
                if self.pending.len() >= MAX_LINE_BYTES {
                    if let Some(line) = self.take() {
                        lines.push(line);
                    }
                }
            }
        }
        lines
    }

    /// Bytes of the current unterminated segment.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Flush whatever is left after the stream closed.
    pub fn finish(&mut self) -> Option<String> {
        self.take()
    }

    fn take(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

/// What a single diagnostic line meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Carried the input duration.
    Duration,
    /// Carried an encode position; the percentage once a duration is known.
    Progress(Option<u8>),
    /// Anything else.
    Other,
}

/// Turns ffmpeg's `Duration:` and `time=` lines into whole percentages.
#[derive(Debug)]
pub struct ProgressParser {
    duration_re: Regex,
    time_re: Regex,
    total_secs: Option<f64>,
}

impl ProgressParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::inconsistency(format!("bad progress pattern: {e}")))
        };
        Ok(Self {
            duration_re: compile(DURATION_PATTERN)?,
            time_re: compile(TIME_PATTERN)?,
            total_secs: None,
        })
    }

    /// Total duration in seconds, once seen.
    pub fn total_secs(&self) -> Option<f64> {
        self.total_secs
    }

    /// Classify `line` and update the known duration.
    pub fn observe(&mut self, line: &str) -> LineKind {
        if let Some(secs) = timestamp(&self.duration_re, line) {
            // A zero duration would make every later ratio meaningless.
            if secs > 0.0 {
                self.total_secs = Some(secs);
            }
            return LineKind::Duration;
        }
        if let Some(current) = timestamp(&self.time_re, line) {
            return LineKind::Progress(self.total_secs.map(|total| percentage(current, total)));
        }
        LineKind::Other
    }
}

/// `floor(current / total * 100)` clamped to `0..=100`.
pub fn percentage(current: f64, total: f64) -> u8 {
    if total <= 0.0 || !current.is_finite() {
        return 0;
    }
    (current / total * 100.0).floor().clamp(0.0, 100.0) as u8
}

fn timestamp(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    let (h, m, s, cs) = (field(1)?, field(2)?, field(3)?, field(4)?);
    Some(h * 3600.0 + m * 60.0 + s + cs / 100.0)
}

/// Keeps the most recent `capacity` lines for error reporting.
#[derive(Debug)]
pub struct DiagnosticTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl DiagnosticTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Retained lines joined with `\n`.
    pub fn joined(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}
