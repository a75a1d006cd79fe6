//! Shared helpers for integration tests.
//!
//! Provides a [`TestHarness`] with temporary upload/output directories and
//! stand-in encoder scripts, so orchestration can be exercised without ffmpeg
//! or ImageMagick installed.

#![allow(dead_code)]

use mediaforge::orchestrator::{Orchestrator, OrchestratorSettings};
use mediaforge_av::{ProcessRunner, ToolPaths};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Stderr of a ten second encode reporting halfway and then done.
pub const PROGRESS_STDERR: &str = r#"printf '  Duration: 00:00:10.00, start: 0.000000, bitrate: 1000 kb/s\n' >&2
printf 'frame=  50 time=00:00:05.00 bitrate=1.0kbits/s\r' >&2
printf 'frame= 100 time=00:00:10.00 bitrate=1.0kbits/s\n' >&2"#;

/// Writes its last argument (the output path) like an encoder would.
pub const WRITE_OUTPUT: &str = r#"for last; do :; done
printf 'converted' > "$last""#;

pub struct TestHarness {
    pub dir: TempDir,
    pub uploads: PathBuf,
    pub outputs: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let outputs = dir.path().join("outputs");
        std::fs::create_dir_all(&uploads).unwrap();
        Self {
            dir,
            uploads,
            outputs,
        }
    }

    /// Place an uploaded file with some content.
    pub fn upload(&self, name: &str) -> PathBuf {
        let path = self.uploads.join(name);
        std::fs::write(&path, b"source bytes").unwrap();
        path
    }

    /// Write an executable shell script and return its path.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// An encoder that reports progress and writes its output.
    #[cfg(unix)]
    pub fn succeeding_encoder(&self, name: &str) -> PathBuf {
        self.script(name, &format!("{PROGRESS_STDERR}\n{WRITE_OUTPUT}"))
    }

    /// Arguments the script named `name` was last invoked with, one per line.
    #[cfg(unix)]
    pub fn recording_encoder(&self, name: &str) -> PathBuf {
        let log = self.args_log(name);
        self.script(
            name,
            &format!(
                "for arg; do printf '%s\\n' \"$arg\" >> '{}'; done\n{PROGRESS_STDERR}\n{WRITE_OUTPUT}",
                log.display()
            ),
        )
    }

    pub fn args_log(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.args"))
    }

    pub fn recorded_args(&self, name: &str) -> Vec<String> {
        std::fs::read_to_string(self.args_log(name))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            output_dir: self.outputs.clone(),
            staging_dir: Some(self.dir.path().join("staging")),
            remove_input_on_success: true,
            relay_capacity: 100,
            max_job_age: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(300),
        }
    }

    pub fn orchestrator(&self, tools: ToolPaths) -> Orchestrator {
        Orchestrator::start(self.settings(), ProcessRunner::new(tools))
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Tool paths where every program is `program`.
pub fn all_tools(program: &Path) -> ToolPaths {
    ToolPaths {
        ffmpeg: program.to_path_buf(),
        ffprobe: program.to_path_buf(),
        imagemagick: program.to_path_buf(),
    }
}
