use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where uploaded originals are written before conversion.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Where converted files are written, as `<job_id>_converted.<ext>`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Parent for per-job staging directories (system temp dir when unset).
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
            staging_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// ImageMagick's `magick` front end.
    #[serde(default)]
    pub imagemagick_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// Capacity of the progress mailbox; samples beyond it are dropped.
    #[serde(default = "default_relay_capacity")]
    pub relay_capacity: usize,

    /// Encoder stderr lines kept for failure messages.
    #[serde(default = "default_diagnostic_tail_lines")]
    pub diagnostic_tail_lines: usize,

    /// Terminal jobs older than this are swept from the registry.
    #[serde(default = "default_max_job_age_secs")]
    pub max_job_age_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Delete the uploaded original once its conversion succeeds.
    #[serde(default = "default_true")]
    pub remove_input_on_success: bool,
}

fn default_relay_capacity() -> usize {
    100
}
fn default_diagnostic_tail_lines() -> usize {
    200
}
fn default_max_job_age_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            relay_capacity: default_relay_capacity(),
            diagnostic_tail_lines: default_diagnostic_tail_lines(),
            max_job_age_secs: default_max_job_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            remove_input_on_success: default_true(),
        }
    }
}

impl JobsConfig {
    pub fn max_job_age(&self) -> Duration {
        Duration::from_secs(self.max_job_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
