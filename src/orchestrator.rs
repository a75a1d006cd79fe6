//! Conversion orchestration.
//!
//! [`Orchestrator::submit`] validates synchronously and then hands the job to
//! its own task, which builds the plan, runs every pass while relaying
//! progress, and records the terminal state.

use crate::config::Config;
use crate::error::Result;
use crate::jobs::{Job, JobRegistry, OriginalFile};
use crate::relay::{ProgressRelay, RelaySender};
use chrono::Utc;
use mediaforge_av::{command, OptionSet, ProcessRunner, ProgressSink, StagingArea};
use mediaforge_common::{JobId, JobStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Progress recorded once the command is built, before anything is spawned.
pub const BUILT_MILESTONE: u8 = 10;

/// Prefix of the result locator handed back to clients.
pub const DOWNLOAD_PREFIX: &str = "/api/download/";

const WAIT_POLL: Duration = Duration::from_millis(20);

/// Settings the per-job tasks need.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub output_dir: PathBuf,
    pub staging_dir: Option<PathBuf>,
    pub remove_input_on_success: bool,
    pub relay_capacity: usize,
    pub max_job_age: Duration,
    pub sweep_interval: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.storage.output_dir.clone(),
            staging_dir: config.storage.staging_dir.clone(),
            remove_input_on_success: config.jobs.remove_input_on_success,
            relay_capacity: config.jobs.relay_capacity,
            max_job_age: config.jobs.max_job_age(),
            sweep_interval: config.jobs.sweep_interval(),
        }
    }
}

struct Shared {
    registry: Arc<JobRegistry>,
    relay: RelaySender,
    runner: ProcessRunner,
    settings: OrchestratorSettings,
}

/// Accepts conversions and drives them to a terminal state.
pub struct Orchestrator {
    shared: Arc<Shared>,
    relay: ProgressRelay,
    sweeper: JoinHandle<()>,
}

impl Orchestrator {
    /// Build from configuration, resolving tools and starting background tasks.
    pub fn from_config(config: &Config) -> Self {
        let runner = ProcessRunner::new(config.tools.resolve())
            .with_tail_lines(config.jobs.diagnostic_tail_lines);
        Self::start(OrchestratorSettings::from_config(config), runner)
    }

    /// Start the progress relay and the sweeper. Must be called inside a
    /// tokio runtime.
    pub fn start(settings: OrchestratorSettings, runner: ProcessRunner) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let relay = ProgressRelay::spawn(registry.clone(), settings.relay_capacity);
        let sweeper = spawn_sweeper(
            registry.clone(),
            settings.max_job_age,
            settings.sweep_interval,
        );
        let shared = Arc::new(Shared {
            registry,
            relay: relay.sender(),
            runner,
            settings,
        });
        Self {
            shared,
            relay,
            sweeper,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.shared.registry
    }

    /// Validate `raw_options` and start converting `input_path`.
    ///
    /// Invalid options are rejected here and no job is created.
    pub fn submit(
        &self,
        original_file: OriginalFile,
        raw_options: serde_json::Value,
        input_path: PathBuf,
    ) -> Result<JobId> {
        let options = OptionSet::parse_and_validate(original_file.category(), &raw_options)?;
        let job = self.shared.registry.create(original_file, raw_options);
        let id = job.id;
        tracing::info!(job_id = %id, category = %options.category(), "conversion accepted");

        let shared = self.shared.clone();
        tokio::spawn(async move {
            shared.run(id, options, input_path).await;
        });
        Ok(id)
    }

    /// Snapshot of one job.
    pub fn status(&self, id: JobId) -> Result<Job> {
        Ok(self.shared.registry.get(id)?)
    }

    /// Output path and download name of a completed job.
    pub fn result_path(&self, id: JobId) -> Result<(PathBuf, String)> {
        let job = self.shared.registry.get(id)?;
        if job.status != JobStatus::Completed {
            return Err(mediaforge_common::Error::NotCompleted {
                id,
                status: job.status,
            }
            .into());
        }
        let path = job.output_path.clone().ok_or_else(|| {
            mediaforge_common::Error::internal(format!("completed job {id} has no output path"))
        })?;
        let name = job
            .download_name()
            .unwrap_or_else(|| format!("{}_converted", job.original_file.stem()));
        Ok((path, name))
    }

    /// Converted bytes of a completed job.
    pub async fn result(&self, id: JobId) -> Result<Vec<u8>> {
        let (path, _) = self.result_path(id)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Poll until the job is terminal or `timeout` passes.
    pub async fn wait_for(&self, id: JobId, timeout: Duration) -> Result<Job> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let job = self.status(id)?;
            if job.is_terminal() || tokio::time::Instant::now() >= deadline {
                return Ok(job);
            }
            tokio::time::sleep(WAIT_POLL).await;
        }
    }

    /// Stop the sweeper and drain the progress relay.
    pub async fn shutdown(self) {
        self.sweeper.abort();
        let applied = self.relay.shutdown().await;
        tracing::debug!(applied, "orchestrator stopped");
    }
}

impl Shared {
    async fn run(&self, id: JobId, options: OptionSet, input: PathBuf) {
        if let Err(message) = check_input(&input) {
            tracing::warn!(job_id = %id, "{}", message);
            self.fail(id, message);
            return;
        }

        if let Err(e) = self.registry.transition(id, JobStatus::Processing) {
            tracing::error!(job_id = %id, "cannot start job: {}", e);
            return;
        }

        let output = self.settings.output_dir.join(format!(
            "{}_converted.{}",
            id,
            options.output_extension()
        ));

        match self.convert(id, &options, &input, &output).await {
            Ok(()) => {
                let locator = format!("{DOWNLOAD_PREFIX}{id}");
                match self.registry.complete(id, locator, output.clone()) {
                    Ok(outcome) if outcome.is_applied() => {
                        tracing::info!(
                            job_id = %id,
                            output = %output.display(),
                            "conversion completed"
                        );
                    }
                    Ok(outcome) => {
                        tracing::warn!(job_id = %id, ?outcome, "completion not recorded");
                    }
                    Err(e) => tracing::error!(job_id = %id, "cannot complete job: {}", e),
                }
                if self.settings.remove_input_on_success {
                    if let Err(e) = tokio::fs::remove_file(&input).await {
                        tracing::warn!(job_id = %id, "failed to remove input {:?}: {}", input, e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %id, "conversion failed: {}", e);
                if tokio::fs::remove_file(&output).await.is_ok() {
                    tracing::debug!(job_id = %id, "removed partial output");
                }
                self.fail(id, e.to_string());
            }
        }
    }

    async fn convert(
        &self,
        id: JobId,
        options: &OptionSet,
        input: &Path,
        output: &Path,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.settings.output_dir).await?;
        let staging = StagingArea::new(self.settings.staging_dir.as_deref(), &id.to_string())?;

        let result = self.run_plan(id, options, input, output, staging.path()).await;

        if let Err(e) = staging.cleanup() {
            tracing::warn!(job_id = %id, "staging cleanup failed: {}", e);
        }
        result
    }

    async fn run_plan(
        &self,
        id: JobId,
        options: &OptionSet,
        input: &Path,
        output: &Path,
        staging_dir: &Path,
    ) -> Result<()> {
        let plan = command::build(options, input, output, staging_dir)?;
        self.relay.send(id, BUILT_MILESTONE);

        let passes = plan.passes();
        let mut pass_input = input;
        for (index, pass) in passes.iter().enumerate() {
            let is_last = index + 1 == passes.len();
            let pass_output = match plan.staging_file() {
                Some(staging) if !is_last => staging,
                _ => plan.output(),
            };
            let sink = PassProgress {
                relay: &self.relay,
                job_id: id,
                index,
                count: passes.len(),
            };
            tracing::debug!(
                job_id = %id,
                pass = index + 1,
                of = passes.len(),
                "running {}",
                pass.encoder()
            );
            self.runner.run(pass, pass_input, pass_output, &sink).await?;
            pass_input = pass_output;
        }
        Ok(())
    }

    fn fail(&self, id: JobId, message: String) {
        if let Err(e) = self.registry.set_error(id, message) {
            tracing::error!(job_id = %id, "cannot record failure: {}", e);
        }
    }
}

/// Maps one pass's 0..=100 onto its share of the range above the milestone.
struct PassProgress<'a> {
    relay: &'a RelaySender,
    job_id: JobId,
    index: usize,
    count: usize,
}

/// `percent` of pass `index` (of `count`) as overall job progress.
fn scale_pass_progress(percent: u8, index: usize, count: usize) -> u8 {
    let span = f64::from(100 - BUILT_MILESTONE) / count.max(1) as f64;
    let value = f64::from(BUILT_MILESTONE)
        + span * index as f64
        + span * f64::from(percent.min(100)) / 100.0;
    value.floor().clamp(0.0, 100.0) as u8
}

impl ProgressSink for PassProgress<'_> {
    fn report(&self, percent: u8) {
        self.relay
            .send(self.job_id, scale_pass_progress(percent, self.index, self.count));
    }
}

/// Copy `source` into `upload_dir` under a unique name, as an upload would
/// land there. The orchestrator owns the copy from then on.
pub async fn stage_upload(upload_dir: &Path, source: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());
    let stamp = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros());
    let dest = upload_dir.join(format!("upload_{stamp}_{name}"));
    tokio::fs::copy(source, &dest).await?;
    tracing::debug!(source = %source.display(), dest = %dest.display(), "staged upload");
    Ok(dest)
}

/// The input must exist, be a regular file, and be non-empty.
fn check_input(path: &Path) -> std::result::Result<(), String> {
    match std::fs::metadata(path) {
        Ok(meta) if !meta.is_file() => Err(format!(
            "file not found: input '{}' is not a regular file",
            path.display()
        )),
        Ok(meta) if meta.len() == 0 => Err(format!(
            "file not found: input file '{}' is empty",
            path.display()
        )),
        Ok(_) => Ok(()),
        Err(e) => Err(format!(
            "file not found: input file '{}' is not accessible: {}",
            path.display(),
            e
        )),
    }
}

fn spawn_sweeper(
    registry: Arc<JobRegistry>,
    max_age: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
            let Some(cutoff) = Utc::now().checked_sub_signed(age) else {
                continue;
            };
            let removed = registry.remove_completed_before(cutoff);
            if removed > 0 {
                tracing::info!(removed, "swept finished jobs");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pass_scaling() {
        assert_eq!(scale_pass_progress(0, 0, 1), 10);
        assert_eq!(scale_pass_progress(50, 0, 1), 55);
        assert_eq!(scale_pass_progress(100, 0, 1), 100);
    }

    #[test]
    fn test_two_pass_scaling() {
        assert_eq!(scale_pass_progress(100, 0, 2), 55);
        assert_eq!(scale_pass_progress(0, 1, 2), 55);
        assert_eq!(scale_pass_progress(100, 1, 2), 100);
    }

    #[tokio::test]
    async fn test_stage_upload_copies_into_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("song.wav");
        std::fs::write(&source, b"RIFF").unwrap();
        let uploads = dir.path().join("uploads/nested");

        let staged = stage_upload(&uploads, &source).await.unwrap();
        assert_eq!(staged.parent(), Some(uploads.as_path()));
        let name = staged.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("upload_") && name.ends_with("_song.wav"), "{name}");
        assert_eq!(std::fs::read(&staged).unwrap(), b"RIFF");
        assert!(source.exists());

        let again = stage_upload(&uploads, &source).await.unwrap();
        assert_ne!(again, staged);
    }

    #[test]
    fn test_input_precheck() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.wav");
        assert!(check_input(&missing).unwrap_err().starts_with("file not found"));

        let empty = dir.path().join("empty.wav");
        std::fs::write(&empty, b"").unwrap();
        assert!(check_input(&empty).unwrap_err().contains("is empty"));

        assert!(check_input(dir.path()).unwrap_err().contains("not a regular file"));

        let ok = dir.path().join("ok.wav");
        std::fs::write(&ok, b"RIFF").unwrap();
        assert!(check_input(&ok).is_ok());
    }
}
