//! In-memory job registry.
//!
//! Every mutation happens under one write lock, so readers only ever see a
//! cloned snapshot of a fully-applied transition.

mod types;

pub use types::*;

use chrono::{DateTime, Utc};
use mediaforge_common::{Error, JobId, JobStatus, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// What a state-changing call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The job moved to the requested state.
    Applied,
    /// The job was already in the requested state.
    Unchanged,
    /// The move is not allowed from the job's current state.
    Rejected,
}

impl TransitionOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending job and return its snapshot.
    pub fn create(&self, original_file: OriginalFile, options: serde_json::Value) -> Job {
        let job = Job::new(original_file, options);
        self.jobs.write().insert(job.id, job.clone());
        tracing::debug!(job_id = %job.id, "job created");
        job
    }

    pub fn get(&self, id: JobId) -> Result<Job> {
        self.jobs.read().get(&id).cloned().ok_or(Error::NotFound(id))
    }

    /// Move a job to `next`.
    ///
    /// Repeating the current state is [`TransitionOutcome::Unchanged`];
    /// anything the state machine forbids is [`TransitionOutcome::Rejected`].
    pub fn transition(&self, id: JobId, next: JobStatus) -> Result<TransitionOutcome> {
        self.mutate(id, next, |job| match next {
            JobStatus::Processing => job.start(),
            JobStatus::Completed => {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.completed_at.get_or_insert_with(Utc::now);
            }
            JobStatus::Failed => {
                job.status = JobStatus::Failed;
                job.completed_at.get_or_insert_with(Utc::now);
            }
            JobStatus::Pending => {}
        })
    }

    /// Raise a running job's progress.
    ///
    /// Returns whether the stored value changed. Samples for jobs that are not
    /// processing, or that would lower the value, are discarded.
    pub fn update_progress(&self, id: JobId, percent: u8) -> Result<bool> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id).ok_or(Error::NotFound(id))?;
        let percent = percent.min(100);
        if job.status != JobStatus::Processing || percent <= job.progress {
            return Ok(false);
        }
        job.progress = percent;
        Ok(true)
    }

    /// Complete a processing job with its result locator, in one step.
    pub fn complete(
        &self,
        id: JobId,
        result: impl Into<String>,
        output_path: PathBuf,
    ) -> Result<TransitionOutcome> {
        let result = result.into();
        self.mutate(id, JobStatus::Completed, move |job| {
            job.complete(result, output_path)
        })
    }

    /// Replace the result locator of a completed job.
    pub fn set_result(&self, id: JobId, result: impl Into<String>) -> Result<TransitionOutcome> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id).ok_or(Error::NotFound(id))?;
        if job.status != JobStatus::Completed {
            return Ok(TransitionOutcome::Rejected);
        }
        job.result = Some(result.into());
        Ok(TransitionOutcome::Applied)
    }

    /// Fail a job, recording `error` and the completion time in one step.
    pub fn set_error(&self, id: JobId, error: impl Into<String>) -> Result<TransitionOutcome> {
        let error = error.into();
        self.mutate(id, JobStatus::Failed, move |job| job.fail(error))
    }

    /// Snapshots of every job, oldest first.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().values().cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Drop terminal jobs that finished before `cutoff`.
    pub fn remove_completed_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| !matches!(job.completed_at, Some(done) if done < cutoff));
        before - jobs.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    fn mutate(
        &self,
        id: JobId,
        next: JobStatus,
        apply: impl FnOnce(&mut Job),
    ) -> Result<TransitionOutcome> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id).ok_or(Error::NotFound(id))?;
        let current = job.status;

        if current == next {
            return Ok(TransitionOutcome::Unchanged);
        }
        if !current.can_transition_to(next) {
            tracing::debug!(job_id = %id, from = %current, to = %next, "transition rejected");
            return Ok(TransitionOutcome::Rejected);
        }

        apply(job);
        tracing::debug!(job_id = %id, from = %current, to = %next, "job transitioned");
        Ok(TransitionOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn registry_with_job() -> (JobRegistry, JobId) {
        let registry = JobRegistry::new();
        let job = registry.create(
            OriginalFile::new("song.wav", 1024, "audio/wav"),
            serde_json::json!({"format": "mp3", "bitrate": "192"}),
        );
        (registry, job.id)
    }

    #[test]
    fn test_lifecycle() {
        let (registry, id) = registry_with_job();
        assert_eq!(registry.get(id).unwrap().status, JobStatus::Pending);

        assert!(registry.transition(id, JobStatus::Processing).unwrap().is_applied());
        let started = registry.get(id).unwrap().started_at;
        assert!(started.is_some());

        assert!(registry.update_progress(id, 40).unwrap());
        let outcome = registry
            .complete(id, "/api/download/x", PathBuf::from("/out/x.mp3"))
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);

        let job = registry.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.result.as_deref(), Some("/api/download/x"));
        assert_eq!(job.started_at, started);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let (registry, id) = registry_with_job();
        registry.transition(id, JobStatus::Processing).unwrap();
        registry.set_error(id, "encoder crashed").unwrap();
        let failed = registry.get(id).unwrap();

        assert_eq!(
            registry.transition(id, JobStatus::Processing).unwrap(),
            TransitionOutcome::Rejected
        );
        assert_eq!(
            registry
                .complete(id, "/api/download/x", PathBuf::from("x"))
                .unwrap(),
            TransitionOutcome::Rejected
        );
        assert_eq!(
            registry.set_error(id, "second").unwrap(),
            TransitionOutcome::Unchanged
        );

        let job = registry.get(id).unwrap();
        assert_eq!(job.error.as_deref(), Some("encoder crashed"));
        assert_eq!(job.completed_at, failed.completed_at);
    }

    #[test]
    fn test_pending_can_fail_but_not_complete() {
        let (registry, id) = registry_with_job();
        assert_eq!(
            registry.complete(id, "r", PathBuf::from("x")).unwrap(),
            TransitionOutcome::Rejected
        );
        assert!(registry.set_error(id, "input missing").unwrap().is_applied());
        assert_eq!(registry.get(id).unwrap().status, JobStatus::Failed);
    }

    #[test]
    fn test_progress_is_monotonic_and_gated() {
        let (registry, id) = registry_with_job();
        // Not processing yet.
        assert!(!registry.update_progress(id, 10).unwrap());

        registry.transition(id, JobStatus::Processing).unwrap();
        assert!(registry.update_progress(id, 30).unwrap());
        assert!(!registry.update_progress(id, 20).unwrap());
        assert!(registry.update_progress(id, 250).unwrap());
        assert_eq!(registry.get(id).unwrap().progress, 100);

        registry.set_error(id, "x").unwrap();
        assert!(!registry.update_progress(id, 100).unwrap());
    }

    #[test]
    fn test_late_progress_after_completion() {
        let (registry, id) = registry_with_job();
        registry.transition(id, JobStatus::Processing).unwrap();
        registry.complete(id, "r", PathBuf::from("o")).unwrap();
        assert!(!registry.update_progress(id, 55).unwrap());
        assert_eq!(registry.get(id).unwrap().progress, 100);
    }

    #[test]
    fn test_set_result_requires_completion() {
        let (registry, id) = registry_with_job();
        assert_eq!(registry.set_result(id, "r").unwrap(), TransitionOutcome::Rejected);
        registry.transition(id, JobStatus::Processing).unwrap();
        registry.complete(id, "r", PathBuf::from("o")).unwrap();
        assert!(registry.set_result(id, "/api/download/y").unwrap().is_applied());
        assert_eq!(
            registry.get(id).unwrap().result.as_deref(),
            Some("/api/download/y")
        );
    }

    #[test]
    fn test_unknown_id() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        assert_matches!(registry.get(id), Err(Error::NotFound(missing)) if missing == id);
        assert_matches!(registry.update_progress(id, 1), Err(Error::NotFound(_)));
        assert_matches!(
            registry.transition(id, JobStatus::Processing),
            Err(Error::NotFound(_))
        );
    }

    #[test]
    fn test_sweep_only_removes_old_terminal_jobs() {
        let registry = JobRegistry::new();
        let file = || OriginalFile::new("a.png", 1, "image/png");
        let done = registry.create(file(), serde_json::json!({})).id;
        let running = registry.create(file(), serde_json::json!({})).id;
        let pending = registry.create(file(), serde_json::json!({})).id;
        registry.transition(done, JobStatus::Processing).unwrap();
        registry.complete(done, "r", PathBuf::from("o")).unwrap();
        registry.transition(running, JobStatus::Processing).unwrap();

        // Nothing finished before a cutoff in the past.
        let an_hour_ago = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(registry.remove_completed_before(an_hour_ago), 0);
        let just_after = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(registry.remove_completed_before(just_after), 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(running).is_ok());
        assert!(registry.get(pending).is_ok());
        assert_eq!(registry.list().len(), 2);
    }
}
