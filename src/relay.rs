//! Best-effort progress delivery.
//!
//! Runners push [`ProgressSample`]s into a bounded mailbox without waiting;
//! a single task applies them to the [`JobRegistry`]. When the mailbox is
//! full the sample is dropped, since a later one supersedes it anyway.

use crate::jobs::JobRegistry;
use mediaforge_common::JobId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Default mailbox capacity.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub job_id: JobId,
    pub percent: u8,
}

/// Cheap handle for submitting samples.
#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<ProgressSample>,
}

impl RelaySender {
    /// Queue a sample. Returns `false` when it was dropped.
    pub fn send(&self, job_id: JobId, percent: u8) -> bool {
        match self.tx.try_send(ProgressSample { job_id, percent }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(sample)) => {
                tracing::trace!(
                    job_id = %sample.job_id,
                    percent = sample.percent,
                    "progress mailbox full, sample dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// The relay task and its shutdown handle.
#[derive(Debug)]
pub struct ProgressRelay {
    sender: RelaySender,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<usize>,
}

impl ProgressRelay {
    /// Start the relay task applying samples to `registry`.
    pub fn spawn(registry: Arc<JobRegistry>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<ProgressSample>(capacity.max(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut applied = 0usize;
            loop {
                tokio::select! {
                    sample = rx.recv() => match sample {
                        Some(sample) => applied += apply(&registry, sample),
                        None => break,
                    },
                    _ = &mut shutdown_rx => {
                        // Refuse new samples, then drain what is queued.
                        rx.close();
                        while let Some(sample) = rx.recv().await {
                            applied += apply(&registry, sample);
                        }
                        break;
                    }
                }
            }
            tracing::debug!(applied, "progress relay stopped");
            applied
        });

        Self {
            sender: RelaySender { tx },
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    pub fn sender(&self) -> RelaySender {
        self.sender.clone()
    }

    /// Close the mailbox, apply queued samples and wait for the task.
    ///
    /// Returns how many samples changed a job's progress over the relay's life.
    pub async fn shutdown(mut self) -> usize {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.await {
            Ok(applied) => applied,
            Err(e) => {
                tracing::error!("progress relay task failed: {}", e);
                0
            }
        }
    }
}

fn apply(registry: &JobRegistry, sample: ProgressSample) -> usize {
    match registry.update_progress(sample.job_id, sample.percent) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            // The job may have been swept already.
            tracing::debug!(job_id = %sample.job_id, "dropping progress sample: {}", e);
            0
        }
    }
}
