//! Extraction queue: bounded buffer, worker pool, observable job state.
//!
//! One job per ingested PDF. The buffer is a bounded channel and the pool
//! a semaphore, so concurrent extractions never exceed `max_workers` and a
//! burst of uploads beyond `queue_depth` is rejected at submit time
//! instead of fanning out unboundedly.
//!
//! Shutdown: [`ExtractionQueue::shutdown`] signals the pool to stop; it
//! does not wait for in-flight jobs, and jobs still buffered are dropped
//! (their handles never reach a terminal state).

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::context::{ExtractionJob, ExtractionJobHandler};

#[derive(Clone)]
pub struct ExtractionQueueConfig {
    pub max_workers: usize,
    pub queue_depth: usize,
    pub job_timeout_secs: u64,
}

impl Default for ExtractionQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            queue_depth: 64,
            job_timeout_secs: 120,
        }
    }
}

/// Observable lifecycle of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("extraction queue is full")]
    QueueFull,
    #[error("extraction queue is shut down")]
    Closed,
}

/// Handle returned by [`ExtractionQueue::submit`].
///
/// Cancellation is cooperative: a job cancelled before it starts never
/// runs; a running job is abandoned at its next await point, leaving its
/// database state to reflect the last completed step.
pub struct JobHandle {
    job_id: Uuid,
    state_rx: watch::Receiver<JobState>,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.job_id
    }

    pub fn state(&self) -> JobState {
        *self.state_rx.borrow()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the job reaches a terminal state.
    pub async fn wait(&mut self) -> JobState {
        loop {
            let state = *self.state_rx.borrow();
            if state.is_terminal() {
                return state;
            }
            if self.state_rx.changed().await.is_err() {
                // Sender dropped (queue shut down with the job buffered);
                // report whatever state was last observed.
                return *self.state_rx.borrow();
            }
        }
    }
}

struct QueuedJob {
    job_id: Uuid,
    job: ExtractionJob,
    state_tx: watch::Sender<JobState>,
    cancel: CancellationToken,
}

pub struct ExtractionQueue {
    job_tx: mpsc::Sender<QueuedJob>,
    shutdown_tx: mpsc::Sender<()>,
    job_timeout: Duration,
}

impl ExtractionQueue {
    /// Create a new queue with a weak reference to the dispatch handler.
    pub fn new(config: ExtractionQueueConfig, handler: Weak<dyn ExtractionJobHandler>) -> Self {
        let (job_tx, job_rx) = mpsc::channel(config.queue_depth);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let job_timeout = Duration::from_secs(config.job_timeout_secs);

        let pool_config = config.clone();
        tokio::spawn(async move {
            Self::worker_pool(pool_config, job_rx, shutdown_rx, handler, job_timeout).await;
        });

        Self {
            job_tx,
            shutdown_tx,
            job_timeout,
        }
    }

    /// Submit a job. Returns immediately: either a handle, or QueueFull
    /// when the buffer is at capacity.
    pub fn submit(&self, job: ExtractionJob) -> Result<JobHandle, SubmitError> {
        let job_id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(JobState::Queued);
        let cancel = CancellationToken::new();

        let queued = QueuedJob {
            job_id,
            job,
            state_tx,
            cancel: cancel.clone(),
        };

        self.job_tx.try_send(queued).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;

        tracing::info!(job_id = %job_id, "Extraction job submitted to queue");

        Ok(JobHandle {
            job_id,
            state_rx,
            cancel,
        })
    }

    async fn worker_pool(
        config: ExtractionQueueConfig,
        mut job_rx: mpsc::Receiver<QueuedJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
        handler: Weak<dyn ExtractionJobHandler>,
        job_timeout: Duration,
    ) {
        tracing::info!(
            max_workers = config.max_workers,
            queue_depth = config.queue_depth,
            job_timeout_secs = config.job_timeout_secs,
            "Extraction worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers));

        loop {
            // Claim a worker slot first; jobs stay buffered in the channel
            // until one is free, so queue_depth is the real backlog bound.
            let permit = tokio::select! {
                _ = shutdown_rx.recv() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let queued = tokio::select! {
                _ = shutdown_rx.recv() => break,
                maybe_job = job_rx.recv() => match maybe_job {
                    Some(queued) => queued,
                    None => break,
                },
            };

            let handler = handler.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::run_job(queued, handler, job_timeout).await;
            });
        }

        tracing::info!("Extraction worker pool stopped");
    }

    async fn run_job(
        queued: QueuedJob,
        handler: Weak<dyn ExtractionJobHandler>,
        job_timeout: Duration,
    ) {
        if queued.cancel.is_cancelled() {
            tracing::info!(job_id = %queued.job_id, "Job cancelled before it started");
            let _ = queued.state_tx.send(JobState::Cancelled);
            return;
        }

        let Some(handler) = handler.upgrade() else {
            tracing::error!(
                job_id = %queued.job_id,
                "ExtractionJobHandler was dropped, cannot process job"
            );
            let _ = queued.state_tx.send(JobState::Failed);
            return;
        };

        let _ = queued.state_tx.send(JobState::Running);

        let work = handler.process_document(&queued.job);
        let outcome = tokio::select! {
            _ = queued.cancel.cancelled() => {
                tracing::info!(job_id = %queued.job_id, "Job cancelled while running");
                JobState::Cancelled
            }
            result = tokio::time::timeout(job_timeout, work) => match result {
                Ok(Ok(())) => {
                    tracing::info!(
                        job_id = %queued.job_id,
                        document_id = %queued.job.document_id,
                        "Extraction job finished"
                    );
                    JobState::Completed
                }
                Ok(Err(e)) => {
                    tracing::error!(job_id = %queued.job_id, error = %e, "Extraction job failed");
                    JobState::Failed
                }
                Err(_) => {
                    tracing::error!(
                        job_id = %queued.job_id,
                        timeout_secs = job_timeout.as_secs(),
                        "Extraction job timed out"
                    );
                    JobState::Failed
                }
            },
        };

        let _ = queued.state_tx.send(outcome);
    }

    /// Per-job timeout the pool applies to `process_document`.
    pub fn job_timeout(&self) -> Duration {
        self.job_timeout
    }

    /// Signals the worker pool to stop claiming new jobs and exit the main
    /// loop. Returns immediately; in-flight jobs run to completion.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating extraction queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Clone for ExtractionQueue {
    fn clone(&self) -> Self {
        Self {
            job_tx: self.job_tx.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
            job_timeout: self.job_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn job() -> ExtractionJob {
        ExtractionJob {
            document_id: Uuid::new_v4(),
            extraction_id: Uuid::new_v4(),
            attachment_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
        }
    }

    fn config(max_workers: usize, queue_depth: usize) -> ExtractionQueueConfig {
        ExtractionQueueConfig {
            max_workers,
            queue_depth,
            job_timeout_secs: 5,
        }
    }

    /// Counts concurrent executions and records the maximum observed.
    struct ConcurrencyProbe {
        current: AtomicUsize,
        max_seen: AtomicUsize,
    }

    #[async_trait]
    impl ExtractionJobHandler for ConcurrencyProbe {
        async fn process_document(self: Arc<Self>, _job: &ExtractionJob) -> anyhow::Result<()> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ExtractionJobHandler for FailingHandler {
        async fn process_document(self: Arc<Self>, _job: &ExtractionJob) -> anyhow::Result<()> {
            Err(anyhow!("boom"))
        }
    }

    /// Signals when a job starts, then blocks until released.
    struct GatedHandler {
        started: mpsc::Sender<()>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ExtractionJobHandler for GatedHandler {
        async fn process_document(self: Arc<Self>, _job: &ExtractionJob) -> anyhow::Result<()> {
            let _ = self.started.send(()).await;
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn submitted_job_completes() {
        let handler: Arc<dyn ExtractionJobHandler> = Arc::new(ConcurrencyProbe {
            current: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        });
        let queue = ExtractionQueue::new(config(2, 8), Arc::downgrade(&handler));

        let mut handle = queue.submit(job()).unwrap();
        assert_eq!(handle.wait().await, JobState::Completed);
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_max_workers() {
        let probe = Arc::new(ConcurrencyProbe {
            current: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        });
        let handler: Arc<dyn ExtractionJobHandler> = probe.clone();
        let queue = ExtractionQueue::new(config(2, 16), Arc::downgrade(&handler));

        let mut handles: Vec<JobHandle> = (0..8).map(|_| queue.submit(job()).unwrap()).collect();
        for handle in &mut handles {
            assert_eq!(handle.wait().await, JobState::Completed);
        }

        assert!(probe.max_seen.load(Ordering::SeqCst) <= 2);
        assert!(probe.max_seen.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn job_fails_when_handler_is_gone() {
        let queue = ExtractionQueue::new(config(1, 4), crate::context::empty_handler_weak());

        let mut handle = queue.submit(job()).unwrap();
        assert_eq!(handle.wait().await, JobState::Failed);
    }

    #[tokio::test]
    async fn failed_job_does_not_poison_the_pool() {
        let handler: Arc<dyn ExtractionJobHandler> = Arc::new(FailingHandler);
        let queue = ExtractionQueue::new(config(1, 8), Arc::downgrade(&handler));

        let mut first = queue.submit(job()).unwrap();
        assert_eq!(first.wait().await, JobState::Failed);

        let mut second = queue.submit(job()).unwrap();
        assert_eq!(second.wait().await, JobState::Failed);
    }

    #[tokio::test]
    async fn full_queue_rejects_submissions() {
        let (started_tx, mut started_rx) = mpsc::channel(4);
        let release = Arc::new(Notify::new());
        let handler: Arc<dyn ExtractionJobHandler> = Arc::new(GatedHandler {
            started: started_tx,
            release: release.clone(),
        });
        let queue = ExtractionQueue::new(config(1, 1), Arc::downgrade(&handler));

        // First job is claimed by the single worker...
        let mut running = queue.submit(job()).unwrap();
        started_rx.recv().await.unwrap();
        // ...second fills the buffer, third must bounce.
        let mut buffered = queue.submit(job()).unwrap();
        let rejected = queue.submit(job());
        assert!(matches!(rejected, Err(SubmitError::QueueFull)));

        release.notify_one();
        assert_eq!(running.wait().await, JobState::Completed);
        release.notify_one();
        assert_eq!(buffered.wait().await, JobState::Completed);
    }

    #[tokio::test]
    async fn cancelled_queued_job_never_runs() {
        let (started_tx, mut started_rx) = mpsc::channel(4);
        let release = Arc::new(Notify::new());
        let handler: Arc<dyn ExtractionJobHandler> = Arc::new(GatedHandler {
            started: started_tx,
            release: release.clone(),
        });
        let queue = ExtractionQueue::new(config(1, 4), Arc::downgrade(&handler));

        let mut running = queue.submit(job()).unwrap();
        started_rx.recv().await.unwrap();

        let mut waiting = queue.submit(job()).unwrap();
        waiting.cancel();

        release.notify_one();
        assert_eq!(running.wait().await, JobState::Completed);
        assert_eq!(waiting.wait().await, JobState::Cancelled);

        // The cancelled job must never have reached the handler.
        assert!(started_rx.try_recv().is_err());
    }
}
