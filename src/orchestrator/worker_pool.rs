//! Bounded worker pool for background job execution

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::orchestrator::runner::{JobContext, JobOutcome, JobTask};

/// Pool sizing
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker tasks
    pub workers: usize,
    /// Jobs that may wait for a worker before submissions are rejected
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            capacity: 256,
        }
    }
}

#[derive(Debug, Default)]
struct PoolCounters {
    queued: AtomicU64,
    in_flight: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queued: u64,
    pub in_flight: u64,
    pub completed: u64,
    pub failed: u64,
    pub workers: usize,
    pub capacity: usize,
}

/// Fixed set of workers draining one bounded channel. Each job is
/// received by exactly one worker.
pub struct WorkerPool {
    task_tx: mpsc::Sender<JobTask>,
    counters: Arc<PoolCounters>,
    config: PoolConfig,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the workers. Must be called from within a tokio runtime.
    pub fn start(ctx: Arc<JobContext>, config: PoolConfig) -> Self {
        let (task_tx, task_rx) = mpsc::channel(config.capacity.max(1));
        let task_rx = Arc::new(Mutex::new(task_rx));
        let counters = Arc::new(PoolCounters::default());

        let handles = (0..config.workers.max(1))
            .map(|worker_id| {
                tokio::spawn(Self::run_worker(
                    worker_id,
                    task_rx.clone(),
                    ctx.clone(),
                    counters.clone(),
                ))
            })
            .collect();

        info!(
            workers = config.workers,
            capacity = config.capacity,
            "Started job worker pool"
        );

        Self {
            task_tx,
            counters,
            config,
            handles,
        }
    }

    /// Queue a job without waiting. Fails with `QueueFull` at capacity.
    pub fn enqueue(&self, task: JobTask) -> Result<()> {
        let job_id = task.job.id;
        self.counters.queued.fetch_add(1, Ordering::Relaxed);

        match self.task_tx.try_send(task) {
            Ok(()) => {
                debug!(job_id = %job_id, "Job queued");
                Ok(())
            }
            Err(e) => {
                self.counters.queued.fetch_sub(1, Ordering::Relaxed);
                match e {
                    mpsc::error::TrySendError::Full(_) => Err(AppError::QueueFull),
                    mpsc::error::TrySendError::Closed(_) => {
                        Err(AppError::Internal("Worker pool has shut down".to_string()))
                    }
                }
            }
        }
    }

    async fn run_worker(
        worker_id: usize,
        task_rx: Arc<Mutex<mpsc::Receiver<JobTask>>>,
        ctx: Arc<JobContext>,
        counters: Arc<PoolCounters>,
    ) {
        loop {
            let task = {
                let mut rx = task_rx.lock().await;
                rx.recv().await
            };
            let Some(task) = task else {
                debug!(worker_id, "Worker stopping");
                break;
            };

            counters.queued.fetch_sub(1, Ordering::Relaxed);
            counters.in_flight.fetch_add(1, Ordering::Relaxed);
            debug!(worker_id, job_id = %task.job.id, "Worker picked up job");

            let outcome = ctx.run(task).await;

            counters.in_flight.fetch_sub(1, Ordering::Relaxed);
            match outcome {
                JobOutcome::Completed { .. } => counters.completed.fetch_add(1, Ordering::Relaxed),
                JobOutcome::Failed => counters.failed.fetch_add(1, Ordering::Relaxed),
            };
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.counters.queued.load(Ordering::Relaxed),
            in_flight: self.counters.in_flight.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            workers: self.config.workers,
            capacity: self.config.capacity,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
