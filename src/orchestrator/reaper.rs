//! Periodic sweep that fails jobs stuck in their in-flight state

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::model::JobStatus;
use crate::orchestrator::runner::JobContext;

/// Fails started jobs that have not changed status for longer than
/// `max_in_flight`
pub struct JobReaper {
    ctx: Arc<JobContext>,
    max_in_flight: Duration,
    sweep_task: RwLock<Option<JoinHandle<()>>>,
}

impl JobReaper {
    pub(crate) fn new(ctx: Arc<JobContext>, max_in_flight: Duration) -> Self {
        Self {
            ctx,
            max_in_flight,
            sweep_task: RwLock::new(None),
        }
    }

    /// Start the background sweep
    pub async fn start(self: &Arc<Self>, interval: Duration) {
        let reaper = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                reaper.sweep().await;
            }
        });

        if let Some(previous) = self.sweep_task.write().await.replace(handle) {
            previous.abort();
        }
        info!(
            interval_secs = interval.as_secs(),
            max_in_flight_secs = self.max_in_flight.as_secs(),
            "Started job reaper"
        );
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.sweep_task.write().await.take() {
            handle.abort();
            info!("Stopped job reaper");
        }
    }

    /// Run one sweep, returning how many jobs were failed
    pub async fn sweep(&self) -> usize {
        let max_age = match chrono::Duration::from_std(self.max_in_flight) {
            Ok(age) => age,
            Err(e) => {
                error!(error = %e, "Reaper max age out of range");
                return 0;
            }
        };
        let cutoff = Utc::now() - max_age;

        // Queued jobs stay `processing` until a worker starts them
        let stale = match self.ctx.store.stale_jobs(cutoff).await {
            Ok(jobs) => jobs
                .into_iter()
                .filter(|job| job.status != JobStatus::Processing)
                .collect::<Vec<_>>(),
            Err(e) => {
                error!(error = %e, "Reaper could not list stale jobs");
                return 0;
            }
        };

        let mut reaped = 0;
        for job in stale {
            let reason = format!(
                "Job exceeded maximum in-flight time of {}s while {}",
                self.max_in_flight.as_secs(),
                job.status
            );
            if self.ctx.fail(&job, job.status, reason).await {
                reaped += 1;
            }
        }

        if reaped > 0 {
            warn!(reaped, "Reaper failed stuck jobs");
        } else {
            debug!("Reaper found no stuck jobs");
        }
        reaped
    }
}
