//! Background execution of a single job

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::adapter::{AdapterRequest, GenerationAdapter};
use crate::error::{AppError, Result};
use crate::ledger::CreditLedger;
use crate::model::{Job, JobStatus, NewAsset};
use crate::store::JobStore;

/// Shared handles every worker runs jobs against
pub struct JobContext {
    pub store: Arc<dyn JobStore>,
    pub ledger: Arc<dyn CreditLedger>,
    pub adapter: Arc<dyn GenerationAdapter>,
    pub adapter_timeout: Duration,
    pub refund_on_failure: bool,
}

/// A job waiting for a worker
#[derive(Debug, Clone)]
pub struct JobTask {
    pub job: Job,
    pub request: AdapterRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { images: usize },
    Failed,
}

impl JobContext {
    /// Drive a job from `processing` to a terminal state. Never returns an
    /// error: every failure ends as a `failed` transition.
    pub async fn run(&self, task: JobTask) -> JobOutcome {
        let job = task.job;
        let in_flight = job.kind.in_flight_status();

        if let Err(e) = self
            .store
            .transition_status(job.id, JobStatus::Processing, in_flight, None)
            .await
        {
            // Already failed by the reaper, or the store is unavailable
            warn!(job_id = %job.id, error = %e, "Job could not be started");
            self.fail(&job, JobStatus::Processing, e.to_string()).await;
            return JobOutcome::Failed;
        }

        info!(job_id = %job.id, kind = %job.kind, owner = %job.owner, "Job started");

        let assets = match self.execute(&job, task.request).await {
            Ok(assets) => assets,
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Job execution failed");
                self.fail(&job, in_flight, e.to_string()).await;
                return JobOutcome::Failed;
            }
        };

        // Assets land only while the job is still in flight
        match self.store.complete_job(job.id, in_flight, assets).await {
            Ok((_, stored)) => {
                info!(job_id = %job.id, images = stored.len(), "Job completed");
                JobOutcome::Completed {
                    images: stored.len(),
                }
            }
            Err(e @ AppError::InvalidTransition { .. }) => {
                warn!(job_id = %job.id, error = %e, "Discarding results of a job no longer in flight");
                JobOutcome::Failed
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Job could not be completed");
                self.fail(&job, in_flight, e.to_string()).await;
                JobOutcome::Failed
            }
        }
    }

    /// Call the adapter and turn its images into asset records
    async fn execute(&self, job: &Job, request: AdapterRequest) -> Result<Vec<NewAsset>> {
        let (style_preset, background_preset) = match &request {
            AdapterRequest::Generation(params) => (
                params.style_preset.clone(),
                params.background_preset.clone(),
            ),
            AdapterRequest::Retouch { params, .. } => {
                ("retouched".to_string(), params.edit_type.as_str().to_string())
            }
        };

        let images = tokio::time::timeout(self.adapter_timeout, self.adapter.generate(request))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "{} adapter did not respond within {}s",
                    self.adapter.name(),
                    self.adapter_timeout.as_secs()
                ))
            })??;

        if images.is_empty() {
            return Err(AppError::Adapter("Adapter returned no images".to_string()));
        }
        if images.iter().any(|image| image.url.trim().is_empty()) {
            return Err(AppError::Adapter("Adapter returned an empty image URL".to_string()));
        }

        Ok(images
            .into_iter()
            .map(|image| NewAsset {
                uri: image.url,
                parent_image_id: job.parent_image_id,
                style_preset: Some(style_preset.clone()),
                background_preset: Some(background_preset.clone()),
            })
            .collect())
    }

    /// Move a job from `from` to `failed` and, when the policy says so,
    /// refund the credits charged for it.
    ///
    /// Only the caller whose transition succeeds issues the refund, so a
    /// job is refunded at most once however many paths try to fail it.
    pub async fn fail(&self, job: &Job, from: JobStatus, reason: String) -> bool {
        match self
            .store
            .transition_status(job.id, from, JobStatus::Failed, Some(reason.clone()))
            .await
        {
            Ok(_) => {
                warn!(job_id = %job.id, reason = %reason, "Job failed");
                if self.refund_on_failure && job.credits_charged > 0 {
                    match self.ledger.credit(&job.owner, job.credits_charged).await {
                        Ok(balance) => info!(
                            job_id = %job.id,
                            owner = %job.owner,
                            credits = job.credits_charged,
                            balance,
                            "Credits refunded"
                        ),
                        Err(e) => error!(
                            job_id = %job.id,
                            owner = %job.owner,
                            error = %e,
                            "Credit refund failed"
                        ),
                    }
                }
                true
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Job not marked failed");
                false
            }
        }
    }
}
