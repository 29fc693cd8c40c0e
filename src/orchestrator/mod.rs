//! Job orchestrator - turns validated requests into durable jobs and
//! drives them to completion on a bounded worker pool.
//!
//! Submission runs synchronously up to the point the job is queued:
//! validate, price, authorize the retouch source, debit, create the job.
//! Everything after that happens on a worker and surfaces only through the
//! job status.

pub mod reaper;
pub mod runner;
pub mod worker_pool;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::adapter::{AdapterRequest, GenerationAdapter};
use crate::error::{AppError, Result};
use crate::ledger::CreditLedger;
use crate::model::{Asset, AssetId, JobId, JobKind, JobRequest, JobStatus, NewJob, ValidatedRequest};
use crate::store::JobStore;

pub use reaper::JobReaper;
pub use runner::{JobContext, JobOutcome, JobTask};
pub use worker_pool::{PoolConfig, QueueStats, WorkerPool};

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub pool: PoolConfig,
    pub adapter_timeout: Duration,
    pub refund_on_failure: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            adapter_timeout: Duration::from_secs(180),
            refund_on_failure: true,
        }
    }
}

/// Returned to the caller as soon as a job is accepted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub status: JobStatus,
    pub estimated_completion: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_image_id: Option<AssetId>,
}

pub struct JobOrchestrator {
    ctx: Arc<JobContext>,
    pool: WorkerPool,
}

impl JobOrchestrator {
    /// Wire the orchestrator to its collaborators and start the worker pool
    pub fn new(
        ledger: Arc<dyn CreditLedger>,
        store: Arc<dyn JobStore>,
        adapter: Arc<dyn GenerationAdapter>,
        config: OrchestratorConfig,
    ) -> Self {
        let ctx = Arc::new(JobContext {
            store,
            ledger,
            adapter,
            adapter_timeout: config.adapter_timeout,
            refund_on_failure: config.refund_on_failure,
        });
        let pool = WorkerPool::start(ctx.clone(), config.pool);
        Self { ctx, pool }
    }

    /// Accept a request for `owner` and queue it for background execution
    pub async fn submit(&self, owner: &str, request: JobRequest) -> Result<SubmittedJob> {
        let validated = request.validate()?;
        let kind = validated.kind();
        let required = validated.required_credits();

        // Early read so a short balance is reported before anything else;
        // the debit below re-checks atomically.
        let available = self.ctx.ledger.balance(owner).await?;
        if available < required {
            warn!(owner, kind = %kind, required, available, "Insufficient credits");
            return Err(AppError::InsufficientCredits { required, available });
        }

        let (new_job, adapter_request) = self.prepare(owner, validated, required).await?;

        if !self.ctx.ledger.try_debit(owner, required).await? {
            let available = self.ctx.ledger.balance(owner).await?;
            warn!(owner, kind = %kind, required, available, "Insufficient credits at debit");
            return Err(AppError::InsufficientCredits { required, available });
        }

        let job = match self.ctx.store.create_job(new_job).await {
            Ok(job) => job,
            Err(e) => {
                error!(owner, error = %e, "Job creation failed after debit; returning credits");
                if let Err(refund_err) = self.ctx.ledger.credit(owner, required).await {
                    error!(owner, error = %refund_err, "Compensating credit failed");
                }
                return Err(e);
            }
        };

        info!(
            job_id = %job.id,
            owner,
            kind = %kind,
            credits = required,
            "Job accepted"
        );

        let submitted = SubmittedJob {
            job_id: job.id,
            status: job.status,
            estimated_completion: job.created_at + kind.estimated_duration(),
            parent_image_id: job.parent_image_id,
        };

        if let Err(e) = self.pool.enqueue(JobTask {
            job: job.clone(),
            request: adapter_request,
        }) {
            self.ctx
                .fail(&job, JobStatus::Processing, e.to_string())
                .await;
            return Err(e);
        }

        Ok(submitted)
    }

    /// Build the job record and adapter request. For retouch, checks that
    /// the source image exists and belongs to `owner`.
    async fn prepare(
        &self,
        owner: &str,
        validated: ValidatedRequest,
        required: u32,
    ) -> Result<(NewJob, AdapterRequest)> {
        match validated {
            ValidatedRequest::Generation(params) => {
                let new_job = NewJob {
                    owner: owner.to_string(),
                    kind: JobKind::Generation,
                    name: format!("ProfilePerfect Headshots - {}", params.style_preset),
                    input_refs: params.reference_images.clone(),
                    parent_image_id: None,
                    credits_charged: required,
                };
                Ok((new_job, AdapterRequest::Generation(params)))
            }
            ValidatedRequest::Retouch(params) => {
                let source = self.owned_asset(owner, params.source_image_id).await?;
                let new_job = NewJob {
                    owner: owner.to_string(),
                    kind: JobKind::Retouch,
                    name: format!("ProfilePerfect Retouch - {}", params.edit_type.as_str()),
                    input_refs: vec![source.uri.clone()],
                    parent_image_id: Some(source.id),
                    credits_charged: required,
                };
                Ok((
                    new_job,
                    AdapterRequest::Retouch {
                        source_image: source.uri,
                        params,
                    },
                ))
            }
        }
    }

    /// Look up an asset whose job belongs to `owner`; anything else is
    /// reported as not found.
    async fn owned_asset(&self, owner: &str, asset_id: AssetId) -> Result<Asset> {
        let not_found = || AppError::NotFound("Source image".to_string());

        let asset = self
            .ctx
            .store
            .get_asset(asset_id)
            .await?
            .ok_or_else(not_found)?;
        let parent_job = self
            .ctx
            .store
            .get_job(asset.job_id)
            .await?
            .ok_or_else(not_found)?;

        if parent_job.owner != owner {
            warn!(owner, asset_id, "Source image belongs to another user");
            return Err(not_found());
        }
        Ok(asset)
    }

    /// Create a reaper sharing this orchestrator's store, ledger and refund policy
    pub fn reaper(&self, max_in_flight: Duration) -> Arc<JobReaper> {
        Arc::new(JobReaper::new(self.ctx.clone(), max_in_flight))
    }

    pub fn stats(&self) -> QueueStats {
        self.pool.stats()
    }
}
