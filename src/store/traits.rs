//! Job store interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{Asset, AssetId, Job, JobId, JobStatus, NewAsset, NewJob};

/// Durable record of jobs and the assets they own
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job in `processing`
    async fn create_job(&self, new_job: NewJob) -> Result<Job>;

    async fn get_job(&self, id: JobId) -> Result<Option<Job>>;

    /// Jobs owned by `owner`, newest first
    async fn list_jobs(&self, owner: &str) -> Result<Vec<Job>>;

    /// Compare-and-set status change.
    ///
    /// Fails with `InvalidTransition` when the job is not currently in
    /// `from` or when `from -> to` is not an edge of the state machine.
    /// `reason` is recorded as the job error when moving to `failed`.
    async fn transition_status(
        &self,
        id: JobId,
        from: JobStatus,
        to: JobStatus,
        reason: Option<String>,
    ) -> Result<Job>;

    /// Attach produced images and move the job from `from` to `completed`
    /// as one step. Fails with `InvalidTransition`, storing nothing, when
    /// the job has left `from` (for example, failed by the reaper).
    async fn complete_job(
        &self,
        id: JobId,
        from: JobStatus,
        assets: Vec<NewAsset>,
    ) -> Result<(Job, Vec<Asset>)>;

    /// Assets of a job, newest first
    async fn list_assets(&self, job_id: JobId) -> Result<Vec<Asset>>;

    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>>;

    async fn set_favorited(&self, id: AssetId, favorited: bool) -> Result<Option<Asset>>;

    /// Non-terminal jobs last updated before `cutoff`
    async fn stale_jobs(&self, cutoff: DateTime<Utc>) -> Result<Vec<Job>>;
}
