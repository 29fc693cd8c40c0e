//! Read-only job status queries

use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::model::{Asset, AssetId, Job, JobId};
use crate::store::JobStore;

/// A job together with the images it currently owns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    #[serde(flatten)]
    pub job: Job,
    /// Newest first
    pub images: Vec<Asset>,
}

/// Owner-scoped view over the job store
pub struct StatusReporter {
    store: Arc<dyn JobStore>,
}

impl StatusReporter {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Current status and images of a job. Jobs owned by someone else are
    /// indistinguishable from missing ones.
    pub async fn get_status(&self, job_id: JobId, owner: &str) -> Result<JobSnapshot> {
        let job = self.owned_job(job_id, owner).await?;
        let images = self.store.list_assets(job.id).await?;
        Ok(JobSnapshot { job, images })
    }

    /// All jobs of `owner`, newest first
    pub async fn list_jobs(&self, owner: &str) -> Result<Vec<Job>> {
        self.store.list_jobs(owner).await
    }

    /// Mark or unmark one of the owner's images as a favorite
    pub async fn set_favorite(&self, asset_id: AssetId, owner: &str, favorited: bool) -> Result<Asset> {
        let not_found = || AppError::NotFound("Image".to_string());

        let asset = self.store.get_asset(asset_id).await?.ok_or_else(not_found)?;
        self.owned_job(asset.job_id, owner)
            .await
            .map_err(|_| not_found())?;

        self.store
            .set_favorited(asset_id, favorited)
            .await?
            .ok_or_else(not_found)
    }

    async fn owned_job(&self, job_id: JobId, owner: &str) -> Result<Job> {
        match self.store.get_job(job_id).await? {
            Some(job) if job.owner == owner => Ok(job),
            _ => Err(AppError::NotFound("Job".to_string())),
        }
    }
}
