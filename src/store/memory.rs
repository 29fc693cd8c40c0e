//! In-memory job store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::model::{Asset, AssetId, Job, JobId, JobStatus, NewAsset, NewJob, ASSET_SOURCE};
use crate::store::traits::JobStore;

#[derive(Default)]
struct StoreInner {
    jobs: HashMap<JobId, Job>,
    assets: BTreeMap<AssetId, Asset>,
    next_asset_id: AssetId,
}

/// Job store held in process memory. Every operation takes the lock once,
/// so a status change and its guard check are a single step.
#[derive(Default)]
pub struct InMemoryJobStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first_jobs(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn newest_first_assets(assets: &mut [Asset]) {
    assets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(&self, new_job: NewJob) -> Result<Job> {
        let job = Job::from_new(new_job);
        self.inner.write().jobs.insert(job.id, job.clone());
        debug!(job_id = %job.id, kind = %job.kind, "Job created");
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.inner.read().jobs.get(&id).cloned())
    }

    async fn list_jobs(&self, owner: &str) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .inner
            .read()
            .jobs
            .values()
            .filter(|j| j.owner == owner)
            .cloned()
            .collect();
        newest_first_jobs(&mut jobs);
        Ok(jobs)
    }

    async fn transition_status(
        &self,
        id: JobId,
        from: JobStatus,
        to: JobStatus,
        reason: Option<String>,
    ) -> Result<Job> {
        let mut inner = self.inner.write();
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))?;

        if job.status != from || !from.can_transition(to, job.kind) {
            return Err(AppError::InvalidTransition {
                job_id: id,
                from: job.status,
                to,
            });
        }

        job.status = to;
        job.updated_at = Utc::now();
        if to == JobStatus::Failed {
            job.error = reason;
        }
        debug!(job_id = %id, from = %from, to = %to, "Job status changed");
        Ok(job.clone())
    }

    async fn complete_job(
        &self,
        id: JobId,
        from: JobStatus,
        assets: Vec<NewAsset>,
    ) -> Result<(Job, Vec<Asset>)> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))?;

        if job.status != from || !from.can_transition(JobStatus::Completed, job.kind) {
            return Err(AppError::InvalidTransition {
                job_id: id,
                from: job.status,
                to: JobStatus::Completed,
            });
        }

        let now = Utc::now();
        let mut stored = Vec::with_capacity(assets.len());
        for new_asset in assets {
            inner.next_asset_id += 1;
            let asset = Asset {
                id: inner.next_asset_id,
                job_id: id,
                uri: new_asset.uri,
                parent_image_id: new_asset.parent_image_id,
                favorited: false,
                style_preset: new_asset.style_preset,
                background_preset: new_asset.background_preset,
                source: ASSET_SOURCE.to_string(),
                created_at: now,
            };
            inner.assets.insert(asset.id, asset.clone());
            stored.push(asset);
        }

        job.status = JobStatus::Completed;
        job.updated_at = now;
        debug!(job_id = %id, from = %from, assets = stored.len(), "Job completed with assets");
        Ok((job.clone(), stored))
    }

    async fn list_assets(&self, job_id: JobId) -> Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = self
            .inner
            .read()
            .assets
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        newest_first_assets(&mut assets);
        Ok(assets)
    }

    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>> {
        Ok(self.inner.read().assets.get(&id).cloned())
    }

    async fn set_favorited(&self, id: AssetId, favorited: bool) -> Result<Option<Asset>> {
        let mut inner = self.inner.write();
        Ok(inner.assets.get_mut(&id).map(|asset| {
            asset.favorited = favorited;
            asset.clone()
        }))
    }

    async fn stale_jobs(&self, cutoff: DateTime<Utc>) -> Result<Vec<Job>> {
        Ok(self
            .inner
            .read()
            .jobs
            .values()
            .filter(|j| !j.status.is_terminal() && j.updated_at < cutoff)
            .cloned()
            .collect())
    }
}
