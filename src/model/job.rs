//! Job records and the status state machine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::AssetId;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Generation,
    Retouch,
}

impl JobKind {
    /// Status a job of this kind holds while the adapter is working on it
    pub fn in_flight_status(self) -> JobStatus {
        match self {
            JobKind::Generation => JobStatus::Generating,
            JobKind::Retouch => JobStatus::Retouching,
        }
    }

    /// Completion estimate handed back to the caller at submission
    pub fn estimated_duration(self) -> Duration {
        match self {
            JobKind::Generation => Duration::seconds(120),
            JobKind::Retouch => Duration::seconds(60),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Generation => "generation",
            JobKind::Retouch => "retouch",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Generating,
    Retouching,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether `self -> to` is an edge of the state machine for `kind`.
    ///
    /// `processing -> failed` is allowed so that a job can be failed before
    /// it ever reaches the adapter (queue rejection, reaper).
    pub fn can_transition(self, to: JobStatus, kind: JobKind) -> bool {
        let in_flight = kind.in_flight_status();
        match self {
            JobStatus::Processing => to == in_flight || to == JobStatus::Failed,
            s if s == in_flight => to.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Generating => "generating",
            JobStatus::Retouching => "retouching",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked generation or retouch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub owner: String,
    pub kind: JobKind,
    pub name: String,
    pub status: JobStatus,
    pub input_refs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_image_id: Option<AssetId>,
    pub credits_charged: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the orchestrator when creating a job; the store
/// assigns id, status and timestamps.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner: String,
    pub kind: JobKind,
    pub name: String,
    pub input_refs: Vec<String>,
    pub parent_image_id: Option<AssetId>,
    pub credits_charged: u32,
}

impl Job {
    pub fn from_new(new_job: NewJob) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: new_job.owner,
            kind: new_job.kind,
            name: new_job.name,
            status: JobStatus::Processing,
            input_refs: new_job.input_refs,
            parent_image_id: new_job.parent_image_id,
            credits_charged: new_job.credits_charged,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
