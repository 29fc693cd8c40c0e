//! Request handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::auth::Identity;
use crate::model::{AssetId, GenerationRequest, JobId, JobRequest, RetouchRequest};
use crate::AppState;

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(format!("Invalid request body: {}", rejection.body_text())))
}

/// POST /api/generate
pub async fn submit_generation(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = JobRequest::Generation(body(payload)?);
    let submitted = state.orchestrator.submit(identity.user_id(), request).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// POST /api/retouch
pub async fn submit_retouch(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RetouchRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = JobRequest::Retouch(body(payload)?);
    let submitted = state.orchestrator.submit(identity.user_id(), request).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}

fn parse_job_id(raw: Option<&str>) -> Result<JobId> {
    let raw = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Job ID is required".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid job ID '{}'", raw)))
}

/// GET /api/jobs/status?jobId=, also served on GET /api/generate and /api/retouch
pub async fn job_status(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse> {
    let job_id = parse_job_id(query.job_id.as_deref())?;
    let job = state.status.get_status(job_id, identity.user_id()).await?;
    Ok(Json(json!({ "success": true, "job": job })))
}

/// GET /api/jobs
pub async fn list_jobs(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let jobs = state.status.list_jobs(identity.user_id()).await?;
    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub favorited: bool,
}

/// PUT /api/images/:id/favorite
pub async fn set_favorite(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    id: std::result::Result<Path<AssetId>, PathRejection>,
    payload: std::result::Result<Json<FavoriteRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(asset_id) =
        id.map_err(|_| AppError::Validation("Image ID must be a number".to_string()))?;
    let request = body(payload)?;

    let image = state
        .status
        .set_favorite(asset_id, identity.user_id(), request.favorited)
        .await?;
    Ok(Json(json!({ "success": true, "image": image })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadRequest {
    pub filename: Option<String>,
    pub file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub pathname: String,
}

/// POST /api/upload
pub async fn upload(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<UploadRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = body(payload)?;
    let (Some(filename), Some(file)) = (
        request.filename.filter(|f| !f.trim().is_empty()),
        request.file.filter(|f| !f.trim().is_empty()),
    ) else {
        return Err(AppError::Validation("Missing filename or file".to_string()));
    };

    let url = state.storage.put_base64(&file, &filename).await?;
    let pathname = url.rsplit('/').next().unwrap_or_default().to_string();
    info!(owner = %identity.user_id(), url = %url, "Stored upload");

    Ok(Json(UploadResponse { url, pathname }))
}

/// GET /api/credits
pub async fn credits(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let account = state.ledger.account(identity.user_id()).await?;
    Ok(Json(account))
}

/// GET /api/queue/stats
pub async fn queue_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.stats())
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let adapter_healthy = state.adapter.health_check().await;
    Json(json!({
        "ok": true,
        "adapter": state.adapter.name(),
        "adapterHealthy": adapter_healthy,
        "queue": state.orchestrator.stats(),
    }))
}
