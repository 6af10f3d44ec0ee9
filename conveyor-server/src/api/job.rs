//! Job API Handlers
//!
//! HTTP endpoints for job submission and inspection.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use conveyor_core::domain::job::Job;
use conveyor_core::dto::job::CreateJob;

use super::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /api/jobs
/// Create a job and queue it; blocks while the job queue is full
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJob>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    tracing::info!("Creating job: {}", req.capability.as_deref().unwrap_or(&req.command));

    let job = state.engine.jobs().create_job(req).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    tracing::debug!("Listing all jobs");
    Json(state.engine.jobs().list_jobs().await)
}

/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);
    Ok(Json(state.engine.jobs().get_job(&id).await?))
}

/// PUT /api/jobs/{id}
/// Replace the stored record of a job
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(job): Json<Job>,
) -> ApiResult<Json<Job>> {
    if job.id != id {
        return Err(ApiError::BadRequest(format!(
            "Body ID '{}' does not match path ID '{}'",
            job.id, id
        )));
    }

    tracing::info!("Updating job: {} (status {})", id, job.status);
    state.engine.jobs().update_job(job.clone()).await?;
    Ok(Json(job))
}
