//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use conveyor_core::domain::pipeline::Pipeline;
use conveyor_core::dto::pipeline::{CreatePipeline, UpdatePipeline};

use super::AppState;
use crate::api::error::ApiResult;

/// POST /api/pipelines
pub async fn create_pipeline(
    State(state): State<AppState>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    tracing::info!("Creating pipeline: {} ({} jobs)", req.name, req.job_ids.len());

    let pipeline = state.engine.pipelines().create_pipeline(req).await?;
    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /api/pipelines
pub async fn list_pipelines(State(state): State<AppState>) -> Json<Vec<Pipeline>> {
    tracing::debug!("Listing all pipelines");
    Json(state.engine.pipelines().list_pipelines().await)
}

/// GET /api/pipelines/{id}
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Pipeline>> {
    tracing::debug!("Getting pipeline: {}", id);
    Ok(Json(state.engine.pipelines().get_pipeline(&id).await?))
}

/// PUT /api/pipelines/{id}
pub async fn update_pipeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating pipeline: {}", id);
    Ok(Json(state.engine.pipelines().update_pipeline(&id, req).await?))
}

/// DELETE /api/pipelines/{id}
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);
    state.engine.pipelines().delete_pipeline(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/pipelines/{id}/run
/// Queue the pipeline now instead of waiting for its scheduled time
pub async fn run_pipeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    tracing::info!("Running pipeline: {}", id);

    let pipeline = state.engine.pipelines().run_pipeline(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(pipeline)))
}

/// GET /api/pipelines/{id}/context
pub async fn get_pipeline_context(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HashMap<String, String>>> {
    tracing::debug!("Getting context of pipeline: {}", id);
    Ok(Json(state.engine.pipelines().pipeline_context(&id).await?))
}
