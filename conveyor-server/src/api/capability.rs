//! Capability API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use conveyor_core::domain::capability::CapabilityInfo;
use conveyor_core::dto::capability::{CapabilityOutput, ExecuteCapability};

use super::AppState;
use crate::api::error::ApiResult;

/// GET /api/capabilities
pub async fn list_capabilities(State(state): State<AppState>) -> Json<Vec<CapabilityInfo>> {
    Json(state.engine.capabilities())
}

/// POST /api/capabilities/{name}/execute
/// Invoke a capability directly, without creating a job
pub async fn execute_capability(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ExecuteCapability>,
) -> ApiResult<Json<CapabilityOutput>> {
    tracing::info!("Executing capability {} with {} args", name, req.args.len());

    let result = state.engine.execute_capability(&name, req.args).await?;
    Ok(Json(CapabilityOutput { name, result }))
}
