//! Stats API Handler

use axum::{Json, extract::State};
use conveyor_core::dto::stats::EngineStats;

use super::AppState;

/// GET /api/stats
/// Job and pipeline counts per status
pub async fn get_stats(State(state): State<AppState>) -> Json<EngineStats> {
    Json(state.engine.stats().await)
}
