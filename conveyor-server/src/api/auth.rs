//! API key check for the `/api` routes

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::api::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests without a configured `X-API-Key`; a no-op when no keys are set
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.api_keys.is_empty() {
        let key = extract_api_key(req.headers()).ok_or(ApiError::Unauthorized)?;
        if !state.api_keys.iter().any(|k| k == key) {
            tracing::warn!("Rejected request to {} with unknown API key", req.uri().path());
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(req).await)
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    let key = headers.get(API_KEY_HEADER)?.to_str().ok()?.trim();
    if key.is_empty() { None } else { Some(key) }
}
