//! API Module
//!
//! HTTP API layer over the engine.
//! Each submodule handles endpoints for a specific domain.

pub mod auth;
pub mod capability;
pub mod error;
pub mod health;
pub mod job;
pub mod pipeline;
pub mod stats;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use conveyor_engine::Engine;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub api_keys: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, api_keys: Vec<String>) -> Self {
        Self {
            engine,
            api_keys: Arc::new(api_keys),
        }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Job endpoints
        .route("/jobs", post(job::create_job).get(job::list_jobs))
        .route("/jobs/{id}", get(job::get_job).put(job::update_job))
        // Pipeline endpoints
        .route(
            "/pipelines",
            post(pipeline::create_pipeline).get(pipeline::list_pipelines),
        )
        .route(
            "/pipelines/{id}",
            get(pipeline::get_pipeline)
                .put(pipeline::update_pipeline)
                .delete(pipeline::delete_pipeline),
        )
        .route("/pipelines/{id}/run", post(pipeline::run_pipeline))
        .route("/pipelines/{id}/context", get(pipeline::get_pipeline_context))
        // Capability endpoints
        .route("/capabilities", get(capability::list_capabilities))
        .route(
            "/capabilities/{name}/execute",
            post(capability::execute_capability),
        )
        .route("/stats", get(stats::get_stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use conveyor_engine::EngineConfig;
    use conveyor_engine::capability::{CapabilityRegistry, EchoCapability};
    use conveyor_engine::store::MemoryStore;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn app_with_keys(keys: &[&str]) -> (Router, Arc<Engine>) {
        let mut registry = CapabilityRegistry::new();
        registry.register(EchoCapability).unwrap();
        let engine = Arc::new(
            Engine::start(EngineConfig::default(), Arc::new(MemoryStore::new()), registry)
                .await
                .unwrap(),
        );
        let keys = keys.iter().map(|k| k.to_string()).collect();
        let router = create_router(AppState::new(Arc::clone(&engine), keys));
        (router, engine)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, engine) = app_with_keys(&["secret"]).await;
        let response = app.clone().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let (app, engine) = app_with_keys(&["secret"]).await;

        let (status, body) = send(&app, get_request("/api/jobs")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let wrong = Request::builder()
            .uri("/api/jobs")
            .header("X-API-Key", "guess")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

        let right = Request::builder()
            .uri("/api/jobs")
            .header("X-API-Key", "secret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, right).await.0, StatusCode::OK);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_job_endpoints() {
        let (app, engine) = app_with_keys(&[]).await;

        let (status, created) = send(
            &app,
            json_request(
                Method::POST,
                "/api/jobs",
                json!({"id": "j1", "command": "echo", "args": ["hi"], "max_retries": 0}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], "j1");
        assert_eq!(created["max_retries"], 0);

        let (status, fetched) = send(&app, get_request("/api/jobs/j1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["command"], "echo");

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/api/jobs", json!({"id": "j1", "command": "true"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, get_request("/api/jobs/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));

        let (status, _) = send(&app, json_request(Method::PUT, "/api/jobs/other", fetched)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_pipeline_endpoints() {
        let (app, engine) = app_with_keys(&[]).await;

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/pipelines",
                json!({"name": "nightly", "job_ids": ["nope"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(
            &app,
            json_request(Method::POST, "/api/jobs", json!({"id": "step", "command": "true"})),
        )
        .await;
        let (status, created) = send(
            &app,
            json_request(
                Method::POST,
                "/api/pipelines",
                json!({
                    "id": "p1",
                    "name": "nightly",
                    "job_ids": ["step"],
                    "scheduled_at": "2999-01-01T00:00:00Z"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "Pending");

        let (status, renamed) = send(
            &app,
            json_request(Method::PUT, "/api/pipelines/p1", json!({"name": "hourly"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["name"], "hourly");

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/api/pipelines/p1/run", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, _) = send(&app, get_request("/api/pipelines/p1/context")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, get_request("/api/pipelines/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(
            &app,
            json_request(
                Method::POST,
                "/api/pipelines",
                json!({"id": "p2", "name": "spare", "job_ids": ["step"], "scheduled_at": "2999-01-01T00:00:00Z"}),
            ),
        )
        .await;
        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/api/pipelines/p2")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, get_request("/api/pipelines/p2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_capability_endpoints() {
        let (app, engine) = app_with_keys(&[]).await;

        let (status, list) = send(&app, get_request("/api/capabilities")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["name"], "echo");

        let (status, output) = send(
            &app,
            json_request(
                Method::POST,
                "/api/capabilities/echo/execute",
                json!({"args": {"greeting": "hello"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(output["result"], json!({"greeting": "hello"}));

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/api/capabilities/ghost/execute", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, stats) = send(&app, get_request("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["jobs"]["pending"], 0);
        engine.shutdown().await;
    }
}
