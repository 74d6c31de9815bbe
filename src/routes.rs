use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use curation_ai::workflows::routing::{routing_router, AuditStore, WorkflowOrchestrator};

use crate::infra::AppState;

pub(crate) fn with_routing_routes<S>(orchestrator: Arc<WorkflowOrchestrator<S>>) -> axum::Router
where
    S: AuditStore + 'static,
{
    routing_router(orchestrator)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        (StatusCode::OK, Json(json!({ "ready": true })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "ready": false })))
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> String {
    state.metrics.render()
}
