use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::audit::{AuditExportFormat, AuditQuery, AuditStore, UnknownAuditFilter};
use super::domain::{Candidate, CandidateId};
use super::orchestrator::{WorkflowError, WorkflowOrchestrator};

/// Router builder exposing HTTP endpoints for candidate routing and the
/// audit trail.
pub fn routing_router<S>(orchestrator: Arc<WorkflowOrchestrator<S>>) -> Router
where
    S: AuditStore + 'static,
{
    Router::new()
        .route("/api/v1/routing/candidates", post(process_handler::<S>))
        .route("/api/v1/routing/batches", post(batch_handler::<S>))
        .route(
            "/api/v1/routing/transitions",
            post(manual_transition_handler::<S>),
        )
        .route("/api/v1/routing/audit", get(audit_entries_handler::<S>))
        .route(
            "/api/v1/routing/audit/statistics",
            get(audit_statistics_handler::<S>),
        )
        .route(
            "/api/v1/routing/audit/export",
            get(audit_export_handler::<S>),
        )
        .route("/api/v1/routing/stats", get(stats_handler::<S>))
        .with_state(orchestrator)
}

pub(crate) async fn process_handler<S>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<S>>>,
    axum::Json(mut candidate): axum::Json<Candidate>,
) -> Response
where
    S: AuditStore + 'static,
{
    let result = orchestrator.process_one(&mut candidate);
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (
        status,
        axum::Json(json!({ "candidate": candidate, "result": result })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchRequest {
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default = "default_parallel")]
    pub(crate) parallel: bool,
}

fn default_parallel() -> bool {
    true
}

pub(crate) async fn batch_handler<S>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<S>>>,
    axum::Json(request): axum::Json<BatchRequest>,
) -> Response
where
    S: AuditStore + 'static,
{
    let (candidates, batch) = orchestrator
        .process_batch(request.candidates, request.parallel)
        .await;
    (
        StatusCode::OK,
        axum::Json(json!({ "candidates": candidates, "batch": batch })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualTransitionRequest {
    pub(crate) candidate: Candidate,
    pub(crate) new_status: String,
    pub(crate) reason: String,
    pub(crate) operator_id: String,
}

pub(crate) async fn manual_transition_handler<S>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<S>>>,
    axum::Json(mut request): axum::Json<ManualTransitionRequest>,
) -> Response
where
    S: AuditStore + 'static,
{
    match orchestrator.apply_manual_transition(
        &mut request.candidate,
        &request.new_status,
        &request.reason,
        &request.operator_id,
    ) {
        Ok(transition) => (
            StatusCode::OK,
            axum::Json(json!({ "candidate": request.candidate, "transition": transition })),
        )
            .into_response(),
        Err(error @ WorkflowError::InvalidTransition(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        Err(other) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": other.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AuditEntriesParams {
    pub(crate) candidate_id: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) level: Option<String>,
    pub(crate) limit: Option<usize>,
    pub(crate) format: Option<String>,
}

impl AuditEntriesParams {
    fn to_query(&self) -> Result<AuditQuery, UnknownAuditFilter> {
        Ok(AuditQuery {
            candidate_id: self.candidate_id.clone().map(CandidateId),
            category: self.category.as_deref().map(str::parse).transpose()?,
            level: self.level.as_deref().map(str::parse).transpose()?,
            start: None,
            end: None,
            limit: self.limit,
        })
    }
}

pub(crate) async fn audit_entries_handler<S>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<S>>>,
    Query(params): Query<AuditEntriesParams>,
) -> Response
where
    S: AuditStore + 'static,
{
    let query = match params.to_query() {
        Ok(query) => query,
        Err(error) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                axum::Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    };

    match orchestrator.audit().entries(&query) {
        Ok(entries) => (StatusCode::OK, axum::Json(json!({ "entries": entries }))).into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn audit_statistics_handler<S>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<S>>>,
) -> Response
where
    S: AuditStore + 'static,
{
    match orchestrator.audit().statistics(None, None) {
        Ok(statistics) => (StatusCode::OK, axum::Json(statistics)).into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn audit_export_handler<S>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<S>>>,
    Query(params): Query<AuditEntriesParams>,
) -> Response
where
    S: AuditStore + 'static,
{
    let format = match params
        .format
        .as_deref()
        .unwrap_or("json")
        .parse::<AuditExportFormat>()
    {
        Ok(format) => format,
        Err(error) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                axum::Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    };
    let query = match params.to_query() {
        Ok(query) => query,
        Err(error) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                axum::Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    };

    match orchestrator.audit().export(format, &query) {
        Ok(body) => {
            let content_type = match format {
                AuditExportFormat::Json => "application/json",
                AuditExportFormat::Csv => "text/csv",
            };
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                body,
            )
                .into_response()
        }
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn stats_handler<S>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<S>>>,
) -> Response
where
    S: AuditStore + 'static,
{
    (StatusCode::OK, axum::Json(orchestrator.stats())).into_response()
}
