use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::routing::router::routing_router;

use super::common::*;

#[tokio::test]
async fn process_route_returns_the_updated_candidate() {
    let router = routing_router(build_orchestrator());

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/routing/candidates")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&candidate("http")).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.pointer("/result/success"),
        Some(&json!(true))
    );
    assert_eq!(
        payload.pointer("/candidate/status"),
        Some(&json!("needs_review"))
    );
}

#[tokio::test]
async fn process_route_flags_invalid_candidates() {
    let router = routing_router(build_orchestrator());

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/routing/candidates")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&invalid_candidate("http-bad")).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload.pointer("/result/success"), Some(&json!(false)));
    // The record comes back exactly as submitted.
    assert_eq!(
        payload.pointer("/candidate/status"),
        Some(&json!("analysis_complete"))
    );
}

#[tokio::test]
async fn batch_route_reports_per_item_results_in_order() {
    let router = routing_router(build_orchestrator());
    let body = json!({
        "candidates": [candidate("batch-1"), risky_candidate("batch-2")],
        "parallel": true,
    });

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/routing/batches")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.pointer("/batch/total"), Some(&json!(2)));
    assert_eq!(
        payload.pointer("/batch/results/0/candidate_id"),
        Some(&json!("cand-batch-1"))
    );
    assert_eq!(
        payload.pointer("/candidates/1/status"),
        Some(&json!("high_risk"))
    );
}

#[tokio::test]
async fn manual_transition_route_rejects_illegal_moves() {
    let router = routing_router(build_orchestrator());
    let mut subject = candidate("manual-http");
    subject.status = crate::workflows::routing::domain::CandidateStatus::NeedsReview;
    let body = json!({
        "candidate": subject,
        "new_status": "published",
        "reason": "skipping review",
        "operator_id": "op-1",
    });

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/routing/transitions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn manual_transition_route_applies_legal_moves() {
    let router = routing_router(build_orchestrator());
    let mut subject = candidate("manual-ok");
    subject.status = crate::workflows::routing::domain::CandidateStatus::NeedsReview;
    let body = json!({
        "candidate": subject,
        "new_status": "approved",
        "reason": "verified disclosure",
        "operator_id": "op-1",
    });

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/routing/transitions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.pointer("/candidate/status"),
        Some(&json!("approved"))
    );
    assert_eq!(payload.pointer("/transition/manual"), Some(&json!(true)));
}

#[tokio::test]
async fn audit_route_rejects_unknown_filters() {
    let router = routing_router(build_orchestrator());

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/routing/audit?category=telemetry")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn audit_export_route_serves_csv() {
    let orchestrator = build_orchestrator();
    orchestrator.process_one(&mut candidate("export"));
    let router = routing_router(orchestrator);

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/routing/audit/export?format=csv")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/csv")
    );
}

#[tokio::test]
async fn stats_route_reflects_processed_candidates() {
    let orchestrator = build_orchestrator();
    orchestrator.process_one(&mut candidate("stats"));
    let router = routing_router(orchestrator);

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/routing/stats")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("total_processed"), Some(&json!(1)));
    assert_eq!(payload.get("successful"), Some(&json!(1)));
}
