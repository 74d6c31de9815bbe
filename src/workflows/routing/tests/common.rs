use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::routing::audit::{AuditLog, InMemoryAuditStore};
use crate::workflows::routing::domain::{AnalysisScores, Candidate, CandidateId, CandidateStatus};
use crate::workflows::routing::filter::FilterRuleEngine;
use crate::workflows::routing::orchestrator::{RoutingConfig, WorkflowOrchestrator};
use crate::workflows::routing::priority::PriorityScorer;
use crate::workflows::routing::state::StateMachine;

pub(super) fn candidate(suffix: &str) -> Candidate {
    Candidate {
        id: CandidateId(format!("cand-{suffix}")),
        title: "Hands-on with the Meridian trail camera".to_string(),
        status: CandidateStatus::AnalysisComplete,
        scores: AnalysisScores {
            sentiment: 0.9,
            endorsement: 0.85,
            credibility: 0.9,
            total: 88.0,
        },
        risk_confidence: 0.1,
        monetizable: true,
        created_at: Utc::now(),
        observed_at: Some(Utc::now().to_rfc3339()),
        workflow_history: Vec::new(),
    }
}

pub(super) fn risky_candidate(suffix: &str) -> Candidate {
    let mut candidate = candidate(suffix);
    candidate.risk_confidence = 0.8;
    candidate
}

pub(super) fn non_monetizable_candidate(suffix: &str) -> Candidate {
    let mut candidate = candidate(suffix);
    candidate.monetizable = false;
    candidate.scores.total = 70.0;
    candidate
}

pub(super) fn weak_candidate(suffix: &str) -> Candidate {
    let mut candidate = candidate(suffix);
    candidate.scores.total = 35.0;
    candidate
}

pub(super) fn invalid_candidate(suffix: &str) -> Candidate {
    let mut candidate = candidate(suffix);
    candidate.scores.sentiment = 1.5;
    candidate
}

pub(super) fn build_orchestrator() -> Arc<WorkflowOrchestrator<InMemoryAuditStore>> {
    orchestrator_with_config(RoutingConfig::default())
}

pub(super) fn orchestrator_with_config(
    config: RoutingConfig,
) -> Arc<WorkflowOrchestrator<InMemoryAuditStore>> {
    let audit = Arc::new(AuditLog::new(InMemoryAuditStore::default()));
    Arc::new(WorkflowOrchestrator::new(
        FilterRuleEngine::with_default_rules(),
        PriorityScorer::default(),
        StateMachine::default(),
        audit,
        config,
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
