use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use curation_ai::config::RoutingSettings;
use curation_ai::workflows::routing::{
    AuditLog, FilterRuleEngine, InMemoryAuditStore, PriorityScorer, StateMachine,
    WorkflowOrchestrator,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wire the orchestrator with the stock rule set and an in-memory audit
/// store. The host deployment swaps the store for its durable audit table.
pub(crate) fn build_orchestrator(
    settings: &RoutingSettings,
) -> Arc<WorkflowOrchestrator<InMemoryAuditStore>> {
    let audit = Arc::new(AuditLog::new(InMemoryAuditStore::default()));
    Arc::new(WorkflowOrchestrator::new(
        FilterRuleEngine::with_default_rules(),
        PriorityScorer::default(),
        StateMachine::default(),
        audit,
        settings.routing_config(),
    ))
}
