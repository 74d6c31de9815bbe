//! Candidate routing: filter rules, review priority, lifecycle transitions,
//! and the audit trail recorded for every decision.
//!
//! The orchestrator composes the pure pieces (rule engine, scorer, state
//! machine) per candidate and for bounded-concurrency batches. Candidates are
//! owned by the host datastore; this module only mutates their status and
//! workflow history, and only through the orchestrator.

pub mod audit;
pub mod domain;
pub mod filter;
pub mod orchestrator;
pub mod priority;
pub mod router;
pub mod state;

#[cfg(test)]
mod tests;

pub use audit::{
    AuditCategory, AuditExportFormat, AuditLevel, AuditLog, AuditLogEntry, AuditQuery,
    AuditStatistics, AuditStore, AuditStoreError, InMemoryAuditStore,
};
pub use domain::{
    AnalysisScores, Candidate, CandidateId, CandidateStatus, HistoryEntry, ValidationError,
};
pub use filter::{
    default_rule_set, FilterAction, FilterOutcome, FilterResult, FilterRule, FilterRuleEngine,
    RuleCondition, RulePriority,
};
pub use orchestrator::{
    BatchWorkflowResult, RoutingConfig, WorkflowError, WorkflowOrchestrator, WorkflowResult,
    WorkflowStats,
};
pub use priority::{PriorityLevel, PriorityScore, PriorityScorer, ScoringWeights};
pub use router::routing_router;
pub use state::{allowed_transitions, InvalidTransitionError, StateMachine, StateTransition};
