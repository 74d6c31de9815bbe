use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;

use super::audit::{AuditCategory, AuditLevel, AuditLog, AuditStore, AuditStoreError};
use super::domain::{Candidate, CandidateId, ValidationError};
use super::filter::{FilterAction, FilterRuleEngine};
use super::priority::{PriorityScore, PriorityScorer};
use super::state::{InvalidTransitionError, StateMachine, StateTransition};

/// Execution knobs for batch routing.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub max_concurrency: usize,
    pub item_timeout: Duration,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            item_timeout: Duration::from_secs(120),
        }
    }
}

/// Failure taxonomy for a single candidate pass. Everything here is recovered
/// into a failed `WorkflowResult`; nothing escapes the orchestrator surface.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),
    #[error(transparent)]
    AuditStore(#[from] AuditStoreError),
    #[error("candidate processing timed out after {0:?}")]
    Timeout(Duration),
    #[error("candidate task aborted: {0}")]
    TaskAborted(String),
}

/// Outcome of routing one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub candidate_id: CandidateId,
    pub success: bool,
    pub actions: Vec<FilterAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<StateTransition>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Timing for one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub duration_ms: u64,
    pub parallel: bool,
}

/// Outcome of a batch run; `results` always lines up with the input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchWorkflowResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<WorkflowResult>,
    pub stats: BatchStats,
}

#[derive(Debug, Default)]
struct StatsInner {
    total_processed: u64,
    successful: u64,
    failed: u64,
    total_duration_ms: u64,
}

/// Running counters across every candidate the orchestrator has seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStats {
    pub total_processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub average_duration_ms: f64,
}

/// Composes the filter engine, scorer, and state machine per candidate and
/// for batches. The only component permitted to mutate candidate status and
/// history; human-originated moves go through `apply_manual_transition`.
pub struct WorkflowOrchestrator<S> {
    engine: FilterRuleEngine,
    scorer: PriorityScorer,
    state_machine: StateMachine,
    audit: Arc<AuditLog<S>>,
    config: RoutingConfig,
    stats: Mutex<StatsInner>,
}

impl<S: AuditStore + 'static> WorkflowOrchestrator<S> {
    pub fn new(
        engine: FilterRuleEngine,
        scorer: PriorityScorer,
        state_machine: StateMachine,
        audit: Arc<AuditLog<S>>,
        config: RoutingConfig,
    ) -> Self {
        Self {
            engine,
            scorer,
            state_machine,
            audit,
            config,
            stats: Mutex::new(StatsInner::default()),
        }
    }

    pub fn audit(&self) -> &Arc<AuditLog<S>> {
        &self.audit
    }

    /// Route one candidate synchronously.
    ///
    /// On success the candidate's status and history are updated in place; on
    /// failure the record is left exactly as it came in.
    pub fn process_one(&self, candidate: &mut Candidate) -> WorkflowResult {
        let started = Instant::now();
        let candidate_id = candidate.id.clone();

        match self.run_stages(candidate) {
            Ok((actions, priority, transition)) => {
                let duration_ms = elapsed_ms(started);
                self.record(true, duration_ms);
                WorkflowResult {
                    candidate_id,
                    success: true,
                    actions,
                    priority: Some(priority),
                    transition: Some(transition),
                    duration_ms,
                    error: None,
                }
            }
            Err(error) => {
                let duration_ms = elapsed_ms(started);
                self.record(false, duration_ms);
                self.audit.log(
                    AuditCategory::Error,
                    AuditLevel::Error,
                    Some(&candidate_id),
                    format!("candidate processing failed: {error}"),
                    BTreeMap::new(),
                );
                failed_result(candidate_id, &error, duration_ms)
            }
        }
    }

    fn run_stages(
        &self,
        candidate: &mut Candidate,
    ) -> Result<(Vec<FilterAction>, PriorityScore, StateTransition), WorkflowError> {
        candidate.validate()?;

        let outcome = self.engine.process(candidate);
        for warning in &outcome.warnings {
            let mut metadata = BTreeMap::new();
            metadata.insert("rule".to_string(), warning.rule.clone());
            self.audit.log(
                AuditCategory::Filter,
                AuditLevel::Warning,
                Some(&candidate.id),
                format!("rule '{}' skipped: {}", warning.rule, warning.error),
                metadata,
            );
        }

        let now = Utc::now();
        let priority = self.scorer.score(candidate, now);
        self.audit.log(
            AuditCategory::Priority,
            AuditLevel::Debug,
            Some(&candidate.id),
            format!(
                "priority {:.2} ({}), estimated {} minutes",
                priority.total,
                priority.level.label(),
                priority.estimated_minutes
            ),
            BTreeMap::new(),
        );

        let transition = self
            .state_machine
            .route(candidate, &outcome.actions, &priority, now);
        if transition.metadata.contains_key("rejected_target") {
            self.audit.log(
                AuditCategory::State,
                AuditLevel::Error,
                Some(&candidate.id),
                transition.reason.clone(),
                transition.metadata.clone(),
            );
        }

        candidate.apply_transition(&transition);

        let mut metadata = BTreeMap::new();
        metadata.insert("from".to_string(), transition.from.label().to_string());
        metadata.insert("to".to_string(), transition.to.label().to_string());
        metadata.insert(
            "priority_level".to_string(),
            priority.level.label().to_string(),
        );
        self.audit.log(
            AuditCategory::Workflow,
            AuditLevel::Info,
            Some(&candidate.id),
            format!("candidate routed {} -> {}", transition.from, transition.to),
            metadata,
        );

        Ok((outcome.actions, priority, transition))
    }

    /// Route a batch, returning the updated candidates alongside per-item
    /// results in submission order.
    pub async fn process_batch(
        self: &Arc<Self>,
        candidates: Vec<Candidate>,
        parallel: bool,
    ) -> (Vec<Candidate>, BatchWorkflowResult) {
        let started = Instant::now();
        let total = candidates.len();

        let (updated, results) = if parallel {
            self.process_parallel(candidates).await
        } else {
            let mut updated = Vec::with_capacity(total);
            let mut results = Vec::with_capacity(total);
            for mut candidate in candidates {
                results.push(self.process_one(&mut candidate));
                updated.push(candidate);
            }
            (updated, results)
        };

        let successful = results.iter().filter(|result| result.success).count();
        let failed = total - successful;
        let duration_ms = elapsed_ms(started);

        let mut metadata = BTreeMap::new();
        metadata.insert("successful".to_string(), successful.to_string());
        metadata.insert("failed".to_string(), failed.to_string());
        metadata.insert("parallel".to_string(), parallel.to_string());
        self.audit.log(
            AuditCategory::Performance,
            AuditLevel::Info,
            None,
            format!("batch of {total} candidates processed in {duration_ms}ms"),
            metadata,
        );

        (
            updated,
            BatchWorkflowResult {
                total,
                successful,
                failed,
                results,
                stats: BatchStats {
                    duration_ms,
                    parallel,
                },
            },
        )
    }

    /// Bounded fan-out. Tasks are spawned in input order and awaited in that
    /// same order, so the output matches the input even though execution
    /// interleaves; a timed-out or panicked item fails alone.
    async fn process_parallel(
        self: &Arc<Self>,
        candidates: Vec<Candidate>,
    ) -> (Vec<Candidate>, Vec<WorkflowResult>) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let item_timeout = self.config.item_timeout;

        let mut originals = Vec::with_capacity(candidates.len());
        let mut handles = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            originals.push(candidate.clone());
            let worker = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                tokio::time::timeout(item_timeout, async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                    let mut candidate = candidate;
                    let result = worker.process_one(&mut candidate);
                    (candidate, result)
                })
                .await
            }));
        }

        let mut updated = Vec::with_capacity(originals.len());
        let mut results = Vec::with_capacity(originals.len());
        for (original, handle) in originals.into_iter().zip(handles) {
            match handle.await {
                Ok(Ok((candidate, result))) => {
                    updated.push(candidate);
                    results.push(result);
                }
                Ok(Err(_elapsed)) => {
                    let error = WorkflowError::Timeout(item_timeout);
                    results.push(self.isolate_failure(
                        &original.id,
                        error,
                        item_timeout.as_millis() as u64,
                    ));
                    updated.push(original);
                }
                Err(join_error) => {
                    let error = WorkflowError::TaskAborted(join_error.to_string());
                    results.push(self.isolate_failure(&original.id, error, 0));
                    updated.push(original);
                }
            }
        }

        (updated, results)
    }

    fn isolate_failure(
        &self,
        candidate_id: &CandidateId,
        error: WorkflowError,
        duration_ms: u64,
    ) -> WorkflowResult {
        self.record(false, duration_ms);
        self.audit.log(
            AuditCategory::Error,
            AuditLevel::Error,
            Some(candidate_id),
            format!("candidate processing failed: {error}"),
            BTreeMap::new(),
        );
        failed_result(candidate_id.clone(), &error, duration_ms)
    }

    /// Apply a human-requested transition. The one mutation path offered to
    /// collaborators outside the automated pass; an unreachable or unknown
    /// target is an error, never a silent move.
    pub fn apply_manual_transition(
        &self,
        candidate: &mut Candidate,
        new_status: &str,
        reason: &str,
        operator_id: &str,
    ) -> Result<StateTransition, WorkflowError> {
        let transition = self.state_machine.manual_transition(
            candidate,
            new_status,
            reason,
            operator_id,
            Utc::now(),
        )?;
        candidate.apply_transition(&transition);

        let mut metadata = BTreeMap::new();
        metadata.insert("from".to_string(), transition.from.label().to_string());
        metadata.insert("to".to_string(), transition.to.label().to_string());
        metadata.insert("operator".to_string(), operator_id.to_string());
        self.audit.log(
            AuditCategory::State,
            AuditLevel::Info,
            Some(&candidate.id),
            format!(
                "manual transition {} -> {} by {operator_id}",
                transition.from, transition.to
            ),
            metadata,
        );

        Ok(transition)
    }

    pub fn stats(&self) -> WorkflowStats {
        let inner = self.stats.lock().expect("stats mutex poisoned");
        let average_duration_ms = if inner.total_processed == 0 {
            0.0
        } else {
            inner.total_duration_ms as f64 / inner.total_processed as f64
        };
        WorkflowStats {
            total_processed: inner.total_processed,
            successful: inner.successful,
            failed: inner.failed,
            average_duration_ms,
        }
    }

    fn record(&self, success: bool, duration_ms: u64) {
        let mut inner = self.stats.lock().expect("stats mutex poisoned");
        inner.total_processed += 1;
        if success {
            inner.successful += 1;
        } else {
            inner.failed += 1;
        }
        inner.total_duration_ms += duration_ms;
    }
}

fn failed_result(
    candidate_id: CandidateId,
    error: &WorkflowError,
    duration_ms: u64,
) -> WorkflowResult {
    WorkflowResult {
        candidate_id,
        success: false,
        actions: Vec::new(),
        priority: None,
        transition: None,
        duration_ms,
        error: Some(error.to_string()),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
