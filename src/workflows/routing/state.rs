use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, CandidateStatus, UnknownStatus};
use super::filter::{FilterAction, FilterResult, FilterRuleEngine};
use super::priority::PriorityScore;

/// A validated move between lifecycle states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: CandidateStatus,
    pub to: CandidateStatus,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub manual: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Raised when an operator requests a move the adjacency table forbids.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidTransitionError {
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error("transition {from} -> {to} is not allowed")]
    Unreachable {
        from: CandidateStatus,
        to: CandidateStatus,
    },
}

/// The statuses reachable from `from` in a single step.
///
/// `published` only ages out to the archive; `archived` is terminal; `error`
/// is left only by manual recovery.
pub fn allowed_transitions(from: CandidateStatus) -> &'static [CandidateStatus] {
    use CandidateStatus::*;
    match from {
        Pending => &[Processing, Archived],
        Processing => &[AnalysisComplete, Error],
        AnalysisComplete => &[
            NeedsReview,
            HighRisk,
            RiskReviewRequired,
            FilteredNoMonetization,
            LowScoreFiltered,
            Error,
        ],
        NeedsReview => &[
            Approved,
            Rejected,
            RiskReviewRequired,
            UnderRevision,
            Archived,
            Error,
        ],
        HighRisk => &[RiskReviewRequired, Rejected, Archived, Error],
        RiskReviewRequired => &[Approved, Rejected, NeedsReview, Archived, Error],
        FilteredNoMonetization => &[NeedsReview, Rejected, Archived, Error],
        LowScoreFiltered => &[NeedsReview, Rejected, Archived, Error],
        Approved => &[Published, UnderRevision, Archived, Error],
        Rejected => &[UnderRevision, Archived, Error],
        UnderRevision => &[Processing, NeedsReview, Archived, Error],
        Published => &[Archived],
        Archived => &[],
        Error => &[Pending, Archived],
    }
}

/// Routes candidates between lifecycle states against the adjacency table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMachine;

impl StateMachine {
    /// Staying in place is always legal; everything else must be an edge.
    pub fn can_transition(&self, from: CandidateStatus, to: CandidateStatus) -> bool {
        from == to || allowed_transitions(from).contains(&to)
    }

    /// Map the primary filter decision and priority onto a concrete target
    /// status, then validate it.
    ///
    /// An unreachable target is never applied as-is: the transition is forced
    /// to the error state with the rejected move spelled out in the reason.
    pub fn route(
        &self,
        candidate: &Candidate,
        actions: &[FilterAction],
        priority: &PriorityScore,
        now: DateTime<Utc>,
    ) -> StateTransition {
        let decision = FilterRuleEngine::final_decision(actions);
        let from = candidate.status;

        let (target, reason) = match decision.result {
            FilterResult::Reject => (decision.target_status, decision.reason.clone()),
            FilterResult::RequireManual => (
                CandidateStatus::RiskReviewRequired,
                decision.reason.clone(),
            ),
            FilterResult::Approve => (
                CandidateStatus::NeedsReview,
                format!(
                    "approved for review at {} priority: {}",
                    priority.level.label(),
                    decision.reason
                ),
            ),
            FilterResult::Skip => (from, format!("skipped: {}", decision.reason)),
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("decision".to_string(), decision.result.label().to_string());
        metadata.insert(
            "priority_level".to_string(),
            priority.level.label().to_string(),
        );

        if self.can_transition(from, target) {
            StateTransition {
                from,
                to: target,
                reason,
                timestamp: now,
                manual: false,
                operator: None,
                metadata,
            }
        } else {
            metadata.insert("rejected_target".to_string(), target.label().to_string());
            StateTransition {
                from,
                to: CandidateStatus::Error,
                reason: format!(
                    "transition {from} -> {target} is not allowed; parked in error for manual recovery"
                ),
                timestamp: now,
                manual: false,
                operator: None,
                metadata,
            }
        }
    }

    /// Validate a human-requested move. Unlike `route`, an illegal target is
    /// reported back to the operator instead of forcing the error state.
    pub fn manual_transition(
        &self,
        candidate: &Candidate,
        new_status: &str,
        reason: &str,
        operator_id: &str,
        now: DateTime<Utc>,
    ) -> Result<StateTransition, InvalidTransitionError> {
        let to: CandidateStatus = new_status.parse()?;
        let from = candidate.status;

        if !self.can_transition(from, to) {
            return Err(InvalidTransitionError::Unreachable { from, to });
        }

        Ok(StateTransition {
            from,
            to,
            reason: reason.to_string(),
            timestamp: now,
            manual: true,
            operator: Some(operator_id.to_string()),
            metadata: BTreeMap::new(),
        })
    }
}
