use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::state::StateTransition;

/// Identifier wrapper for content candidates under review.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sub-scores produced by the upstream content analyzer.
///
/// The three unit-interval scores describe how attractive the item is to
/// surface; `total` is the analyzer's own 0-100 composite and drives the
/// filter rule thresholds rather than the review-priority formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisScores {
    pub sentiment: f64,
    pub endorsement: f64,
    pub credibility: f64,
    pub total: f64,
}

/// Lifecycle states a candidate moves through while being curated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Pending,
    Processing,
    AnalysisComplete,
    NeedsReview,
    HighRisk,
    RiskReviewRequired,
    FilteredNoMonetization,
    LowScoreFiltered,
    Approved,
    Rejected,
    UnderRevision,
    Published,
    Archived,
    Error,
}

impl CandidateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::AnalysisComplete => "analysis_complete",
            Self::NeedsReview => "needs_review",
            Self::HighRisk => "high_risk",
            Self::RiskReviewRequired => "risk_review_required",
            Self::FilteredNoMonetization => "filtered_no_monetization",
            Self::LowScoreFiltered => "low_score_filtered",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::UnderRevision => "under_revision",
            Self::Published => "published",
            Self::Archived => "archived",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error raised when an operator supplies a status name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown candidate status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for CandidateStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "analysis_complete" => Ok(Self::AnalysisComplete),
            "needs_review" => Ok(Self::NeedsReview),
            "high_risk" => Ok(Self::HighRisk),
            "risk_review_required" => Ok(Self::RiskReviewRequired),
            "filtered_no_monetization" => Ok(Self::FilteredNoMonetization),
            "low_score_filtered" => Ok(Self::LowScoreFiltered),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "under_revision" => Ok(Self::UnderRevision),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            "error" => Ok(Self::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One past transition preserved on the candidate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: CandidateStatus,
    pub to: CandidateStatus,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub manual: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operator: Option<String>,
}

/// A content item flowing through the curation pipeline.
///
/// The record is owned by the host datastore; within this crate only the
/// workflow orchestrator mutates `status` and `workflow_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub title: String,
    pub status: CandidateStatus,
    pub scores: AnalysisScores,
    pub risk_confidence: f64,
    pub monetizable: bool,
    pub created_at: DateTime<Utc>,
    /// Upload timestamp as reported upstream. Kept as the raw string because
    /// feeds deliver it in inconsistent shapes; scoring falls back to a
    /// neutral urgency when it does not parse.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub observed_at: Option<String>,
    #[serde(default)]
    pub workflow_history: Vec<HistoryEntry>,
}

impl Candidate {
    /// Reject records the analyzer should never have handed over.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.0.trim().is_empty() {
            return Err(ValidationError::MissingId);
        }

        for (field, value) in [
            ("sentiment", self.scores.sentiment),
            ("endorsement", self.scores.endorsement),
            ("credibility", self.scores.credibility),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ScoreOutOfRange { field, value });
            }
        }

        if !self.scores.total.is_finite() || !(0.0..=100.0).contains(&self.scores.total) {
            return Err(ValidationError::ScoreOutOfRange {
                field: "total",
                value: self.scores.total,
            });
        }

        if !self.risk_confidence.is_finite() || !(0.0..=1.0).contains(&self.risk_confidence) {
            return Err(ValidationError::RiskOutOfRange(self.risk_confidence));
        }

        Ok(())
    }

    /// Commit a validated transition: move the status and append history.
    ///
    /// Crate-private so every mutation goes through the orchestrator.
    pub(crate) fn apply_transition(&mut self, transition: &StateTransition) {
        self.status = transition.to;
        self.workflow_history.push(HistoryEntry {
            from: transition.from,
            to: transition.to,
            reason: transition.reason.clone(),
            timestamp: transition.timestamp,
            manual: transition.manual,
            operator: transition.operator.clone(),
        });
    }
}

/// Non-retryable intake failures surfaced to the caller before any stage runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("candidate id is empty")]
    MissingId,
    #[error("score '{field}' is outside its valid range: {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
    #[error("risk confidence is outside [0, 1]: {0}")]
    RiskOutOfRange(f64),
}
