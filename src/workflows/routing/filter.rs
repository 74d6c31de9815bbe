use serde::{Deserialize, Serialize};

use super::domain::{Candidate, CandidateStatus};

/// Evaluation class for registered rules, ascending. Critical rules run first
/// and short-circuit the rest of the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePriority {
    Critical,
    High,
    Medium,
    Low,
}

impl RulePriority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Verdict attached to a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterResult {
    Approve,
    Reject,
    RequireManual,
    Skip,
}

impl FilterResult {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::RequireManual => "require_manual",
            Self::Skip => "skip",
        }
    }
}

/// What happens to a candidate when a rule matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAction {
    pub result: FilterResult,
    pub target_status: CandidateStatus,
    pub priority_label: String,
    pub reason: String,
}

/// Numeric candidate fields a threshold condition may inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    Sentiment,
    Endorsement,
    Credibility,
    Total,
}

impl ScoreField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sentiment => "sentiment",
            Self::Endorsement => "endorsement",
            Self::Credibility => "credibility",
            Self::Total => "total",
        }
    }

    fn extract(self, candidate: &Candidate) -> f64 {
        match self {
            Self::Sentiment => candidate.scores.sentiment,
            Self::Endorsement => candidate.scores.endorsement,
            Self::Credibility => candidate.scores.credibility,
            Self::Total => candidate.scores.total,
        }
    }
}

/// Boolean candidate fields a condition may inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateFlag {
    Monetizable,
}

impl CandidateFlag {
    fn extract(self, candidate: &Candidate) -> bool {
        match self {
            Self::Monetizable => candidate.monetizable,
        }
    }
}

/// Serializable predicate tree so rule sets can be edited without a redeploy.
///
/// Threshold bounds follow half-open conventions: `at_least` is inclusive and
/// `below` exclusive for scores; `above` is exclusive and `at_most` inclusive
/// for risk confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    ScoreThreshold {
        field: ScoreField,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        at_least: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        below: Option<f64>,
    },
    RiskThreshold {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        above: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        at_most: Option<f64>,
    },
    BooleanField {
        field: CandidateFlag,
        expected: bool,
    },
    All(Vec<RuleCondition>),
    Any(Vec<RuleCondition>),
}

impl RuleCondition {
    pub fn evaluate(&self, candidate: &Candidate) -> Result<bool, RuleEvaluationError> {
        match self {
            Self::ScoreThreshold {
                field,
                at_least,
                below,
            } => {
                if at_least.is_none() && below.is_none() {
                    return Err(RuleEvaluationError::UnboundedThreshold);
                }
                let value = field.extract(candidate);
                if !value.is_finite() {
                    return Err(RuleEvaluationError::NonFiniteValue {
                        field: field.label(),
                        value,
                    });
                }
                Ok(at_least.map_or(true, |min| value >= min)
                    && below.map_or(true, |max| value < max))
            }
            Self::RiskThreshold { above, at_most } => {
                if above.is_none() && at_most.is_none() {
                    return Err(RuleEvaluationError::UnboundedThreshold);
                }
                let value = candidate.risk_confidence;
                if !value.is_finite() {
                    return Err(RuleEvaluationError::NonFiniteValue {
                        field: "risk_confidence",
                        value,
                    });
                }
                Ok(above.map_or(true, |min| value > min)
                    && at_most.map_or(true, |max| value <= max))
            }
            Self::BooleanField { field, expected } => Ok(field.extract(candidate) == *expected),
            Self::All(children) => {
                for child in children {
                    if !child.evaluate(candidate)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(children) => {
                for child in children {
                    if child.evaluate(candidate)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// A misconfigured or inapplicable condition. The engine treats the owning
/// rule as non-matching and keeps going, so a broken rule degrades coverage
/// instead of blocking the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleEvaluationError {
    #[error("threshold condition carries no bounds")]
    UnboundedThreshold,
    #[error("candidate field '{field}' is not a finite number: {value}")]
    NonFiniteValue { field: &'static str, value: f64 },
}

/// A named, immutable predicate -> action pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub name: String,
    pub priority: RulePriority,
    pub condition: RuleCondition,
    pub action: FilterAction,
}

/// A rule whose condition failed to evaluate during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleWarning {
    pub rule: String,
    pub error: RuleEvaluationError,
}

/// Everything a single filter pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub actions: Vec<FilterAction>,
    pub warnings: Vec<RuleWarning>,
}

/// Ordered rule evaluator. Rules are sorted by priority class at registration
/// and never change afterwards.
#[derive(Debug, Clone)]
pub struct FilterRuleEngine {
    rules: Vec<FilterRule>,
}

impl FilterRuleEngine {
    pub fn new(mut rules: Vec<FilterRule>) -> Self {
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }

    pub fn with_default_rules() -> Self {
        Self::new(default_rule_set())
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Run one pass over the candidate.
    ///
    /// A matching critical rule records its action and stops the pass; a
    /// matched reject action is likewise terminal. Condition errors are
    /// collected as warnings and the rule skipped.
    pub fn process(&self, candidate: &Candidate) -> FilterOutcome {
        let mut actions = Vec::new();
        let mut warnings = Vec::new();

        for rule in &self.rules {
            let matched = match rule.condition.evaluate(candidate) {
                Ok(matched) => matched,
                Err(error) => {
                    warnings.push(RuleWarning {
                        rule: rule.name.clone(),
                        error,
                    });
                    continue;
                }
            };

            if !matched {
                continue;
            }

            let terminal = rule.priority == RulePriority::Critical
                || rule.action.result == FilterResult::Reject;
            actions.push(rule.action.clone());
            if terminal {
                break;
            }
        }

        FilterOutcome { actions, warnings }
    }

    /// The action that drives routing: the first match, or a manual-review
    /// fallback when nothing fired.
    pub fn final_decision(actions: &[FilterAction]) -> FilterAction {
        actions.first().cloned().unwrap_or_else(|| FilterAction {
            result: FilterResult::RequireManual,
            target_status: CandidateStatus::NeedsReview,
            priority_label: RulePriority::Medium.label().to_string(),
            reason: "no rule matched".to_string(),
        })
    }
}

/// The stock curation policy. Business configuration, not engine mechanics;
/// callers may register an entirely different set.
pub fn default_rule_set() -> Vec<FilterRule> {
    vec![
        FilterRule {
            name: "high-risk-promotion".to_string(),
            priority: RulePriority::Critical,
            condition: RuleCondition::RiskThreshold {
                above: Some(0.7),
                at_most: None,
            },
            action: FilterAction {
                result: FilterResult::Reject,
                target_status: CandidateStatus::HighRisk,
                priority_label: RulePriority::Critical.label().to_string(),
                reason: "risk confidence above 0.7 indicates undisclosed promotion".to_string(),
            },
        },
        FilterRule {
            name: "uncertain-risk".to_string(),
            priority: RulePriority::High,
            condition: RuleCondition::RiskThreshold {
                above: Some(0.3),
                at_most: Some(0.7),
            },
            action: FilterAction {
                result: FilterResult::RequireManual,
                target_status: CandidateStatus::RiskReviewRequired,
                priority_label: RulePriority::High.label().to_string(),
                reason: "risk confidence in the uncertain band needs a human call".to_string(),
            },
        },
        FilterRule {
            name: "non-monetizable".to_string(),
            priority: RulePriority::High,
            condition: RuleCondition::BooleanField {
                field: CandidateFlag::Monetizable,
                expected: false,
            },
            action: FilterAction {
                result: FilterResult::Reject,
                target_status: CandidateStatus::FilteredNoMonetization,
                priority_label: RulePriority::High.label().to_string(),
                reason: "no affiliate link can be attached to this item".to_string(),
            },
        },
        FilterRule {
            name: "strong-scores".to_string(),
            priority: RulePriority::Medium,
            condition: RuleCondition::ScoreThreshold {
                field: ScoreField::Total,
                at_least: Some(80.0),
                below: None,
            },
            action: FilterAction {
                result: FilterResult::Approve,
                target_status: CandidateStatus::NeedsReview,
                priority_label: RulePriority::High.label().to_string(),
                reason: "composite score 80 or above".to_string(),
            },
        },
        FilterRule {
            name: "moderate-scores".to_string(),
            priority: RulePriority::Medium,
            condition: RuleCondition::ScoreThreshold {
                field: ScoreField::Total,
                at_least: Some(60.0),
                below: Some(80.0),
            },
            action: FilterAction {
                result: FilterResult::Approve,
                target_status: CandidateStatus::NeedsReview,
                priority_label: RulePriority::Medium.label().to_string(),
                reason: "composite score between 60 and 80".to_string(),
            },
        },
        FilterRule {
            name: "weak-scores".to_string(),
            priority: RulePriority::Low,
            condition: RuleCondition::ScoreThreshold {
                field: ScoreField::Total,
                at_least: None,
                below: Some(60.0),
            },
            action: FilterAction {
                result: FilterResult::Reject,
                target_status: CandidateStatus::LowScoreFiltered,
                priority_label: RulePriority::Low.label().to_string(),
                reason: "composite score below 60".to_string(),
            },
        },
    ]
}
