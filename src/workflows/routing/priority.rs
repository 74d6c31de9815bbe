use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::Candidate;

/// Ordinal urgency bucket derived from the numeric priority total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Urgent,
    High,
    Medium,
    Low,
    Minimal,
}

impl PriorityLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
        }
    }

    /// Fixed-threshold bucketing; deterministic in `total` alone.
    pub fn from_total(total: f64) -> Self {
        if total >= 90.0 {
            Self::Urgent
        } else if total >= 70.0 {
            Self::High
        } else if total >= 50.0 {
            Self::Medium
        } else if total >= 30.0 {
            Self::Low
        } else {
            Self::Minimal
        }
    }

    const fn base_minutes(self) -> u32 {
        match self {
            Self::Urgent => 5,
            Self::High => 8,
            Self::Medium => 12,
            Self::Low => 20,
            Self::Minimal => 30,
        }
    }
}

/// Discrete contribution to a priority total, kept for audit transparency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    pub raw: f64,
    pub weight: f64,
    pub weighted: f64,
}

/// Review priority for a single candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityScore {
    pub total: f64,
    pub level: PriorityLevel,
    pub components: Vec<ScoreComponent>,
    pub estimated_minutes: u32,
}

/// Term weights for the priority formula. The defaults are the tuned
/// production values; tests occasionally pin their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub sentiment: f64,
    pub endorsement: f64,
    pub credibility: f64,
    pub attractiveness: f64,
    pub safety: f64,
    pub urgency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sentiment: 0.50,
            endorsement: 0.35,
            credibility: 0.15,
            attractiveness: 0.7,
            safety: 0.2,
            urgency: 0.1,
        }
    }
}

/// Pure scoring function mapping candidate fields to a review priority.
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    weights: ScoringWeights,
}

const SAFETY_PENALTY_MINUTES: u32 = 10;
const NON_MONETIZABLE_MINUTES: u32 = 15;
const UNKNOWN_AGE_URGENCY: f64 = 50.0;

impl PriorityScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Score a candidate as of `now`. `now` is injected so batch runs and
    /// tests stay deterministic.
    pub fn score(&self, candidate: &Candidate, now: DateTime<Utc>) -> PriorityScore {
        let attractiveness = clamp_0_100(
            (self.weights.sentiment * candidate.scores.sentiment
                + self.weights.endorsement * candidate.scores.endorsement
                + self.weights.credibility * candidate.scores.credibility)
                * 100.0,
        );
        let safety = clamp_0_100((1.0 - candidate.risk_confidence) * 100.0);
        let urgency = urgency_for(candidate.observed_at.as_deref(), now);

        let components = vec![
            component("attractiveness", attractiveness, self.weights.attractiveness),
            component("safety", safety, self.weights.safety),
            component("urgency", urgency, self.weights.urgency),
        ];

        let total = clamp_0_100(components.iter().map(|part| part.weighted).sum());
        let level = PriorityLevel::from_total(total);

        let mut estimated_minutes = level.base_minutes();
        if safety < 50.0 {
            estimated_minutes += SAFETY_PENALTY_MINUTES;
        }
        if !candidate.monetizable {
            estimated_minutes += NON_MONETIZABLE_MINUTES;
        }

        PriorityScore {
            total,
            level,
            components,
            estimated_minutes,
        }
    }
}

fn component(name: &'static str, raw: f64, weight: f64) -> ScoreComponent {
    ScoreComponent {
        name,
        raw,
        weight,
        weighted: raw * weight,
    }
}

fn clamp_0_100(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Staircase of candidate age in days. A missing or unparseable upload
/// timestamp is common in upstream feeds and maps to a neutral urgency
/// rather than an error.
fn urgency_for(observed_at: Option<&str>, now: DateTime<Utc>) -> f64 {
    let observed = match observed_at.map(DateTime::parse_from_rfc3339) {
        Some(Ok(parsed)) => parsed.with_timezone(&Utc),
        Some(Err(_)) | None => return UNKNOWN_AGE_URGENCY,
    };

    let age_days = (now - observed).num_days();
    if age_days <= 1 {
        100.0
    } else if age_days <= 3 {
        80.0
    } else if age_days <= 7 {
        60.0
    } else if age_days <= 30 {
        40.0
    } else {
        20.0
    }
}
