use super::common::*;

use chrono::{Duration, Utc};

use crate::workflows::routing::priority::{PriorityLevel, PriorityScorer};

const EPSILON: f64 = 1e-6;

#[test]
fn weighted_formula_matches_hand_computation() {
    let scorer = PriorityScorer::default();
    let now = Utc::now();
    let mut fresh = candidate("formula");
    fresh.observed_at = Some(now.to_rfc3339());

    let score = scorer.score(&fresh, now);

    // attractiveness = (0.5*0.9 + 0.35*0.85 + 0.15*0.9) * 100 = 88.25
    // safety = (1 - 0.1) * 100 = 90, urgency = 100 (observed today)
    // total = 0.7*88.25 + 0.2*90 + 0.1*100 = 89.775
    assert!((score.components[0].raw - 88.25).abs() < EPSILON);
    assert!((score.components[1].raw - 90.0).abs() < EPSILON);
    assert!((score.components[2].raw - 100.0).abs() < EPSILON);
    assert!((score.total - 89.775).abs() < EPSILON);
    assert_eq!(score.level, PriorityLevel::High);
    assert_eq!(score.estimated_minutes, 8);
}

#[test]
fn urgency_staircase_follows_candidate_age() {
    let scorer = PriorityScorer::default();
    let now = Utc::now();

    for (days_old, expected) in [(0, 100.0), (2, 80.0), (5, 60.0), (20, 40.0), (45, 20.0)] {
        let mut aged = candidate("age");
        aged.observed_at = Some((now - Duration::days(days_old)).to_rfc3339());
        let score = scorer.score(&aged, now);
        assert!(
            (score.components[2].raw - expected).abs() < EPSILON,
            "{days_old} days old should score urgency {expected}"
        );
    }
}

#[test]
fn unknown_upload_time_defaults_to_neutral_urgency() {
    let scorer = PriorityScorer::default();
    let now = Utc::now();

    let mut missing = candidate("missing");
    missing.observed_at = None;
    assert!((scorer.score(&missing, now).components[2].raw - 50.0).abs() < EPSILON);

    let mut garbled = candidate("garbled");
    garbled.observed_at = Some("around noon, probably".to_string());
    assert!((scorer.score(&garbled, now).components[2].raw - 50.0).abs() < EPSILON);
}

#[test]
fn total_is_monotone_in_each_attractiveness_term() {
    let scorer = PriorityScorer::default();
    let now = Utc::now();

    for field in ["sentiment", "endorsement", "credibility"] {
        let mut low = candidate("mono-low");
        let mut high = candidate("mono-high");
        match field {
            "sentiment" => {
                low.scores.sentiment = 0.2;
                high.scores.sentiment = 0.9;
            }
            "endorsement" => {
                low.scores.endorsement = 0.2;
                high.scores.endorsement = 0.9;
            }
            _ => {
                low.scores.credibility = 0.2;
                high.scores.credibility = 0.9;
            }
        }
        assert!(
            scorer.score(&high, now).total >= scorer.score(&low, now).total,
            "raising {field} must never lower the total"
        );
    }
}

#[test]
fn level_is_a_pure_function_of_total() {
    assert_eq!(PriorityLevel::from_total(95.0), PriorityLevel::Urgent);
    assert_eq!(PriorityLevel::from_total(90.0), PriorityLevel::Urgent);
    assert_eq!(PriorityLevel::from_total(89.99), PriorityLevel::High);
    assert_eq!(PriorityLevel::from_total(70.0), PriorityLevel::High);
    assert_eq!(PriorityLevel::from_total(69.5), PriorityLevel::Medium);
    assert_eq!(PriorityLevel::from_total(50.0), PriorityLevel::Medium);
    assert_eq!(PriorityLevel::from_total(30.0), PriorityLevel::Low);
    assert_eq!(PriorityLevel::from_total(29.9), PriorityLevel::Minimal);
    assert_eq!(PriorityLevel::from_total(0.0), PriorityLevel::Minimal);
}

#[test]
fn review_minutes_grow_for_unsafe_and_unmonetizable_items() {
    let scorer = PriorityScorer::default();
    let now = Utc::now();

    let mut heavy = candidate("heavy");
    heavy.scores.sentiment = 0.2;
    heavy.scores.endorsement = 0.2;
    heavy.scores.credibility = 0.2;
    heavy.risk_confidence = 0.8;
    heavy.monetizable = false;
    heavy.observed_at = None;

    let score = scorer.score(&heavy, now);

    // attractiveness 20, safety 20, urgency 50 -> total 23 -> minimal base 30,
    // +10 for safety below 50, +15 for no monetization.
    assert_eq!(score.level, PriorityLevel::Minimal);
    assert_eq!(score.estimated_minutes, 55);
}

#[test]
fn scoring_is_deterministic_for_a_fixed_clock() {
    let scorer = PriorityScorer::default();
    let now = Utc::now();
    let subject = candidate("deterministic");

    assert_eq!(scorer.score(&subject, now), scorer.score(&subject, now));
}
