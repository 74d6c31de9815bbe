use super::common::*;

use crate::workflows::routing::domain::CandidateStatus;
use crate::workflows::routing::filter::{
    default_rule_set, FilterAction, FilterResult, FilterRule, FilterRuleEngine, RuleCondition,
    RulePriority, ScoreField,
};

#[test]
fn critical_rule_short_circuits_the_pass() {
    let engine = FilterRuleEngine::with_default_rules();
    let outcome = engine.process(&risky_candidate("crit"));

    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].result, FilterResult::Reject);
    assert_eq!(outcome.actions[0].target_status, CandidateStatus::HighRisk);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn reject_is_terminal_for_a_single_pass() {
    let engine = FilterRuleEngine::with_default_rules();
    let outcome = engine.process(&non_monetizable_candidate("rej"));

    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(
        outcome.actions[0].target_status,
        CandidateStatus::FilteredNoMonetization
    );
}

#[test]
fn strong_scores_approve_for_review() {
    let engine = FilterRuleEngine::with_default_rules();
    let outcome = engine.process(&candidate("strong"));

    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].result, FilterResult::Approve);
    assert_eq!(outcome.actions[0].priority_label, "high");
}

#[test]
fn moderate_scores_approve_at_medium() {
    let engine = FilterRuleEngine::with_default_rules();
    let mut moderate = candidate("moderate");
    moderate.scores.total = 70.0;
    let outcome = engine.process(&moderate);

    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].result, FilterResult::Approve);
    assert_eq!(outcome.actions[0].priority_label, "medium");
}

#[test]
fn broken_condition_fails_open_with_warning() {
    let mut rules = default_rule_set();
    rules.push(FilterRule {
        name: "misconfigured".to_string(),
        priority: RulePriority::Critical,
        condition: RuleCondition::ScoreThreshold {
            field: ScoreField::Total,
            at_least: None,
            below: None,
        },
        action: FilterAction {
            result: FilterResult::Reject,
            target_status: CandidateStatus::Rejected,
            priority_label: "critical".to_string(),
            reason: "should never fire".to_string(),
        },
    });
    let engine = FilterRuleEngine::new(rules);

    let outcome = engine.process(&candidate("fail-open"));

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].rule, "misconfigured");
    // The broken rule is skipped and the normal approve rule still fires.
    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].result, FilterResult::Approve);
}

#[test]
fn rules_are_ordered_by_priority_class() {
    let mut rules = default_rule_set();
    rules.reverse();
    let engine = FilterRuleEngine::new(rules);

    let priorities: Vec<_> = engine.rules().iter().map(|rule| rule.priority).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);
    assert_eq!(engine.rules()[0].priority, RulePriority::Critical);
}

#[test]
fn no_match_falls_back_to_manual_review() {
    let decision = FilterRuleEngine::final_decision(&[]);

    assert_eq!(decision.result, FilterResult::RequireManual);
    assert_eq!(decision.target_status, CandidateStatus::NeedsReview);
    assert_eq!(decision.reason, "no rule matched");
}

#[test]
fn condition_tree_round_trips_through_serde() {
    let condition = RuleCondition::All(vec![
        RuleCondition::ScoreThreshold {
            field: ScoreField::Total,
            at_least: Some(60.0),
            below: Some(80.0),
        },
        RuleCondition::RiskThreshold {
            above: None,
            at_most: Some(0.3),
        },
    ]);

    let encoded = serde_json::to_string(&condition).expect("serialize condition");
    let decoded: RuleCondition = serde_json::from_str(&encoded).expect("deserialize condition");
    assert_eq!(condition, decoded);
}

#[test]
fn combined_conditions_evaluate_against_the_candidate() {
    let condition = RuleCondition::Any(vec![
        RuleCondition::RiskThreshold {
            above: Some(0.7),
            at_most: None,
        },
        RuleCondition::ScoreThreshold {
            field: ScoreField::Sentiment,
            at_least: Some(0.8),
            below: None,
        },
    ]);

    assert!(condition.evaluate(&candidate("any")).expect("evaluates"));
    let mut dull = candidate("dull");
    dull.scores.sentiment = 0.2;
    assert!(!condition.evaluate(&dull).expect("evaluates"));
}
