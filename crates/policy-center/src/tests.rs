use crate::defaults::{default_engine, default_rules};
use crate::engine::RuleEngine;
use crate::errors::PolicyError;
use crate::loader::{load_rules, load_rules_from_str};
use crate::model::{DecisionType, NO_MATCH_EXPLAIN};
use selfheal_core_types::{
    Artifacts, ErrorInfo, Failure, FailureContext, FailureType, LocatorDescriptor,
};
use serde_json::json;
use std::path::PathBuf;

fn context(failure_type: FailureType, message: &str) -> FailureContext {
    let failure = Failure::new(
        failure_type,
        ErrorInfo::new("TimeoutError", message),
        Some(LocatorDescriptor::text("Log in")),
    );
    let artifacts = Artifacts {
        dom_snapshot: Some(PathBuf::from("dom.html")),
        a11y_snapshot: Some(PathBuf::from("a11y.yaml")),
        screenshot: None,
    };
    FailureContext::new("playwright", "REGRESSION", "QA", failure, artifacts)
}

const TWO_PRIORITIES: &str = r#"
policies:
  - rules:
      - id: low
        priority: 5
        when: {}
        match:
          failure_type: LOCATOR_NOT_FOUND
        action: { type: DENY }
        confidence: { score: 0.2 }
        explain: low priority
      - id: high
        priority: 10
        when: { tool: playwright }
        match:
          failure_type: LOCATOR_NOT_FOUND
        action:
          type: TRANSFORM
          transform: { strategy: role }
        confidence: { score: 0.8, basis: snapshot }
        explain: high priority
"#;

#[test]
fn higher_priority_rule_wins() {
    let engine = RuleEngine::new(load_rules_from_str(TWO_PRIORITIES).unwrap());
    let decision = engine.evaluate(&context(FailureType::LocatorNotFound, "waiting"));
    assert_eq!(decision.decision, DecisionType::Transform);
    assert_eq!(decision.rule_id.as_deref(), Some("high"));
    assert_eq!(decision.confidence, 0.8);
    assert_eq!(decision.details, Some(json!({"strategy": "role"})));
    assert_eq!(decision.explain, "high priority");
}

#[test]
fn equal_priority_keeps_load_order() {
    let raw = r#"
policies:
  - rules:
      - { id: first, when: {}, match: {}, action: { type: ALLOW }, confidence: { score: 0.5 }, explain: a }
  - rules:
      - { id: second, when: {}, match: {}, action: { type: DENY }, confidence: { score: 0.5 }, explain: b }
"#;
    let engine = RuleEngine::new(load_rules_from_str(raw).unwrap());
    let decision = engine.evaluate(&context(FailureType::UnknownFailure, ""));
    assert_eq!(decision.rule_id.as_deref(), Some("first"));
}

#[test]
fn no_match_yields_noop() {
    let engine = RuleEngine::new(load_rules_from_str(TWO_PRIORITIES).unwrap());
    let decision = engine.evaluate(&context(FailureType::NetworkFailure, "net::ERR_FAILED"));
    assert_eq!(decision.decision, DecisionType::Noop);
    assert_eq!(decision.confidence, 0.0);
    assert_eq!(decision.explain, NO_MATCH_EXPLAIN);
    assert!(decision.rule_id.is_none());
}

#[test]
fn missing_fields_are_reported_by_rule_id() {
    let raw = r#"
policies:
  - rules:
      - id: broken
        when: {}
        action: { type: ALLOW }
        explain: nope
"#;
    match load_rules_from_str(raw) {
        Err(PolicyError::MissingFields { rule, fields }) => {
            assert_eq!(rule, "broken");
            assert_eq!(fields, "match, confidence");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn unknown_action_type_is_fatal() {
    let raw = r#"
policies:
  - rules:
      - { id: r, when: {}, match: {}, action: { type: RETRY }, confidence: {}, explain: x }
"#;
    assert!(matches!(
        load_rules_from_str(raw),
        Err(PolicyError::InvalidAction(action)) if action == "RETRY"
    ));
}

#[test]
fn root_must_declare_policies() {
    assert!(matches!(
        load_rules_from_str("rules: []"),
        Err(PolicyError::Invalid(_))
    ));
    assert!(matches!(
        load_rules_from_str("- just a list"),
        Err(PolicyError::Invalid(_))
    ));
}

#[test]
fn load_rules_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("rules.yaml");
    std::fs::write(&file_path, TWO_PRIORITIES).unwrap();

    let rules = load_rules(&file_path).unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].id, "low");

    let engine = RuleEngine::from_path(&file_path).unwrap();
    assert_eq!(engine.rules()[0].id, "high");
}

#[test]
fn missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_rules(&dir.path().join("absent.yaml")),
        Err(PolicyError::NotFound(_))
    ));
}

#[test]
fn default_policy_transforms_missing_locators() {
    assert!(!default_rules().unwrap().is_empty());
    let engine = default_engine().unwrap();
    let decision = engine.evaluate(&context(
        FailureType::LocatorNotFound,
        "waiting for getByText(\"Log in\")",
    ));
    assert_eq!(decision.decision, DecisionType::Transform);

    let decision = engine.evaluate(&context(
        FailureType::PageLoadTimeout,
        "waiting until \"load\"",
    ));
    assert_eq!(decision.decision, DecisionType::Deny);
}

#[test]
fn default_policy_escalates_after_retries() {
    let engine = default_engine().unwrap();
    let mut ctx = context(FailureType::LocatorNotFound, "waiting");
    ctx.attempt = 2;
    assert_eq!(engine.evaluate(&ctx).decision, DecisionType::Escalate);
}
