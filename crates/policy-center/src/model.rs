use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PolicyError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionType {
    Allow,
    Deny,
    Transform,
    Escalate,
    Noop,
}

impl DecisionType {
    pub const ALL: [DecisionType; 5] = [
        DecisionType::Allow,
        DecisionType::Deny,
        DecisionType::Transform,
        DecisionType::Escalate,
        DecisionType::Noop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Allow => "ALLOW",
            DecisionType::Deny => "DENY",
            DecisionType::Transform => "TRANSFORM",
            DecisionType::Escalate => "ESCALATE",
            DecisionType::Noop => "NOOP",
        }
    }

    /// ALLOW and TRANSFORM let the pipeline generate candidates.
    pub fn permits_repair(&self) -> bool {
        matches!(self, DecisionType::Allow | DecisionType::Transform)
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecisionType::ALL
            .iter()
            .copied()
            .find(|decision| decision.as_str() == s)
            .ok_or_else(|| PolicyError::InvalidAction(s.to_string()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub decision: DecisionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleConfidence {
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

/// One declarative rule. Immutable once loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub priority: i64,
    /// Context field -> expected value or set of allowed values.
    #[serde(default)]
    pub when: BTreeMap<String, Value>,
    /// Failure predicate name -> expected value(s).
    #[serde(rename = "match", default)]
    pub matcher: BTreeMap<String, Value>,
    pub action: RuleAction,
    #[serde(default)]
    pub confidence: RuleConfidence,
    pub explain: String,
}

/// Outcome of evaluating the rule set against one failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: DecisionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub explain: String,
}

pub const NO_MATCH_EXPLAIN: &str = "No matching rule found";

impl Decision {
    pub fn noop() -> Self {
        Self {
            decision: DecisionType::Noop,
            rule_id: None,
            confidence: 0.0,
            details: None,
            explain: NO_MATCH_EXPLAIN.to_string(),
        }
    }

    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            decision: rule.action.decision,
            rule_id: Some(rule.id.clone()),
            confidence: rule.confidence.score,
            details: rule.action.transform.clone(),
            explain: rule.explain.clone(),
        }
    }
}
