use std::path::Path;

use selfheal_core_types::FailureContext;
use tracing::debug;

use crate::errors::PolicyError;
use crate::loader::load_rules;
use crate::matcher::{match_failure, match_when};
use crate::model::{Decision, Rule};

/// Priority-ordered rule list. Built once at start-up and shared read-only.
#[derive(Clone, Debug, Default)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Orders rules by descending priority; equal priorities keep load order.
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    pub fn from_path(path: &Path) -> Result<Self, PolicyError> {
        Ok(Self::new(load_rules(path)?))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the decision of the first rule whose `when` and `match` both
    /// hold, or a NOOP decision when none does.
    pub fn evaluate(&self, ctx: &FailureContext) -> Decision {
        for rule in &self.rules {
            if !match_when(&rule.when, ctx) {
                continue;
            }
            if match_failure(&rule.matcher, ctx) {
                debug!(rule = %rule.id, decision = %rule.action.decision, "rule matched");
                return Decision::from_rule(rule);
            }
        }
        Decision::noop()
    }
}
