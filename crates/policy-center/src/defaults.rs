use crate::engine::RuleEngine;
use crate::errors::PolicyError;
use crate::loader::load_rules_from_str;
use crate::model::Rule;

const DEFAULT_POLICY: &str = include_str!("../rules/default.yaml");

/// Built-in policy used when no rules file is configured.
pub fn default_rules() -> Result<Vec<Rule>, PolicyError> {
    load_rules_from_str(DEFAULT_POLICY)
}

pub fn default_engine() -> Result<RuleEngine, PolicyError> {
    Ok(RuleEngine::new(default_rules()?))
}
