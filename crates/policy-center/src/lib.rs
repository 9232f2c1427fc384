//! Declarative repair policy.
//!
//! Rules are loaded once from a YAML policy document into an immutable,
//! priority-ordered [`RuleEngine`] that is shared by every repair attempt.

pub mod defaults;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod matcher;
pub mod model;

pub use defaults::{default_engine, default_rules};
pub use engine::RuleEngine;
pub use errors::PolicyError;
pub use loader::{load_rules, load_rules_from_str};
pub use model::{Decision, DecisionType, Rule, RuleAction, RuleConfidence};

#[cfg(test)]
mod tests;
