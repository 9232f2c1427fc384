//! Pipeline result types

use selfheal_core_types::{FailureType, LocatorDescriptor};
use selfheal_policy_center::Decision;
use serde::Serialize;

/// Outcome of probing one candidate on the live page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Canonical expression of the probed candidate
    pub locator: String,
    pub locator_rank: f64,
    pub count: usize,
    pub is_unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Winning candidate packaged with the decision that allowed the repair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealedLocator {
    pub failure_type: FailureType,
    pub original_locator: String,
    pub healed: LocatorDescriptor,
    pub healed_locator: String,
    pub locator_rank: f64,
    pub confidence: f64,
    pub decision: Decision,
}

/// Result of running the repair pipeline for one failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HealReport {
    /// The policy did not permit a repair.
    Declined { decision: Decision },
    /// A unique candidate was found.
    Healed(HealedLocator),
    /// Repair was permitted but no candidate proved unique.
    Unresolved {
        decision: Decision,
        validations: Vec<ValidationResult>,
    },
}

impl HealReport {
    pub fn decision(&self) -> &Decision {
        match self {
            HealReport::Declined { decision } | HealReport::Unresolved { decision, .. } => decision,
            HealReport::Healed(healed) => &healed.decision,
        }
    }

    pub fn healed(&self) -> Option<&HealedLocator> {
        match self {
            HealReport::Healed(healed) => Some(healed),
            _ => None,
        }
    }
}
