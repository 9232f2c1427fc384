use std::path::PathBuf;
use std::time::Duration;

use selfheal_core_types::LocatorDescriptor;

use crate::validator::DEFAULT_VALIDATION_TIMEOUT;

/// Auto-substitution gate. A healed locator is accepted when either its
/// rank or its confidence clears the bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealThresholds {
    pub min_rank: f64,
    pub min_confidence: f64,
}

impl Default for HealThresholds {
    fn default() -> Self {
        Self {
            min_rank: 100.0,
            min_confidence: 0.9,
        }
    }
}

impl HealThresholds {
    pub fn accepts(&self, locator: &LocatorDescriptor) -> bool {
        locator.rank >= self.min_rank || locator.confidence >= self.min_confidence
    }
}

/// Settings for healing a single test run.
#[derive(Debug, Clone, PartialEq)]
pub struct HealerSettings {
    pub tool: String,
    pub test_type: String,
    pub environment: String,
    pub component: Option<String>,
    pub artifact_dir: PathBuf,
    pub validation_timeout: Duration,
    pub thresholds: HealThresholds,
}

impl Default for HealerSettings {
    fn default() -> Self {
        Self {
            tool: "playwright".to_string(),
            test_type: "REGRESSION".to_string(),
            environment: "QA".to_string(),
            component: None,
            artifact_dir: PathBuf::from("test_artifacts"),
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
            thresholds: HealThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfheal_core_types::AriaRole;

    #[test]
    fn gate_accepts_rank_or_confidence() {
        let thresholds = HealThresholds::default();
        let mut locator = LocatorDescriptor::css("#login");
        locator.rank = 40.0;
        assert!(!thresholds.accepts(&locator));
        assert!(thresholds.accepts(&locator.clone().with_confidence(0.9)));

        let mut role = LocatorDescriptor::role(AriaRole::Button, "Log in");
        role.rank = 100.0;
        assert!(thresholds.accepts(&role));
    }
}
