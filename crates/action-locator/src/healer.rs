//! Self-healing with an auto-substitution gate

use std::sync::Arc;

use async_trait::async_trait;
use perceiver_structural::ArtifactCollector;
use selfheal_core_types::{FailureContext, LocatorDescriptor};
use tracing::{info, warn};

use crate::config::HealerSettings;
use crate::driver::{build_live_locator, LiveLocator, LivePage};
use crate::errors::{HealError, LocatorError};
use crate::failure::normalize_failure;
use crate::orchestrator::HealOrchestrator;
use crate::types::HealReport;

/// Self-healer trait
#[async_trait]
pub trait SelfHealer: Send + Sync {
    /// Attempt to replace the locator behind a failed action. On error the
    /// original failure is carried in the returned [`HealError`].
    async fn heal(
        &self,
        page: &dyn LivePage,
        failure: LocatorError,
    ) -> Result<Box<dyn LiveLocator>, HealError>;
}

/// Failure context plus the pipeline report for one failure.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub context: FailureContext,
    pub report: HealReport,
}

/// Default self-healer: normalize, run the pipeline, then gate the result
/// on rank or confidence.
pub struct DefaultSelfHealer {
    orchestrator: Arc<HealOrchestrator>,
    collector: ArtifactCollector,
    settings: HealerSettings,
}

impl DefaultSelfHealer {
    /// The orchestrator probes candidates with `settings.validation_timeout`.
    pub fn new(orchestrator: HealOrchestrator, settings: HealerSettings) -> Self {
        let orchestrator = orchestrator.with_validation_timeout(settings.validation_timeout);
        Self {
            collector: ArtifactCollector::new(settings.artifact_dir.clone()),
            orchestrator: Arc::new(orchestrator),
            settings,
        }
    }

    pub async fn diagnose(&self, page: &dyn LivePage, failure: &LocatorError) -> Diagnosis {
        let context = normalize_failure(
            page,
            failure,
            &self.settings,
            self.orchestrator.parser(),
            &self.collector,
        )
        .await;
        let report = self.orchestrator.manage_failure(page, &context).await;
        Diagnosis { context, report }
    }

    /// Returns the locator that may be substituted automatically.
    pub fn gate(
        &self,
        report: &HealReport,
        failure: LocatorError,
    ) -> Result<LocatorDescriptor, HealError> {
        let Some(healed) = report.healed() else {
            return Err(HealError::Unhealed(failure));
        };
        if self.settings.thresholds.accepts(&healed.healed) {
            return Ok(healed.healed.clone());
        }
        warn!(
            target: "healer",
            suggested = %healed.healed_locator,
            rank = healed.locator_rank,
            confidence = healed.confidence,
            "healed locator below threshold"
        );
        Err(HealError::ManualReview {
            suggested: healed.healed_locator.clone(),
            rank: healed.locator_rank,
            confidence: healed.confidence,
            source: failure,
        })
    }
}

#[async_trait]
impl SelfHealer for DefaultSelfHealer {
    async fn heal(
        &self,
        page: &dyn LivePage,
        failure: LocatorError,
    ) -> Result<Box<dyn LiveLocator>, HealError> {
        let diagnosis = self.diagnose(page, &failure).await;
        let healed = self.gate(&diagnosis.report, failure.clone())?;
        info!(
            target: "healer",
            failure = %diagnosis.context.failure.id,
            healed = %healed.to_expression(),
            "substituting healed locator"
        );
        build_live_locator(page, &healed).map_err(|_| HealError::Unhealed(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HealedLocator;
    use selfheal_core_types::{AriaRole, FailureType};
    use std::time::Duration;
    use selfheal_policy_center::{Decision, DecisionType};

    fn healer() -> DefaultSelfHealer {
        let engine = Arc::new(selfheal_policy_center::RuleEngine::new(Vec::new()));
        DefaultSelfHealer::new(HealOrchestrator::new(engine), HealerSettings::default())
    }

    fn healed_report(mut locator: LocatorDescriptor, rank: f64) -> HealReport {
        locator.rank = rank;
        let decision = Decision {
            decision: DecisionType::Transform,
            ..Decision::noop()
        };
        HealReport::Healed(HealedLocator {
            failure_type: FailureType::LocatorNotFound,
            original_locator: "page.getByText(\"Log\")".to_string(),
            healed_locator: locator.to_expression(),
            locator_rank: rank,
            confidence: locator.confidence,
            healed: locator,
            decision,
        })
    }

    fn original_failure() -> LocatorError {
        LocatorError::driver("TimeoutError", "waiting for getByText(\"Log\")")
    }

    #[test]
    fn strong_rank_passes_gate() {
        let report = healed_report(LocatorDescriptor::role(AriaRole::Button, "Log in"), 160.0);
        let healed = healer().gate(&report, original_failure()).unwrap();
        assert_eq!(healed.value, "Log in");
    }

    #[test]
    fn weak_candidate_requires_manual_review() {
        let report = healed_report(LocatorDescriptor::css("#login").with_confidence(0.4), 40.0);
        match healer().gate(&report, original_failure()) {
            Err(HealError::ManualReview {
                suggested,
                rank,
                confidence,
                source,
            }) => {
                assert_eq!(suggested, "page.locator(\"#login\")");
                assert_eq!(rank, 40.0);
                assert_eq!(confidence, 0.4);
                assert_eq!(source, original_failure());
            }
            other => panic!("unexpected gate result: {:?}", other),
        }
    }

    #[test]
    fn validation_timeout_comes_from_settings() {
        let engine = Arc::new(selfheal_policy_center::RuleEngine::new(Vec::new()));
        let settings = HealerSettings {
            validation_timeout: Duration::from_millis(250),
            ..HealerSettings::default()
        };
        let healer = DefaultSelfHealer::new(
            HealOrchestrator::new(engine).with_validation_timeout(Duration::from_secs(30)),
            settings,
        );
        assert_eq!(
            healer.orchestrator.validation_timeout(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn unresolved_reraises_original() {
        let report = HealReport::Unresolved {
            decision: Decision::noop(),
            validations: Vec::new(),
        };
        match healer().gate(&report, original_failure()) {
            Err(HealError::Unhealed(err)) => assert_eq!(err, original_failure()),
            other => panic!("unexpected gate result: {:?}", other),
        }
    }
}
