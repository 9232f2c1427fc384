//! Repair pipeline: rule decision, candidate generation, ranking and
//! uniqueness validation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use perceiver_structural::load_snapshot;
use selfheal_core_types::{FailureContext, LocatorDescriptor};
use selfheal_policy_center::{Decision, RuleEngine};
use tracing::{debug, info, warn};

use crate::driver::LivePage;
use crate::parser::{LocatorParser, PlaywrightParser};
use crate::scoring::rank_locators;
use crate::suggester::CandidateSuggester;
use crate::transformer::LocatorTransformer;
use crate::types::{HealReport, HealedLocator};
use crate::validator::{validate_uniqueness, DEFAULT_VALIDATION_TIMEOUT};

pub struct HealOrchestrator {
    engine: Arc<RuleEngine>,
    parser: Arc<dyn LocatorParser>,
    transformer: LocatorTransformer,
    suggester: Option<Arc<dyn CandidateSuggester>>,
    validation_timeout: Duration,
}

impl HealOrchestrator {
    pub fn new(engine: Arc<RuleEngine>) -> Self {
        Self {
            engine,
            parser: Arc::new(PlaywrightParser),
            transformer: LocatorTransformer::new(),
            suggester: None,
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn LocatorParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_suggester(mut self, suggester: Arc<dyn CandidateSuggester>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    pub fn validation_timeout(&self) -> Duration {
        self.validation_timeout
    }

    pub fn parser(&self) -> &dyn LocatorParser {
        self.parser.as_ref()
    }

    pub fn decide(&self, ctx: &FailureContext) -> Decision {
        let decision = self.engine.evaluate(ctx);
        info!(
            target: "orchestrator",
            failure = %ctx.failure.id,
            failure_type = ctx.failure.failure_type.as_str(),
            decision = decision.decision.as_str(),
            rule = decision.rule_id.as_deref().unwrap_or("-"),
            confidence = decision.confidence,
            "rule decision"
        );
        decision
    }

    /// Runs the pipeline for one failure. Candidates are probed in rank order
    /// and the first unique one wins.
    pub async fn manage_failure(&self, page: &dyn LivePage, ctx: &FailureContext) -> HealReport {
        let decision = self.decide(ctx);
        if !decision.decision.permits_repair() {
            return HealReport::Declined { decision };
        }

        let candidates = self.candidate_locators(ctx).await;
        let ranked = rank_locators(&candidates);
        let mut validations = Vec::with_capacity(ranked.len());
        for candidate in ranked {
            let result = validate_uniqueness(page, &candidate, self.validation_timeout).await;
            let unique = result.is_unique;
            validations.push(result);
            if unique {
                info!(
                    target: "orchestrator",
                    locator = %candidate.to_expression(),
                    rank = candidate.rank,
                    confidence = candidate.confidence,
                    "unique candidate found"
                );
                return HealReport::Healed(HealedLocator {
                    failure_type: ctx.failure.failure_type,
                    original_locator: original_expression(ctx),
                    healed_locator: candidate.to_expression(),
                    locator_rank: candidate.rank,
                    confidence: candidate.confidence,
                    healed: candidate,
                    decision,
                });
            }
        }

        info!(
            target: "orchestrator",
            probed = validations.len(),
            "no unique candidate, manual review required"
        );
        HealReport::Unresolved {
            decision,
            validations,
        }
    }

    /// Deterministic narrowing first, the suggester only when it yields
    /// nothing.
    pub async fn candidate_locators(&self, ctx: &FailureContext) -> Vec<LocatorDescriptor> {
        let Some(original) = ctx.failure.original_locator.as_ref() else {
            warn!(target: "orchestrator", "original locator unknown, nothing to repair");
            return Vec::new();
        };
        let Some(snapshot_path) = ctx.artifacts.a11y_snapshot.as_deref() else {
            warn!(target: "orchestrator", "accessibility snapshot missing");
            return Vec::new();
        };

        match load_snapshot(snapshot_path).await {
            Ok(tree) => {
                if let Some(narrowing) = self.transformer.transform(original, &tree) {
                    return narrowing.candidates;
                }
            }
            Err(err) => {
                warn!(
                    target: "orchestrator",
                    error = %err,
                    "snapshot unreadable, skipping deterministic step"
                );
            }
        }

        self.suggested_locators(snapshot_path, original).await
    }

    async fn suggested_locators(
        &self,
        snapshot_path: &Path,
        original: &LocatorDescriptor,
    ) -> Vec<LocatorDescriptor> {
        let Some(suggester) = self.suggester.as_ref() else {
            debug!(target: "orchestrator", "no suggester configured");
            return Vec::new();
        };

        let reply = suggester.suggest(snapshot_path, &original.to_expression()).await;
        let suggestions = reply.into_suggestions();
        info!(target: "orchestrator", suggestions = suggestions.len(), "suggester replied");

        suggestions
            .into_iter()
            .filter_map(|suggestion| match self.parser.parse(&suggestion.locator) {
                Ok(locator) => Some(locator.with_confidence(suggestion.confidence)),
                Err(err) => {
                    warn!(
                        target: "orchestrator",
                        locator = %suggestion.locator,
                        error = %err,
                        "skipping unparseable suggestion"
                    );
                    None
                }
            })
            .collect()
    }
}

fn original_expression(ctx: &FailureContext) -> String {
    ctx.failure
        .original_locator
        .as_ref()
        .map(LocatorDescriptor::to_expression)
        .unwrap_or_default()
}
