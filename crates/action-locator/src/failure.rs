//! Failure normalization

use perceiver_structural::ArtifactCollector;
use selfheal_core_types::{Failure, FailureContext};
use tracing::{info, warn};

use crate::classifier::classify_failure;
use crate::config::HealerSettings;
use crate::driver::LivePage;
use crate::errors::LocatorError;
use crate::parser::LocatorParser;

/// Builds the failure context for a driver error: classification, original
/// locator extraction and best-effort artifact collection.
pub async fn normalize_failure(
    page: &dyn LivePage,
    error: &LocatorError,
    settings: &HealerSettings,
    parser: &dyn LocatorParser,
    collector: &ArtifactCollector,
) -> FailureContext {
    let error_info = error.error_info();
    let failure_type = classify_failure(&error_info);

    let original_locator = match parser.parse_error_message(&error_info.message) {
        Ok(locator) => Some(locator),
        Err(err) => {
            warn!(target: "failure", error = %err, "original locator not recoverable");
            None
        }
    };

    let failure = Failure::new(failure_type, error_info, original_locator);
    info!(
        target: "failure",
        id = %failure.id,
        failure_type = failure.failure_type.as_str(),
        "failure classified"
    );
    let artifacts = collector.collect(page, &failure.id).await;

    let ctx = FailureContext::new(
        settings.tool.clone(),
        settings.test_type.clone(),
        settings.environment.clone(),
        failure,
        artifacts,
    );
    match &settings.component {
        Some(component) => ctx.with_component(component.clone()),
        None => ctx,
    }
}
