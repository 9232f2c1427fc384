//! Uniqueness probing of candidate locators

use std::time::Duration;

use selfheal_core_types::LocatorDescriptor;
use tracing::debug;

use crate::driver::{build_live_locator, LivePage};
use crate::errors::LocatorError;
use crate::types::ValidationResult;

pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_millis(2000);

/// Probes a candidate on the live page. Never fails: build, wait and count
/// errors come back as a non-unique result carrying the error message.
pub async fn validate_uniqueness(
    page: &dyn LivePage,
    descriptor: &LocatorDescriptor,
    timeout: Duration,
) -> ValidationResult {
    let expression = descriptor.to_expression();
    let result = match probe(page, descriptor, timeout).await {
        Ok(count) => ValidationResult {
            locator: expression,
            locator_rank: descriptor.rank,
            count,
            is_unique: count == 1,
            error: None,
        },
        Err(err) => ValidationResult {
            locator: expression,
            locator_rank: descriptor.rank,
            count: 0,
            is_unique: false,
            error: Some(err.to_string()),
        },
    };
    debug!(
        target: "validator",
        locator = %result.locator,
        count = result.count,
        unique = result.is_unique,
        error = result.error.as_deref().unwrap_or(""),
        "probed candidate"
    );
    result
}

async fn probe(
    page: &dyn LivePage,
    descriptor: &LocatorDescriptor,
    timeout: Duration,
) -> Result<usize, LocatorError> {
    let locator = build_live_locator(page, descriptor)?;
    locator.wait_for_first(timeout).await?;
    locator.count().await
}
