//! Failure classification over normalized error info

use once_cell::sync::Lazy;
use regex::Regex;
use selfheal_core_types::{ErrorInfo, FailureType};

static WAITING_FOR_LOCATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)waiting for (locator\()?(page\.)?(getBy[A-Z][a-zA-Z]+|locator)\(.*?\)\)?")
        .expect("locator wait pattern")
});

struct Lowered {
    kind: String,
    message: String,
}

type Predicate = fn(&Lowered) -> bool;

/// Checked top to bottom; the first predicate that holds decides.
const CLASSIFICATION_ORDER: [(FailureType, Predicate); 5] = [
    (FailureType::LocatorNotFound, is_locator_timeout),
    (FailureType::PageLoadTimeout, is_page_load_timeout),
    (FailureType::StrictModeViolation, is_strict_mode_violation),
    (FailureType::AssertionFailure, is_assertion),
    (FailureType::NetworkFailure, is_network_error),
];

pub fn classify_failure(error: &ErrorInfo) -> FailureType {
    let lowered = Lowered {
        kind: error.kind.to_lowercase(),
        message: error.message.to_lowercase(),
    };
    CLASSIFICATION_ORDER
        .iter()
        .find(|(_, predicate)| predicate(&lowered))
        .map(|(failure_type, _)| *failure_type)
        .unwrap_or(FailureType::UnknownFailure)
}

fn is_timeout(error: &Lowered) -> bool {
    error.kind.contains("timeouterror")
}

fn is_locator_timeout(error: &Lowered) -> bool {
    is_timeout(error) && WAITING_FOR_LOCATOR.is_match(&error.message)
}

fn is_page_load_timeout(error: &Lowered) -> bool {
    is_timeout(error) && error.message.contains("waiting until \"load\"")
}

fn is_strict_mode_violation(error: &Lowered) -> bool {
    error.message.contains("strict mode violation")
}

fn is_assertion(error: &Lowered) -> bool {
    error.kind.contains("assertionerror")
}

fn is_network_error(error: &Lowered) -> bool {
    error.message.contains("net::err")
}
