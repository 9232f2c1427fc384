//! Predicates behind a rule's `when` and `match` clauses.

use std::collections::BTreeMap;

use selfheal_core_types::FailureContext;
use serde_json::Value;
use tracing::debug;

/// Retry count at which `attempts_exhausted` starts to hold.
pub const ATTEMPTS_FLOOR: u32 = 2;

/// Every listed context field must equal the expected string or be a member
/// of the expected list. Any other expected type skips the rule.
pub fn match_when(when: &BTreeMap<String, Value>, ctx: &FailureContext) -> bool {
    when.iter().all(|(key, expected)| {
        let actual = ctx.field(key);
        match expected {
            Value::Array(allowed) => allowed.iter().any(|candidate| match (candidate, actual) {
                (Value::String(candidate), Some(actual)) => candidate == actual,
                (Value::Null, None) => true,
                _ => false,
            }),
            Value::String(expected) => actual == Some(expected.as_str()),
            other => {
                debug!(key = %key, expected = %other, "unsupported 'when' value type");
                false
            }
        }
    })
}

/// Evaluates failure predicates. Unknown predicate names fail the rule.
pub fn match_failure(matcher: &BTreeMap<String, Value>, ctx: &FailureContext) -> bool {
    matcher
        .iter()
        .all(|(key, expected)| match_predicate(key, expected, ctx))
}

fn match_predicate(key: &str, expected: &Value, ctx: &FailureContext) -> bool {
    let failure = &ctx.failure;
    match key {
        "failure_type" => expected.as_str() == Some(failure.failure_type.as_str()),
        "error_contains" => {
            let message = failure.error.message.as_str();
            match expected {
                Value::String(needle) => message.contains(needle.as_str()),
                Value::Array(needles) => needles
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|needle| message.contains(needle)),
                _ => false,
            }
        }
        "locator_contains" => {
            let Some(needle) = expected.as_str() else {
                return false;
            };
            let serialized = serde_json::to_string(&failure.original_locator).unwrap_or_default();
            serialized.contains(needle)
        }
        "attempts_exhausted" => match expected {
            Value::Bool(true) => ctx.attempt >= ATTEMPTS_FLOOR,
            Value::Bool(false) => true,
            _ => false,
        },
        "requires" => {
            let names: Vec<&str> = match expected {
                Value::String(name) => vec![name.as_str()],
                Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
                _ => return false,
            };
            names
                .into_iter()
                .all(|name| matches!(ctx.artifacts.get(name), Some(Some(_))))
        }
        unknown => {
            debug!(predicate = %unknown, "unknown match predicate");
            false
        }
    }
}
