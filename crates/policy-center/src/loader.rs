use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::PolicyError;
use crate::model::{DecisionType, Rule};

const REQUIRED_FIELDS: [&str; 6] = ["id", "when", "match", "action", "confidence", "explain"];

/// Loads every rule of every policy in the document at `path`, in document order.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, PolicyError> {
    if !path.exists() {
        return Err(PolicyError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path).map_err(|err| PolicyError::Io(format!("{}", err)))?;
    let rules = load_rules_from_str(&content)?;
    debug!(path = %path.display(), count = rules.len(), "loaded policy rules");
    Ok(rules)
}

pub fn load_rules_from_str(raw: &str) -> Result<Vec<Rule>, PolicyError> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    let document =
        serde_json::to_value(yaml_value).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;

    let root = validate_root(&document)?;
    let policies: &[Value] = match root.get("policies") {
        Some(Value::Array(policies)) => policies,
        Some(Value::Null) | None => &[],
        Some(other) => {
            return Err(PolicyError::Invalid(format!(
                "'policies' must be a list, got {other}"
            )))
        }
    };

    let mut rules = Vec::new();
    for policy in policies {
        let Some(policy) = policy.as_object() else {
            return Err(PolicyError::Invalid("policy entries must be mappings".into()));
        };
        match policy.get("rules") {
            None | Some(Value::Null) => continue,
            Some(Value::Array(defs)) => {
                for def in defs {
                    rules.push(parse_rule(def)?);
                }
            }
            Some(other) => {
                return Err(PolicyError::Invalid(format!(
                    "'rules' must be a list, got {other}"
                )))
            }
        }
    }
    Ok(rules)
}

fn validate_root(document: &Value) -> Result<&Map<String, Value>, PolicyError> {
    let Some(root) = document.as_object() else {
        return Err(PolicyError::Invalid("rules document must be a mapping".into()));
    };
    if !root.contains_key("policies") {
        return Err(PolicyError::Invalid(
            "rules document must contain 'policies'".into(),
        ));
    }
    Ok(root)
}

fn parse_rule(def: &Value) -> Result<Rule, PolicyError> {
    let Some(fields) = def.as_object() else {
        return Err(PolicyError::Invalid("rule entries must be mappings".into()));
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !fields.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        let rule = fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        return Err(PolicyError::MissingFields {
            rule,
            fields: missing.join(", "),
        });
    }

    let action_type = fields
        .get("action")
        .and_then(|action| action.get("type"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    action_type.parse::<DecisionType>()?;

    let mut normalized = fields.clone();
    for key in ["when", "match"] {
        if matches!(normalized.get(key), Some(Value::Null)) {
            normalized.insert(key.to_string(), Value::Object(Map::new()));
        }
    }

    serde_json::from_value(Value::Object(normalized))
        .map_err(|err| PolicyError::Invalid(format!("{}", err)))
}
