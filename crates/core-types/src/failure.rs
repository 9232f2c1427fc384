use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::locator::LocatorDescriptor;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FailureId(pub String);

impl FailureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for FailureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FailureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized view of a thrown failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            subtype: String::new(),
            message: message.into(),
        }
    }
}

/// Coarse failure classification tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    LocatorNotFound,
    PageLoadTimeout,
    StrictModeViolation,
    AssertionFailure,
    NetworkFailure,
    UnknownFailure,
}

impl FailureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::LocatorNotFound => "LOCATOR_NOT_FOUND",
            FailureType::PageLoadTimeout => "PAGE_LOAD_TIMEOUT",
            FailureType::StrictModeViolation => "STRICT_MODE_VIOLATION",
            FailureType::AssertionFailure => "ASSERTION_FAILURE",
            FailureType::NetworkFailure => "NETWORK_FAILURE",
            FailureType::UnknownFailure => "UNKNOWN_FAILURE",
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing test step. Immutable after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Failure {
    pub id: FailureId,
    #[serde(rename = "type")]
    pub failure_type: FailureType,
    pub error: ErrorInfo,
    /// `None` when the failing locator could not be recovered from the error.
    pub original_locator: Option<LocatorDescriptor>,
    pub occurred_at: DateTime<Utc>,
}

impl Failure {
    pub fn new(
        failure_type: FailureType,
        error: ErrorInfo,
        original_locator: Option<LocatorDescriptor>,
    ) -> Self {
        Self {
            id: FailureId::new(),
            failure_type,
            error,
            original_locator,
            occurred_at: Utc::now(),
        }
    }
}

/// Paths of collected artifacts. Collection is best-effort, so any of them
/// may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub dom_snapshot: Option<PathBuf>,
    pub a11y_snapshot: Option<PathBuf>,
    pub screenshot: Option<PathBuf>,
}

impl Artifacts {
    /// Looks an artifact up by its policy name. The outer `None` means the
    /// name is not an artifact at all.
    pub fn get(&self, name: &str) -> Option<Option<&Path>> {
        let slot = match name {
            "domSnapshot" | "dom_snapshot" | "dom" => &self.dom_snapshot,
            "a11ySnapshot" | "a11y_snapshot" | "a11y" => &self.a11y_snapshot,
            "screenshot" => &self.screenshot,
            _ => return None,
        };
        Some(slot.as_deref())
    }
}

/// Value threaded through classification, rule evaluation and candidate
/// generation for a single failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailureContext {
    pub tool: String,
    pub test_type: String,
    pub environment: String,
    #[serde(default)]
    pub component: Option<String>,
    pub failure: Failure,
    pub artifacts: Artifacts,
    /// Retry counter maintained by orchestration.
    #[serde(default)]
    pub attempt: u32,
}

impl FailureContext {
    pub fn new(
        tool: impl Into<String>,
        test_type: impl Into<String>,
        environment: impl Into<String>,
        failure: Failure,
        artifacts: Artifacts,
    ) -> Self {
        Self {
            tool: tool.into(),
            test_type: test_type.into(),
            environment: environment.into(),
            component: None,
            failure,
            artifacts,
            attempt: 0,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Context field lookup used by rule `when` clauses.
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "tool" => Some(self.tool.as_str()),
            "test_type" | "testType" => Some(self.test_type.as_str()),
            "environment" => Some(self.environment.as_str()),
            "component" => self.component.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> FailureContext {
        let failure = Failure::new(
            FailureType::LocatorNotFound,
            ErrorInfo::new("TimeoutError", "waiting for getByText(\"Log in\")"),
            None,
        );
        FailureContext::new("playwright", "REGRESSION", "QA", failure, Artifacts::default())
    }

    #[test]
    fn field_lookup_accepts_both_spellings() {
        let ctx = context().with_component("checkout");
        assert_eq!(ctx.field("test_type"), Some("REGRESSION"));
        assert_eq!(ctx.field("testType"), Some("REGRESSION"));
        assert_eq!(ctx.field("component"), Some("checkout"));
        assert_eq!(ctx.field("browser"), None);
    }

    #[test]
    fn artifact_lookup_distinguishes_unknown_names() {
        let artifacts = Artifacts {
            a11y_snapshot: Some(PathBuf::from("/tmp/a11y.yaml")),
            ..Artifacts::default()
        };
        assert_eq!(
            artifacts.get("a11ySnapshot"),
            Some(Some(Path::new("/tmp/a11y.yaml")))
        );
        assert_eq!(artifacts.get("screenshot"), Some(None));
        assert_eq!(artifacts.get("video"), None);
    }

    #[test]
    fn failure_type_serializes_as_tag() {
        let json = serde_json::to_string(&FailureType::StrictModeViolation).unwrap();
        assert_eq!(json, "\"STRICT_MODE_VIOLATION\"");
    }

    #[test]
    fn failure_ids_are_unique() {
        assert_ne!(FailureId::new(), FailureId::new());
    }
}
