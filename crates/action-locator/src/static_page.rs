//! In-memory driver over a recorded accessibility snapshot
//!
//! Answers role, text, label and placeholder queries by counting snapshot
//! nodes, and fails actions with the same error shapes a Playwright driver
//! reports. Used by the CLI and by pipeline tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use perceiver_structural::{parse_snapshot, PageCapture, PerceiverError, SnapshotNode};
use selfheal_core_types::AriaRole;
use tracing::debug;

use crate::driver::{LiveLocator, LivePage, LiveQuery, LocatorAction};
use crate::errors::LocatorError;
use crate::transformer::split_role_entry;

/// Timeout reported by failed actions.
pub const ACTION_TIMEOUT: Duration = Duration::from_millis(3000);

const FORM_CONTROLS: [AriaRole; 5] = [
    AriaRole::Textbox,
    AriaRole::Combobox,
    AriaRole::Checkbox,
    AriaRole::Radio,
    AriaRole::Listbox,
];

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    parent: Option<String>,
    is_key: bool,
}

pub struct StaticPage {
    raw: String,
    dom: Option<String>,
    entries: Vec<Entry>,
    performed: Arc<Mutex<Vec<String>>>,
}

impl StaticPage {
    pub fn from_yaml(raw: impl Into<String>) -> Result<Self, PerceiverError> {
        let raw = raw.into();
        let tree = parse_snapshot(&raw)?;
        let mut entries = Vec::new();
        collect_entries(&tree, None, &mut entries);
        Ok(Self {
            raw,
            dom: None,
            entries,
            performed: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self, PerceiverError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| PerceiverError::Io(format!("{}: {}", path.display(), err)))?;
        Self::from_yaml(raw)
    }

    pub fn with_dom(mut self, html: impl Into<String>) -> Self {
        self.dom = Some(html.into());
        self
    }

    /// Actions that reached exactly one element, as `action locator` lines.
    pub fn performed(&self) -> Vec<String> {
        match self.performed.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, query: &LiveQuery) -> Result<usize, LocatorError> {
        let count = match query {
            LiveQuery::Role { role, name, exact } => {
                self.count_named(|r| r == role.as_str(), name, *exact)
            }
            LiveQuery::Text { text, exact } => self
                .entries
                .iter()
                .filter(|entry| is_text_leaf(entry) && name_matches(&entry.text, text, *exact))
                .count(),
            LiveQuery::Label { text, exact } | LiveQuery::Placeholder { text, exact } => {
                self.count_named(|r| FORM_CONTROLS.iter().any(|c| c.as_str() == r), text, *exact)
            }
            LiveQuery::TestId { .. } | LiveQuery::Selector { .. } => {
                return Err(LocatorError::UnsupportedStrategy(format!(
                    "static page cannot evaluate {}",
                    query.describe()
                )))
            }
        };
        Ok(count)
    }

    fn count_named(&self, role_matches: impl Fn(&str) -> bool, wanted: &str, exact: bool) -> usize {
        self.entries
            .iter()
            .filter_map(|entry| split_role_entry(&entry.text))
            .filter(|(role, name)| role_matches(role) && name_matches(name, wanted, exact))
            .count()
    }
}

fn collect_entries(node: &SnapshotNode, parent: Option<&str>, out: &mut Vec<Entry>) {
    match node {
        SnapshotNode::Map(pairs) => {
            for (key, value) in pairs {
                out.push(Entry {
                    text: key.clone(),
                    parent: parent.map(str::to_string),
                    is_key: true,
                });
                collect_entries(value, Some(key), out);
            }
        }
        SnapshotNode::List(items) => {
            for item in items {
                collect_entries(item, parent, out);
            }
        }
        SnapshotNode::Text(text) => out.push(Entry {
            text: text.clone(),
            parent: parent.map(str::to_string),
            is_key: false,
        }),
        SnapshotNode::Empty => {}
    }
}

/// String leaves that are neither `role "name"` summaries nor attribute
/// values such as `/url`.
fn is_text_leaf(entry: &Entry) -> bool {
    !entry.is_key
        && split_role_entry(&entry.text).is_none()
        && !entry.parent.as_deref().is_some_and(|p| p.starts_with('/'))
}

fn name_matches(candidate: &str, wanted: &str, exact: bool) -> bool {
    if exact {
        candidate == wanted
    } else {
        candidate.to_lowercase().contains(&wanted.to_lowercase())
    }
}

#[async_trait]
impl PageCapture for StaticPage {
    async fn content(&self) -> Result<String, PerceiverError> {
        self.dom
            .clone()
            .ok_or_else(|| PerceiverError::Unsupported("static page has no DOM".to_string()))
    }

    async fn aria_snapshot(&self) -> Result<String, PerceiverError> {
        Ok(self.raw.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, PerceiverError> {
        Err(PerceiverError::Unsupported(
            "static page cannot render screenshots".to_string(),
        ))
    }
}

impl LivePage for StaticPage {
    fn locate(&self, query: &LiveQuery) -> Result<Box<dyn LiveLocator>, LocatorError> {
        let count = self.count(query)?;
        Ok(Box::new(StaticLocator {
            description: query.describe(),
            count,
            performed: Arc::clone(&self.performed),
        }))
    }
}

struct StaticLocator {
    description: String,
    count: usize,
    performed: Arc<Mutex<Vec<String>>>,
}

impl StaticLocator {
    fn timeout(&self, call: &str, timeout: Duration) -> LocatorError {
        LocatorError::driver(
            "TimeoutError",
            format!(
                "{}: Timeout {}ms exceeded.\nCall log:\n  - waiting for {}",
                call,
                timeout.as_millis(),
                self.description
            ),
        )
    }
}

#[async_trait]
impl LiveLocator for StaticLocator {
    async fn wait_for_first(&self, timeout: Duration) -> Result<(), LocatorError> {
        if self.count == 0 {
            return Err(self.timeout("locator.waitFor", timeout));
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, LocatorError> {
        Ok(self.count)
    }

    async fn perform(&self, action: &LocatorAction) -> Result<(), LocatorError> {
        let call = format!("locator.{}", action.name());
        match self.count {
            0 => Err(self.timeout(&call, ACTION_TIMEOUT)),
            1 => {
                debug!(
                    target: "static_page",
                    locator = %self.description,
                    action = action.name(),
                    "performed"
                );
                let line = format!("{} {}", action.name(), self.description);
                match self.performed.lock() {
                    Ok(mut log) => log.push(line),
                    Err(poisoned) => poisoned.into_inner().push(line),
                }
                Ok(())
            }
            n => Err(LocatorError::driver(
                "Error",
                format!(
                    "{}: Error: strict mode violation: {} resolved to {} elements\n\
                     Call log:\n  - waiting for {}",
                    call, self.description, n, self.description
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_failure;
    use crate::validator::{validate_uniqueness, DEFAULT_VALIDATION_TIMEOUT};
    use selfheal_core_types::{FailureType, LocatorDescriptor};

    const LOGIN: &str = r#"
- banner:
  - link "Home"
- main:
  - textbox "Email"
  - button "Log in"
  - button "Save"
  - button "Save"
  - text: Forgot your password?
- contentinfo:
  - link "Privacy":
    - /url: /privacy
"#;

    fn page() -> StaticPage {
        StaticPage::from_yaml(LOGIN).unwrap()
    }

    #[test]
    fn counts_snapshot_nodes() {
        let page = page();
        let role = |name: &str, exact| LiveQuery::Role {
            role: AriaRole::Button,
            name: name.to_string(),
            exact,
        };
        assert_eq!(page.count(&role("Log in", true)).unwrap(), 1);
        assert_eq!(page.count(&role("log", false)).unwrap(), 1);
        assert_eq!(page.count(&role("Save", true)).unwrap(), 2);
        assert_eq!(
            page.count(&LiveQuery::Text {
                text: "password".to_string(),
                exact: false
            })
            .unwrap(),
            1
        );
        assert_eq!(
            page.count(&LiveQuery::Text {
                text: "privacy".to_string(),
                exact: false
            })
            .unwrap(),
            0
        );
        assert_eq!(
            page.count(&LiveQuery::Label {
                text: "Email".to_string(),
                exact: true
            })
            .unwrap(),
            1
        );
        assert!(page
            .count(&LiveQuery::Selector {
                selector: "#login".to_string()
            })
            .is_err());
    }

    #[tokio::test]
    async fn failed_actions_look_like_driver_errors() {
        let page = page();
        let missing = page
            .locate(&LiveQuery::Text {
                text: "Log in".to_string(),
                exact: false,
            })
            .unwrap();
        let err = missing.perform(&LocatorAction::Click).await.unwrap_err();
        assert_eq!(classify_failure(&err.error_info()), FailureType::LocatorNotFound);
        assert!(err.to_string().contains("waiting for getByText(\"Log in\")"));

        let ambiguous = page
            .locate(&LiveQuery::Role {
                role: AriaRole::Button,
                name: "Save".to_string(),
                exact: true,
            })
            .unwrap();
        let err = ambiguous.perform(&LocatorAction::Click).await.unwrap_err();
        assert_eq!(classify_failure(&err.error_info()), FailureType::StrictModeViolation);
        assert!(page.performed().is_empty());
    }

    #[tokio::test]
    async fn validator_reports_uniqueness() {
        let page = page();
        let unique = validate_uniqueness(
            &page,
            &LocatorDescriptor::role(AriaRole::Button, "Log in").with_exact(true),
            DEFAULT_VALIDATION_TIMEOUT,
        )
        .await;
        assert!(unique.is_unique);
        assert_eq!(unique.count, 1);
        assert!(unique.error.is_none());

        let duplicated = validate_uniqueness(
            &page,
            &LocatorDescriptor::role(AriaRole::Button, "Save").with_exact(true),
            DEFAULT_VALIDATION_TIMEOUT,
        )
        .await;
        assert!(!duplicated.is_unique);
        assert_eq!(duplicated.count, 2);

        let missing = validate_uniqueness(
            &page,
            &LocatorDescriptor::text("Sign up"),
            DEFAULT_VALIDATION_TIMEOUT,
        )
        .await;
        assert!(!missing.is_unique);
        assert!(missing.error.as_deref().unwrap().contains("Timeout 2000ms exceeded"));

        let test_id = LocatorDescriptor::test_id("login");
        let unsupported = validate_uniqueness(&page, &test_id, DEFAULT_VALIDATION_TIMEOUT).await;
        assert!(!unsupported.is_unique);
        assert!(unsupported.error.is_some());
    }
}
