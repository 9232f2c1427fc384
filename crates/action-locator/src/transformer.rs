//! Deterministic locator narrowing over an accessibility snapshot

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use perceiver_structural::{find_elements_by_text, SnapshotNode, TextMatch};
use regex::Regex;
use selfheal_core_types::{AriaRole, LocatorDescriptor};
use serde::Serialize;
use tracing::{debug, info};

static ROLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:-\s*)?(?P<role>[a-zA-Z_]+)\s+"(?P<name>[^"]+)""#).expect("role/name pattern")
});

/// Marker key the snapshot uses for bare text nodes.
const TEXT_CONTAINER: &str = "text";

/// Splits a `role "name"` snapshot entry into its role token and name.
pub fn split_role_entry(entry: &str) -> Option<(&str, &str)> {
    let caps = ROLE_NAME.captures(entry)?;
    Some((caps.name("role")?.as_str(), caps.name("name")?.as_str()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrowingStep {
    Role,
    Text,
    LandmarkScope,
}

impl NarrowingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrowingStep::Role => "role",
            NarrowingStep::Text => "text",
            NarrowingStep::LandmarkScope => "landmark_scope",
        }
    }
}

/// Candidates produced by the first narrowing step that yielded any.
#[derive(Debug, Clone, PartialEq)]
pub struct Narrowing {
    pub step: NarrowingStep,
    pub candidates: Vec<LocatorDescriptor>,
}

/// Tries role upgrade, then text upgrade, then landmark scoping, stopping at
/// the first step with results.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocatorTransformer;

impl LocatorTransformer {
    pub fn new() -> Self {
        Self
    }

    /// `None` means no deterministic narrowing is possible.
    pub fn transform(
        &self,
        original: &LocatorDescriptor,
        snapshot: &SnapshotNode,
    ) -> Option<Narrowing> {
        let search = original.value.trim();
        if search.is_empty() {
            return None;
        }
        let matches = find_elements_by_text(snapshot, search);
        debug!(target: "transformer", search, hits = matches.len(), "snapshot search");
        if matches.is_empty() {
            return None;
        }

        let narrowing = self
            .upgrade_to_role(&matches)
            .map(|candidates| (NarrowingStep::Role, candidates))
            .or_else(|| {
                self.upgrade_to_text(&matches)
                    .map(|candidates| (NarrowingStep::Text, candidates))
            })
            .or_else(|| {
                self.scope_to_landmark(&matches, original)
                    .map(|candidate| (NarrowingStep::LandmarkScope, vec![candidate]))
            })
            .map(|(step, candidates)| Narrowing { step, candidates });

        if let Some(narrowing) = &narrowing {
            info!(
                target: "transformer",
                step = narrowing.step.as_str(),
                candidates = narrowing.candidates.len(),
                "deterministic candidates"
            );
        }
        narrowing
    }

    fn upgrade_to_role(&self, matches: &[TextMatch]) -> Option<Vec<LocatorDescriptor>> {
        let candidates: Vec<_> = matches
            .iter()
            .filter_map(|hit| {
                let (role, name) = split_role_entry(&hit.text)?;
                let role = role.parse::<AriaRole>().ok()?;
                Some(
                    LocatorDescriptor::role(role, name)
                        .with_exact(true)
                        .with_landmark(hit.root_token())
                        .with_scope(hit.scope_token()),
                )
            })
            .collect();
        non_empty(candidates)
    }

    fn upgrade_to_text(&self, matches: &[TextMatch]) -> Option<Vec<LocatorDescriptor>> {
        let candidates: Vec<_> = matches
            .iter()
            .filter(|hit| hit.current_parent.as_deref() == Some(TEXT_CONTAINER))
            .map(|hit| {
                LocatorDescriptor::text(hit.text.clone())
                    .with_exact(true)
                    .with_landmark(hit.root_token())
                    .with_scope(hit.scope_token())
            })
            .collect();
        non_empty(candidates)
    }

    fn scope_to_landmark(
        &self,
        matches: &[TextMatch],
        original: &LocatorDescriptor,
    ) -> Option<LocatorDescriptor> {
        let role = original.role?;
        let parents: BTreeSet<String> = matches
            .iter()
            .filter(|hit| {
                hit.current_parent
                    .as_deref()
                    .map(AriaRole::is_known)
                    .unwrap_or(false)
            })
            .filter_map(TextMatch::root_token)
            .collect();
        if parents.len() != 1 {
            return None;
        }
        let landmark = parents.into_iter().next()?;
        Some(LocatorDescriptor::scoped_role(landmark, role, original.name.clone()))
    }
}

fn non_empty(candidates: Vec<LocatorDescriptor>) -> Option<Vec<LocatorDescriptor>> {
    if candidates.is_empty() {
        None
    } else {
        Some(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceiver_structural::parse_snapshot;
    use selfheal_core_types::LocatorStrategy;

    fn snapshot(raw: &str) -> SnapshotNode {
        parse_snapshot(raw).unwrap()
    }

    #[test]
    fn role_upgrade_wins_over_text() {
        let tree = snapshot(
            r#"
- main:
  - button "Log in"
  - text: Log in to see your orders
"#,
        );
        let narrowing = LocatorTransformer::new()
            .transform(&LocatorDescriptor::text("Log in"), &tree)
            .unwrap();
        assert_eq!(narrowing.step, NarrowingStep::Role);
        assert_eq!(narrowing.candidates.len(), 1);
        let candidate = &narrowing.candidates[0];
        assert_eq!(candidate.strategy, LocatorStrategy::Role);
        assert_eq!(candidate.role, Some(AriaRole::Button));
        assert_eq!(candidate.value, "Log in");
        assert!(candidate.exact);
        assert_eq!(candidate.landmark.as_deref(), Some("main"));
        assert_eq!(candidate.scope.as_deref(), Some("main"));
    }

    #[test]
    fn text_upgrade_when_no_role_pair() {
        let tree = snapshot(
            r#"
- banner:
  - heading "Shop"
- main:
  - paragraph:
    - text: Your basket is empty
"#,
        );
        let narrowing = LocatorTransformer::new()
            .transform(&LocatorDescriptor::text("basket is empty"), &tree)
            .unwrap();
        assert_eq!(narrowing.step, NarrowingStep::Text);
        assert_eq!(
            narrowing.candidates,
            vec![LocatorDescriptor::text("Your basket is empty")
                .with_exact(true)
                .with_landmark(Some("main".to_string()))
                .with_scope(Some("text".to_string()))]
        );
    }

    #[test]
    fn single_landmark_scopes_original_role() {
        let tree = snapshot(
            r#"
- navigation:
  - link:
    - /url: /checkout
    - img: checkout icon
"#,
        );
        let original = LocatorDescriptor::role(AriaRole::Link, "checkout");
        let narrowing = LocatorTransformer::new().transform(&original, &tree).unwrap();
        assert_eq!(narrowing.step, NarrowingStep::LandmarkScope);
        assert_eq!(
            narrowing.candidates,
            vec![LocatorDescriptor::scoped_role(
                "navigation",
                AriaRole::Link,
                Some("checkout".to_string())
            )]
        );
    }

    #[test]
    fn matches_under_several_landmarks_are_not_scoped() {
        let tree = snapshot(
            r#"
- navigation:
  - link:
    - img: checkout icon
- contentinfo:
  - link:
    - img: checkout icon
"#,
        );
        let original = LocatorDescriptor::role(AriaRole::Link, "checkout");
        assert!(LocatorTransformer::new().transform(&original, &tree).is_none());
    }

    #[test]
    fn scoping_needs_a_known_original_role() {
        let tree = snapshot("- navigation:\n  - link:\n    - img: checkout icon\n");
        let original = LocatorDescriptor::named("checkout");
        assert!(LocatorTransformer::new().transform(&original, &tree).is_none());
    }

    #[test]
    fn no_hits_means_no_narrowing() {
        let tree = snapshot("- main:\n  - button \"Save\"\n");
        let transformer = LocatorTransformer::new();
        assert!(transformer.transform(&LocatorDescriptor::text("Delete"), &tree).is_none());
        assert!(transformer.transform(&LocatorDescriptor::text("  "), &tree).is_none());
    }

    #[test]
    fn splits_role_entries() {
        assert_eq!(split_role_entry("- button \"Log in\""), Some(("button", "Log in")));
        assert_eq!(
            split_role_entry("link \"Forgot password?\""),
            Some(("link", "Forgot password?"))
        );
        assert_eq!(split_role_entry("main"), None);
    }
}
