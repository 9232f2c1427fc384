//! Browser automation capability surface
//!
//! The pipeline depends only on these traits. A driver binding implements
//! [`LivePage`] for its page handle and [`LiveLocator`] for its locators.

use std::time::Duration;

use async_trait::async_trait;
use perceiver_structural::PageCapture;
use selfheal_core_types::{AriaRole, LocatorDescriptor, LocatorStrategy};

use crate::errors::LocatorError;

/// Driver-level query a live locator is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveQuery {
    Role { role: AriaRole, name: String, exact: bool },
    Text { text: String, exact: bool },
    Label { text: String, exact: bool },
    Placeholder { text: String, exact: bool },
    TestId { id: String },
    Selector { selector: String },
}

impl LiveQuery {
    /// Builds the query a candidate is probed with. Only role, text, label,
    /// placeholder and raw selectors can be probed.
    pub fn from_descriptor(descriptor: &LocatorDescriptor) -> Result<Self, LocatorError> {
        let value = descriptor.value.clone();
        let exact = descriptor.exact;
        let query = match descriptor.strategy {
            LocatorStrategy::Role => {
                let role = descriptor.role.ok_or_else(|| {
                    LocatorError::UnsupportedStrategy(format!(
                        "role locator without role: {}",
                        value
                    ))
                })?;
                LiveQuery::Role {
                    role,
                    name: value,
                    exact,
                }
            }
            LocatorStrategy::Text => LiveQuery::Text { text: value, exact },
            LocatorStrategy::Label => LiveQuery::Label { text: value, exact },
            LocatorStrategy::Placeholder => LiveQuery::Placeholder { text: value, exact },
            LocatorStrategy::Css | LocatorStrategy::Xpath => {
                LiveQuery::Selector { selector: value }
            }
            other => return Err(LocatorError::UnsupportedStrategy(other.name().to_string())),
        };
        Ok(query)
    }

    pub fn to_descriptor(&self) -> LocatorDescriptor {
        match self {
            LiveQuery::Role { role, name, exact } => {
                LocatorDescriptor::role(*role, name.clone()).with_exact(*exact)
            }
            LiveQuery::Text { text, exact } => {
                LocatorDescriptor::text(text.clone()).with_exact(*exact)
            }
            LiveQuery::Label { text, exact } => {
                LocatorDescriptor::label(text.clone()).with_exact(*exact)
            }
            LiveQuery::Placeholder { text, exact } => {
                LocatorDescriptor::placeholder(text.clone()).with_exact(*exact)
            }
            LiveQuery::TestId { id } => LocatorDescriptor::test_id(id.clone()),
            LiveQuery::Selector { selector } => {
                LocatorDescriptor::new(crate::parser::infer_strategy(selector), selector.clone())
            }
        }
    }

    /// Call form used in driver messages, e.g. `getByText("Log in")`.
    pub fn describe(&self) -> String {
        let expression = self.to_descriptor().to_expression();
        expression
            .strip_prefix("page.")
            .map(str::to_string)
            .unwrap_or(expression)
    }
}

/// Action replayed on a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorAction {
    Click,
    DoubleClick,
    Fill(String),
    Press(String),
    Check,
    Uncheck,
    Hover,
    SelectOption(String),
}

impl LocatorAction {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorAction::Click => "click",
            LocatorAction::DoubleClick => "dblclick",
            LocatorAction::Fill(_) => "fill",
            LocatorAction::Press(_) => "press",
            LocatorAction::Check => "check",
            LocatorAction::Uncheck => "uncheck",
            LocatorAction::Hover => "hover",
            LocatorAction::SelectOption(_) => "selectOption",
        }
    }
}

/// Handle to the elements a query resolves to.
#[async_trait]
pub trait LiveLocator: Send + Sync {
    /// Waits until at least one element matches.
    async fn wait_for_first(&self, timeout: Duration) -> Result<(), LocatorError>;

    async fn count(&self) -> Result<usize, LocatorError>;

    async fn perform(&self, action: &LocatorAction) -> Result<(), LocatorError>;
}

/// Page under test.
pub trait LivePage: PageCapture {
    fn locate(&self, query: &LiveQuery) -> Result<Box<dyn LiveLocator>, LocatorError>;
}

pub fn build_live_locator(
    page: &dyn LivePage,
    descriptor: &LocatorDescriptor,
) -> Result<Box<dyn LiveLocator>, LocatorError> {
    page.locate(&LiveQuery::from_descriptor(descriptor)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probeable_strategies() {
        let descriptor = LocatorDescriptor::role(AriaRole::Button, "Log in").with_exact(true);
        let query = LiveQuery::from_descriptor(&descriptor).unwrap();
        assert_eq!(
            query,
            LiveQuery::Role {
                role: AriaRole::Button,
                name: "Log in".to_string(),
                exact: true
            }
        );
        assert_eq!(
            LiveQuery::from_descriptor(&LocatorDescriptor::xpath("//main//button")).unwrap(),
            LiveQuery::Selector {
                selector: "//main//button".to_string()
            }
        );

        for unsupported in [
            LocatorDescriptor::test_id("save"),
            LocatorDescriptor::scoped_role("main", AriaRole::Button, None),
        ] {
            assert!(matches!(
                LiveQuery::from_descriptor(&unsupported),
                Err(LocatorError::UnsupportedStrategy(_))
            ));
        }
    }

    #[test]
    fn describe_matches_driver_call_log() {
        let query = LiveQuery::Text {
            text: "Log in".to_string(),
            exact: false,
        };
        assert_eq!(query.describe(), "getByText(\"Log in\")");
        let query = LiveQuery::Selector {
            selector: "#save".to_string(),
        };
        assert_eq!(query.describe(), "locator(\"#save\")");
    }
}
