use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Locator strategy. Determines how [`LocatorDescriptor::value`] is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    Text,
    Role,
    Css,
    Xpath,
    Label,
    Placeholder,
    TestId,
    ScopedRole,
}

impl LocatorStrategy {
    pub const ALL: [LocatorStrategy; 8] = [
        LocatorStrategy::Text,
        LocatorStrategy::Role,
        LocatorStrategy::Css,
        LocatorStrategy::Xpath,
        LocatorStrategy::Label,
        LocatorStrategy::Placeholder,
        LocatorStrategy::TestId,
        LocatorStrategy::ScopedRole,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Text => "text",
            LocatorStrategy::Role => "role",
            LocatorStrategy::Css => "css",
            LocatorStrategy::Xpath => "xpath",
            LocatorStrategy::Label => "label",
            LocatorStrategy::Placeholder => "placeholder",
            LocatorStrategy::TestId => "test_id",
            LocatorStrategy::ScopedRole => "scoped_role",
        }
    }

    /// Strategies whose `exact` flag survives serialization to an expression.
    pub fn supports_exact(&self) -> bool {
        matches!(
            self,
            LocatorStrategy::Role
                | LocatorStrategy::Text
                | LocatorStrategy::Label
                | LocatorStrategy::Placeholder
        )
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LocatorStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocatorStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| CoreError::UnknownStrategy(s.to_string()))
    }
}

/// Recognized accessibility roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    // Landmarks
    Banner,
    Navigation,
    Main,
    ContentInfo,
    Search,
    Form,
    Region,

    // Widgets
    Button,
    Link,
    Textbox,
    Checkbox,
    Radio,
    Combobox,
    Listbox,
    Option,
    Menu,
    MenuItem,
    Tab,
    TabPanel,

    // Structure
    Heading,
    List,
    ListItem,
    Table,
    Row,
    Cell,
    Separator,

    // Media
    Img,
}

impl AriaRole {
    pub const ALL: [AriaRole; 27] = [
        AriaRole::Banner,
        AriaRole::Navigation,
        AriaRole::Main,
        AriaRole::ContentInfo,
        AriaRole::Search,
        AriaRole::Form,
        AriaRole::Region,
        AriaRole::Button,
        AriaRole::Link,
        AriaRole::Textbox,
        AriaRole::Checkbox,
        AriaRole::Radio,
        AriaRole::Combobox,
        AriaRole::Listbox,
        AriaRole::Option,
        AriaRole::Menu,
        AriaRole::MenuItem,
        AriaRole::Tab,
        AriaRole::TabPanel,
        AriaRole::Heading,
        AriaRole::List,
        AriaRole::ListItem,
        AriaRole::Table,
        AriaRole::Row,
        AriaRole::Cell,
        AriaRole::Separator,
        AriaRole::Img,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Banner => "banner",
            AriaRole::Navigation => "navigation",
            AriaRole::Main => "main",
            AriaRole::ContentInfo => "contentinfo",
            AriaRole::Search => "search",
            AriaRole::Form => "form",
            AriaRole::Region => "region",
            AriaRole::Button => "button",
            AriaRole::Link => "link",
            AriaRole::Textbox => "textbox",
            AriaRole::Checkbox => "checkbox",
            AriaRole::Radio => "radio",
            AriaRole::Combobox => "combobox",
            AriaRole::Listbox => "listbox",
            AriaRole::Option => "option",
            AriaRole::Menu => "menu",
            AriaRole::MenuItem => "menuitem",
            AriaRole::Tab => "tab",
            AriaRole::TabPanel => "tabpanel",
            AriaRole::Heading => "heading",
            AriaRole::List => "list",
            AriaRole::ListItem => "listitem",
            AriaRole::Table => "table",
            AriaRole::Row => "row",
            AriaRole::Cell => "cell",
            AriaRole::Separator => "separator",
            AriaRole::Img => "img",
        }
    }

    /// True when `token` is part of the recognized role vocabulary.
    pub fn is_known(token: &str) -> bool {
        token.parse::<AriaRole>().is_ok()
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AriaRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AriaRole::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}

/// Canonical, strategy-tagged representation of a locator.
///
/// `rank` is written by scoring and `confidence` by the probabilistic
/// suggester; every other field is fixed once the descriptor is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorDescriptor {
    pub strategy: LocatorStrategy,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AriaRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default)]
    pub exact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default)]
    pub rank: f64,
    #[serde(default)]
    pub confidence: f64,
}

impl LocatorDescriptor {
    pub fn new(strategy: LocatorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
            role: None,
            name: None,
            landmark: None,
            scope: None,
            exact: false,
            options: None,
            rank: 0.0,
            confidence: 0.0,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Text, value)
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Css, selector)
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Xpath, selector)
    }

    pub fn label(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Label, value)
    }

    pub fn placeholder(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Placeholder, value)
    }

    pub fn test_id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::TestId, value)
    }

    /// Role locator; the accessible name doubles as `value`.
    pub fn role(role: AriaRole, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            role: Some(role),
            name: Some(name.clone()),
            ..Self::new(LocatorStrategy::Role, name)
        }
    }

    /// Role locator whose role token is outside [`AriaRole`]. Only the
    /// accessible name is kept.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: Some(name.clone()),
            ..Self::new(LocatorStrategy::Role, name)
        }
    }

    /// Role locator nested under a landmark region.
    pub fn scoped_role(
        landmark: impl Into<String>,
        role: AriaRole,
        name: Option<String>,
    ) -> Self {
        Self {
            role: Some(role),
            name,
            landmark: Some(landmark.into()),
            ..Self::new(LocatorStrategy::ScopedRole, role.as_str())
        }
    }

    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_landmark(mut self, landmark: Option<String>) -> Self {
        self.landmark = landmark;
        self
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_options(mut self, options: Option<String>) -> Self {
        self.options = options.filter(|opts| !opts.trim().is_empty());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Canonical textual expression, readable back by the locator parser.
    pub fn to_expression(&self) -> String {
        match self.strategy {
            LocatorStrategy::Text => self.simple_call("getByText", true),
            LocatorStrategy::Label => self.simple_call("getByLabel", true),
            LocatorStrategy::Placeholder => self.simple_call("getByPlaceholder", true),
            LocatorStrategy::TestId => self.simple_call("getByTestId", false),
            LocatorStrategy::Css | LocatorStrategy::Xpath => {
                format!("page.locator({})", quote(&self.value))
            }
            LocatorStrategy::Role => {
                let role = self.role.map(|role| role.as_str()).unwrap_or_default();
                let mut args = Vec::new();
                if let Some(name) = &self.name {
                    args.push(format!("name: {}", quote(name)));
                }
                args.push(format!("exact: {}", self.exact));
                if let Some(options) = &self.options {
                    args.push(options.clone());
                }
                format!("page.getByRole({}, {{ {} }})", quote(role), args.join(", "))
            }
            LocatorStrategy::ScopedRole => {
                let inner = match &self.name {
                    Some(name) => format!(
                        "getByRole({}, {{ name: {} }})",
                        quote(&self.value),
                        quote(name)
                    ),
                    None => format!("getByRole({})", quote(&self.value)),
                };
                match &self.landmark {
                    Some(landmark) => format!("page.getByRole({}).{}", quote(landmark), inner),
                    None => format!("page.{}", inner),
                }
            }
        }
    }

    fn simple_call(&self, method: &str, honours_exact: bool) -> String {
        if honours_exact && self.exact {
            format!("page.{}({}, {{ exact: true }})", method, quote(&self.value))
        } else {
            format!("page.{}({})", method, quote(&self.value))
        }
    }

    /// Compares the fields that identify the element, ignoring scoring output.
    pub fn same_target(&self, other: &LocatorDescriptor) -> bool {
        self.strategy == other.strategy
            && self.value == other.value
            && self.role == other.role
            && self.name == other.name
            && self.exact == other.exact
    }
}

impl fmt::Display for LocatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Locator(strategy={}, value={}, confidence={})",
            self.strategy, self.value, self.confidence
        )
    }
}

fn quote(value: &str) -> String {
    if value.contains('"') && !value.contains('\'') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}
