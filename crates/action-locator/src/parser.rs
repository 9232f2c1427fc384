//! Locator expression parsing
//!
//! Turns Playwright-style locator expressions (`page.getByRole(...)`,
//! `page.locator(...)`) and the "waiting for ..." phrase of driver errors
//! into [`LocatorDescriptor`]s. The inverse lives on the descriptor itself
//! ([`LocatorDescriptor::to_expression`]).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use selfheal_core_types::{AriaRole, LocatorDescriptor, LocatorStrategy};
use tracing::debug;

use crate::errors::LocatorError;

/// Swappable parser seam used by failure normalization and the orchestrator.
pub trait LocatorParser: Send + Sync {
    /// Parses a locator expression.
    fn parse(&self, expression: &str) -> Result<LocatorDescriptor, LocatorError>;

    /// Extracts and parses the locator named in a driver error message.
    fn parse_error_message(&self, message: &str) -> Result<LocatorDescriptor, LocatorError>;
}

/// Pattern set for Playwright locator calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaywrightParser;

impl LocatorParser for PlaywrightParser {
    fn parse(&self, expression: &str) -> Result<LocatorDescriptor, LocatorError> {
        parse_locator(expression)
    }

    fn parse_error_message(&self, message: &str) -> Result<LocatorDescriptor, LocatorError> {
        parse_error_message(message)
    }
}

static WAITING_FOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)waiting for\s+(?:page\.)?(?P<method>getBy[A-Z][a-zA-Z]+|locator)\((?P<args>.*)\)",
    )
    .expect("waiting-for pattern")
});

static SCOPED_ROLE: Lazy<Regex> = Lazy::new(|| {
    let pattern = [
        r#"page\.getByRole\(\s*['"](?P<landmark>[a-z]+)['"]\s*\)"#,
        r#"\.getByRole\(\s*['"](?P<role>[a-z]+)['"]\s*(?:,\s*\{\s*name\s*:\s*"#,
        quoted("name").as_str(),
        r#"\s*\})?\s*\)"#,
    ]
    .concat();
    Regex::new(&pattern).expect("scoped role pattern")
});

static ROLE: Lazy<Regex> = Lazy::new(|| {
    let pattern = [
        r#"page\.getByRole\(\s*['"](?P<role>[a-z]*)['"]\s*,\s*\{\s*name\s*:\s*"#,
        quoted("name").as_str(),
        r#"\s*(?P<rest>(?:,[^}]*)?)\}\s*\)"#,
    ]
    .concat();
    Regex::new(&pattern).expect("role pattern")
});

static TEXT: Lazy<Regex> = Lazy::new(|| simple_call("getByText"));
static LABEL: Lazy<Regex> = Lazy::new(|| simple_call("getByLabel"));
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| simple_call("getByPlaceholder"));
static TEST_ID: Lazy<Regex> = Lazy::new(|| simple_call("getByTestId"));

static SELECTOR: Lazy<Regex> = Lazy::new(|| {
    let pattern = [r#"page\.locator\(\s*"#, quoted("value").as_str(), r#"\s*\)"#].concat();
    Regex::new(&pattern).expect("selector pattern")
});

fn simple_call(method: &str) -> Regex {
    let pattern = [
        r#"page\."#,
        method,
        r#"\(\s*"#,
        quoted("value").as_str(),
        r#"\s*(?P<rest>(?:,[^)]*)?)\)"#,
    ]
    .concat();
    Regex::new(&pattern).expect("single argument pattern")
}

/// String literal in either quote style. The body stops at the quote that
/// opened it, so chained calls are not swallowed.
fn quoted(group: &str) -> String {
    format!(r#"(?:'(?P<{group}_sq>[^']*)'|"(?P<{group}_dq>[^"]*)")"#)
}

fn literal<'a>(caps: &Captures<'a>, group: &str) -> Option<&'a str> {
    caps.name(&format!("{group}_sq"))
        .or_else(|| caps.name(&format!("{group}_dq")))
        .map(|m| m.as_str())
}

/// Parses a locator expression. Patterns are tried in a fixed order:
/// scoped role, role with name, text, label, placeholder, test id, then raw
/// selector. Chained calls after the first match are ignored.
pub fn parse_locator(expression: &str) -> Result<LocatorDescriptor, LocatorError> {
    let code = expression.trim();

    if let Some(caps) = SCOPED_ROLE.captures(code) {
        let name = literal(&caps, "name").map(str::to_string);
        let landmark = &caps["landmark"];
        return Ok(match caps["role"].parse::<AriaRole>() {
            Ok(role) => LocatorDescriptor::scoped_role(landmark, role, name),
            Err(_) => {
                debug!(target: "parser", role = &caps["role"], "role outside vocabulary");
                LocatorDescriptor {
                    name,
                    landmark: Some(landmark.to_string()),
                    ..LocatorDescriptor::new(LocatorStrategy::ScopedRole, &caps["role"])
                }
            }
        });
    }

    if let Some(caps) = ROLE.captures(code) {
        let name = literal(&caps, "name").unwrap_or_default();
        let options = CallOptions::parse(rest(&caps));
        let descriptor = match caps["role"].parse::<AriaRole>() {
            Ok(role) => LocatorDescriptor::role(role, name),
            Err(_) => {
                debug!(target: "parser", role = &caps["role"], "role outside vocabulary");
                LocatorDescriptor::named(name)
            }
        };
        return Ok(descriptor
            .with_exact(options.exact)
            .with_options(options.extra));
    }

    let single_argument = [
        (&*TEXT, LocatorStrategy::Text),
        (&*LABEL, LocatorStrategy::Label),
        (&*PLACEHOLDER, LocatorStrategy::Placeholder),
        (&*TEST_ID, LocatorStrategy::TestId),
    ];
    for (pattern, strategy) in single_argument {
        if let Some(caps) = pattern.captures(code) {
            let value = literal(&caps, "value").unwrap_or_default();
            let options = CallOptions::parse(rest(&caps));
            let exact = strategy.supports_exact() && options.exact;
            return Ok(LocatorDescriptor::new(strategy, value).with_exact(exact));
        }
    }

    if let Some(caps) = SELECTOR.captures(code) {
        if let Some(selector) = literal(&caps, "value").filter(|s| !s.is_empty()) {
            return Ok(LocatorDescriptor::new(infer_strategy(selector), selector));
        }
    }

    Err(LocatorError::UnsupportedSyntax(code.to_string()))
}

/// Finds the locator call in a "waiting for ..." phrase and parses it.
pub fn parse_error_message(message: &str) -> Result<LocatorDescriptor, LocatorError> {
    let caps = WAITING_FOR
        .captures(message)
        .ok_or_else(|| LocatorError::UnsupportedSyntax(message.to_string()))?;
    parse_locator(&format!("page.{}({})", &caps["method"], caps["args"].trim()))
}

/// Leading `/` or `(` means XPath, anything else is CSS.
pub fn infer_strategy(selector: &str) -> LocatorStrategy {
    let selector = selector.trim_start();
    if selector.starts_with('/') || selector.starts_with('(') {
        LocatorStrategy::Xpath
    } else {
        LocatorStrategy::Css
    }
}

fn rest<'a>(caps: &Captures<'a>) -> &'a str {
    caps.name("rest").map(|m| m.as_str()).unwrap_or_default()
}

/// Trailing `{ exact: true, ... }` options of a locator call.
#[derive(Debug, Default, PartialEq)]
struct CallOptions {
    exact: bool,
    extra: Option<String>,
}

impl CallOptions {
    fn parse(raw: &str) -> Self {
        let body = raw
            .trim()
            .trim_start_matches(',')
            .trim()
            .trim_start_matches('{')
            .trim_end_matches('}');
        let mut options = CallOptions::default();
        let mut extra = Vec::new();
        for pair in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once(':') {
                Some((key, value)) if key.trim() == "exact" => {
                    options.exact = value.trim() == "true";
                }
                _ => extra.push(pair),
            }
        }
        if !extra.is_empty() {
            options.extra = Some(extra.join(", "));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_with_name_and_options() {
        let parsed =
            parse_locator("page.getByRole('button', { name: 'Log in', exact: true })").unwrap();
        assert_eq!(parsed.strategy, LocatorStrategy::Role);
        assert_eq!(parsed.role, Some(AriaRole::Button));
        assert_eq!(parsed.name.as_deref(), Some("Log in"));
        assert_eq!(parsed.value, "Log in");
        assert!(parsed.exact);

        let parsed =
            parse_locator("page.getByRole(\"heading\", { name: \"Orders\", level: 2 })").unwrap();
        assert!(!parsed.exact);
        assert_eq!(parsed.options.as_deref(), Some("level: 2"));
    }

    #[test]
    fn role_outside_vocabulary_keeps_name() {
        let parsed = parse_locator("page.getByRole('switch', { name: 'Dark mode' })").unwrap();
        assert_eq!(parsed.strategy, LocatorStrategy::Role);
        assert_eq!(parsed.role, None);
        assert_eq!(parsed.name.as_deref(), Some("Dark mode"));
        assert_eq!(parsed.value, "Dark mode");

        let scoped =
            parse_locator("page.getByRole('main').getByRole('dialog', { name: 'Settings' })")
                .unwrap();
        assert_eq!(scoped.strategy, LocatorStrategy::ScopedRole);
        assert_eq!(scoped.role, None);
        assert_eq!(scoped.landmark.as_deref(), Some("main"));
        assert_eq!(scoped.name.as_deref(), Some("Settings"));
    }

    #[test]
    fn chained_calls_stop_at_closing_quote() {
        let selector = parse_locator("page.locator('#form').locator('button.submit')").unwrap();
        assert_eq!(selector, LocatorDescriptor::css("#form"));

        let role = parse_locator(
            "page.getByRole('button', { name: 'Save' }).filter({ hasText: 'Draft' })",
        )
        .unwrap();
        assert_eq!(role.name.as_deref(), Some("Save"));
        assert_eq!(role.options, None);

        let text = parse_locator("page.getByText('Total').locator('..').getByText('Due')").unwrap();
        assert_eq!(text.value, "Total");

        let scoped = parse_locator(
            "page.getByRole('navigation').getByRole('link', { name: 'Docs' }).first()",
        )
        .unwrap();
        assert_eq!(scoped.name.as_deref(), Some("Docs"));
    }

    #[test]
    fn parses_single_argument_forms() {
        let text = parse_locator("page.getByText('Welcome back', { exact: true })").unwrap();
        assert_eq!(
            (text.strategy, text.value.as_str(), text.exact),
            (LocatorStrategy::Text, "Welcome back", true)
        );

        let label = parse_locator("page.getByLabel(\"Email\")").unwrap();
        assert_eq!(
            (label.strategy, label.value.as_str()),
            (LocatorStrategy::Label, "Email")
        );

        let placeholder = parse_locator("page.getByPlaceholder('Search...')").unwrap();
        assert_eq!(placeholder.strategy, LocatorStrategy::Placeholder);

        let test_id = parse_locator("page.getByTestId('submit-order')").unwrap();
        assert_eq!(
            (test_id.strategy, test_id.value.as_str()),
            (LocatorStrategy::TestId, "submit-order")
        );
    }

    #[test]
    fn trailing_action_is_ignored() {
        let parsed = parse_locator("await page.getByText(\"Save (draft)\").click()").unwrap();
        assert_eq!(parsed.value, "Save (draft)");
    }

    #[test]
    fn selector_strategy_follows_surface_syntax() {
        let css = parse_locator("page.locator('#login-form button.primary')").unwrap();
        assert_eq!(css.strategy, LocatorStrategy::Css);
        let xpath = parse_locator("page.locator(\"//button[@type='submit']\")").unwrap();
        assert_eq!(xpath.strategy, LocatorStrategy::Xpath);
        assert_eq!(xpath.value, "//button[@type='submit']");
        assert_eq!(infer_strategy("(//li)[2]"), LocatorStrategy::Xpath);
        assert_eq!(infer_strategy("li:nth-child(2)"), LocatorStrategy::Css);
    }

    #[test]
    fn unrecognised_expression_is_a_typed_error() {
        let err = parse_locator("cy.get('#login')").unwrap_err();
        assert_eq!(err, LocatorError::UnsupportedSyntax("cy.get('#login')".to_string()));
    }

    #[test]
    fn extracts_locator_from_error_message() {
        let parsed = parse_error_message(
            "locator.click: Timeout 3000ms exceeded.\nCall log:\n  - waiting for getByText(\"Log in\")",
        )
        .unwrap();
        assert_eq!(parsed.strategy, LocatorStrategy::Text);
        assert_eq!(parsed.value, "Log in");

        let parsed =
            parse_error_message("waiting for getByRole('button', { name: 'Save', exact: true })")
                .unwrap();
        assert_eq!(parsed.role, Some(AriaRole::Button));
        assert!(parsed.exact);

        let parsed = parse_error_message(
            "  - waiting for getByRole('switch', { name: 'Dark mode' })",
        )
        .unwrap();
        assert_eq!((parsed.role, parsed.value.as_str()), (None, "Dark mode"));

        let parsed =
            parse_error_message("waiting for locator(\"//button[@type='submit']\")").unwrap();
        assert_eq!(parsed, LocatorDescriptor::xpath("//button[@type='submit']"));

        let parsed = parse_error_message("waiting for locator('#cart .checkout')").unwrap();
        assert_eq!(parsed, LocatorDescriptor::css("#cart .checkout"));

        assert!(parse_error_message("net::ERR_CONNECTION_RESET").is_err());
    }

    #[test]
    fn expressions_round_trip() {
        let descriptors = vec![
            LocatorDescriptor::role(AriaRole::Button, "Log in").with_exact(true),
            LocatorDescriptor::role(AriaRole::Link, "Forgot password?"),
            LocatorDescriptor::named("Dark mode"),
            LocatorDescriptor::text("Welcome back"),
            LocatorDescriptor::text("Sign out").with_exact(true),
            LocatorDescriptor::label("Email"),
            LocatorDescriptor::placeholder("Search products").with_exact(true),
            LocatorDescriptor::test_id("cart-total"),
            LocatorDescriptor::css("button[data-action=\"save\"]"),
            LocatorDescriptor::xpath("//nav//a[text()='Home']"),
            LocatorDescriptor::scoped_role("main", AriaRole::Button, Some("Save".to_string())),
            LocatorDescriptor::scoped_role("navigation", AriaRole::Link, None),
        ];
        for descriptor in descriptors {
            let expression = descriptor.to_expression();
            let parsed = parse_locator(&expression).unwrap();
            assert!(
                parsed.same_target(&descriptor),
                "{} parsed back as {:?}",
                expression,
                parsed
            );
        }
    }
}
