//! Error types for the locator pipeline

use selfheal_core_types::ErrorInfo;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// No parser pattern recognised the expression
    #[error("Unsupported locator syntax: {0}")]
    UnsupportedSyntax(String),

    /// The strategy cannot be turned into a live locator
    #[error("Unsupported locator strategy: {0}")]
    UnsupportedStrategy(String),

    /// Failure raised by the automation driver, keeping its error name
    #[error("{name}: {message}")]
    Driver { name: String, message: String },
}

impl LocatorError {
    pub fn driver(name: impl Into<String>, message: impl Into<String>) -> Self {
        LocatorError::Driver {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Normalized `{type, subtype, message}` view used by the classifier.
    pub fn error_info(&self) -> ErrorInfo {
        match self {
            LocatorError::Driver { name, message } => {
                ErrorInfo::new(name.clone(), message.clone())
            }
            other => ErrorInfo::new("Error", other.to_string()),
        }
    }
}

/// Errors raised by the candidate suggester. They never leave the
/// suggester; the pipeline sees a flag-for-review reply instead.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("suggester returned no output")]
    Empty,

    #[error("malformed suggester output: {0}")]
    Malformed(String),

    #[error("snapshot unavailable: {0}")]
    Snapshot(String),

    #[error("suggester transport failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SuggestError {
    fn from(err: reqwest::Error) -> Self {
        SuggestError::Transport(err.to_string())
    }
}

/// Terminal outcome of a failed heal.
#[derive(Debug, Error)]
pub enum HealError {
    /// No repair was possible; the original failure surfaces unchanged.
    #[error(transparent)]
    Unhealed(LocatorError),

    #[error(
        "Manual review required as locator score doesn't meet the required threshold. \
         Suggested locator: {suggested}. Locator rank: {rank}, confidence: {confidence}"
    )]
    ManualReview {
        suggested: String,
        rank: f64,
        confidence: f64,
        #[source]
        source: LocatorError,
    },

    /// The healed locator was found but the retried action failed.
    #[error("healed locator failed: {0}")]
    Retry(#[source] LocatorError),
}

impl HealError {
    pub fn original(&self) -> Option<&LocatorError> {
        match self {
            HealError::Unhealed(err) => Some(err),
            HealError::ManualReview { source, .. } => Some(source),
            HealError::Retry(_) => None,
        }
    }
}
