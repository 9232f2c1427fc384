//! Locator self-healing pipeline
//!
//! This crate turns a failed locator action into a repaired locator:
//! - Failure classification and locator expression parsing
//! - Deterministic narrowing over the accessibility snapshot
//! - Candidate scoring and uniqueness validation on the live page
//! - Optional probabilistic suggestions with tolerant output parsing
//! - Self-healer with an auto-substitution gate and a healing page proxy

pub mod classifier;
pub mod config;
pub mod driver;
pub mod errors;
pub mod failure;
pub mod healer;
pub mod orchestrator;
pub mod parser;
pub mod proxy;
pub mod scoring;
#[cfg(feature = "stub")]
pub mod static_page;
pub mod suggester;
pub mod transformer;
pub mod types;
pub mod validator;

pub use classifier::classify_failure;
pub use config::{HealThresholds, HealerSettings};
pub use driver::{build_live_locator, LiveLocator, LivePage, LiveQuery, LocatorAction};
pub use errors::{HealError, LocatorError, SuggestError};
pub use failure::normalize_failure;
pub use healer::{DefaultSelfHealer, Diagnosis, SelfHealer};
pub use orchestrator::HealOrchestrator;
pub use parser::{
    infer_strategy, parse_error_message, parse_locator, LocatorParser, PlaywrightParser,
};
pub use proxy::{HealingLocator, HealingPage};
pub use scoring::{rank_locators, score_locator};
#[cfg(feature = "stub")]
pub use static_page::StaticPage;
pub use suggester::{
    reply_from_output, sanitize_suggestions, CandidateSuggester, OllamaConfig, OllamaSuggester,
    Suggestion, SuggesterReply,
};
pub use transformer::{LocatorTransformer, Narrowing, NarrowingStep};
pub use types::{HealReport, HealedLocator, ValidationResult};
pub use validator::{validate_uniqueness, DEFAULT_VALIDATION_TIMEOUT};
