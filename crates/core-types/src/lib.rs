//! Shared primitives for the selfheal pipeline.
//!
//! Everything that crosses a crate boundary lives here: the canonical
//! [`LocatorDescriptor`], the accessibility role vocabulary, and the
//! failure records threaded through classification, rule evaluation and
//! candidate generation.

pub mod failure;
pub mod locator;

use thiserror::Error;

pub use failure::{Artifacts, ErrorInfo, Failure, FailureContext, FailureId, FailureType};
pub use locator::{AriaRole, LocatorDescriptor, LocatorStrategy};

/// Errors raised while interpreting shared vocabulary tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown accessibility role: {0}")]
    UnknownRole(String),
    #[error("unknown locator strategy: {0}")]
    UnknownStrategy(String),
}
