use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("rule file not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid policy: {0}")]
    Invalid(String),
    #[error("rule '{rule}' missing fields: {fields}")]
    MissingFields { rule: String, fields: String },
    #[error("invalid action type: {0}")]
    InvalidAction(String),
}
