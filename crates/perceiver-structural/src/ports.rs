use async_trait::async_trait;

use crate::errors::PerceiverError;

/// Capture surface of the page under test.
#[async_trait]
pub trait PageCapture: Send + Sync {
    /// Serialized DOM of the page.
    async fn content(&self) -> Result<String, PerceiverError>;

    /// YAML accessibility snapshot of the page body.
    async fn aria_snapshot(&self) -> Result<String, PerceiverError>;

    /// PNG screenshot bytes.
    async fn screenshot(&self) -> Result<Vec<u8>, PerceiverError>;
}
