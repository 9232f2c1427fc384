use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerceiverError {
    #[error("snapshot io error: {0}")]
    Io(String),
    #[error("snapshot parse error: {0}")]
    Parse(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("capture unsupported: {0}")]
    Unsupported(String),
}

impl PerceiverError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }
}
