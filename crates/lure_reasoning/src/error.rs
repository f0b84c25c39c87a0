use thiserror::Error;

/// Why a stage's primary (external-service) method produced no usable result.
///
/// Every variant is recoverable: the stage falls back to its local method.
#[derive(Debug, Error)]
pub enum StageError {
    /// No client is configured for this process.
    #[error("external service unavailable")]
    Unavailable,
    /// Network, timeout or HTTP failure.
    #[error("external call failed: {0:#}")]
    Call(anyhow::Error),
    /// The response could not be parsed or failed validation.
    #[error("malformed response: {0}")]
    Parse(String),
    /// The response parsed but carried nothing.
    #[error("empty result")]
    Empty,
}

impl StageError {
    pub fn parse(msg: impl Into<String>) -> Self {
        StageError::Parse(msg.into())
    }
}

impl From<anyhow::Error> for StageError {
    fn from(e: anyhow::Error) -> Self {
        StageError::Call(e)
    }
}
