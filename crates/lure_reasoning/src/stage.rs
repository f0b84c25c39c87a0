//! Primary/fallback execution shared by every decision stage.
//!
//! A stage tries its external-service method first. Any failure (unavailable,
//! call error, parse error, empty result) runs the local fallback, which is
//! total and cannot fail. Errors never leave `run`.

use crate::error::StageError;
use async_trait::async_trait;

#[async_trait]
pub trait ResilientStage<I: Sync + ?Sized>: Send + Sync {
    type Output: Send;

    /// Name for logging.
    fn name(&self) -> &'static str;

    /// External-service method.
    async fn attempt_primary(&self, input: &I) -> Result<Self::Output, StageError>;

    /// Deterministic local method.
    fn fallback(&self, input: &I) -> Self::Output;

    /// Run the primary method, degrading to the fallback on any failure.
    async fn run(&self, input: &I) -> Self::Output {
        match self.attempt_primary(input).await {
            Ok(output) => output,
            Err(StageError::Unavailable) => {
                tracing::debug!("{}: no external service, using fallback", self.name());
                self.fallback(input)
            }
            Err(e) => {
                tracing::warn!("{}: primary method failed ({}), using fallback", self.name(), e);
                self.fallback(input)
            }
        }
    }
}
