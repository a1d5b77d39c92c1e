use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::DBError;

/// Deadline and cancellation for a single storage call.
///
/// The driver's own futures are raced against both; whichever fires first
/// drops the in-flight driver future and surfaces as [`DBError::Timeout`] or
/// [`DBError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl OpContext {
    /// No deadline, no cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout), cancel: None }
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { timeout: None, cancel: Some(cancel) }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancellationToken::is_cancelled)
    }

    pub(crate) async fn run<F, T>(&self, operation: F) -> Result<T, DBError>
    where
        F: Future<Output = Result<T, DBError>>,
    {
        if self.is_cancelled() {
            return Err(DBError::Cancelled);
        }

        let bounded = async {
            match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, operation)
                    .await
                    .map_err(|_| DBError::Timeout(timeout))?,
                None => operation.await,
            }
        };

        match &self.cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(DBError::Cancelled),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }
    }
}
