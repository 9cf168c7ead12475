//! Timeout helpers.

use std::future::Future;
use std::time::Duration;

use crate::error::ParlanceError;

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, ParlanceError>>,
) -> Result<T, ParlanceError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ParlanceError::Timeout(duration.as_millis() as u64)),
    }
}

/// Wrap a future with a timeout when one is configured; otherwise wait indefinitely.
pub async fn with_optional_timeout<T>(
    duration: Option<Duration>,
    future: impl Future<Output = Result<T, ParlanceError>>,
) -> Result<T, ParlanceError> {
    match duration {
        Some(duration) => with_timeout(duration, future).await,
        None => future.await,
    }
}
