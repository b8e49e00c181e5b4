//! Bounded waits on external stores

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::errors::StoreError;

/// Await a store call for at most `limit`.
///
/// An elapsed wait becomes `StoreError::Timeout`; the underlying future is dropped.
pub async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            let after_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            warn!(timeout_ms = after_ms, "Store operation timed out");
            Err(StoreError::Timeout { after_ms })
        }
    }
}
