//! Cache store abstraction and the cache-aside read path

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::errors::ApplicationError;
use crate::domain::errors::StoreError;
use crate::infrastructure::resilience::with_timeout;

pub(crate) const CACHE_DEPENDENCY: &str = "aggregate_cache";

/// Key-value payload store with per-entry TTL.
///
/// Implementations must never return an entry whose TTL has elapsed.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Delete the given keys outright. Missing keys are not an error.
    async fn invalidate(&self, keys: &[String]) -> Result<(), StoreError>;
}

/// Return the cached value for `key`, or compute it, store it for `ttl` and return it.
///
/// Every store call is bounded by `op_timeout`. Store failures surface as
/// `Unavailable`; a payload that no longer decodes is treated as a miss.
pub async fn cache_aside<T, F, Fut>(
    store: &dyn CacheStore,
    key: &str,
    ttl: Duration,
    op_timeout: Duration,
    compute: F,
) -> Result<T, ApplicationError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApplicationError>>,
{
    let cached = with_timeout(op_timeout, store.get(key))
        .await
        .map_err(|e| ApplicationError::store(CACHE_DEPENDENCY, e))?;

    if let Some(payload) = cached {
        match serde_json::from_str::<T>(&payload) {
            Ok(value) => {
                debug!(key, "Cache hit");
                return Ok(value);
            }
            Err(e) => warn!(key, error = %e, "Discarding undecodable cache entry"),
        }
    } else {
        debug!(key, "Cache miss");
    }

    let value = compute().await?;

    let payload = serde_json::to_string(&value).map_err(|e| {
        ApplicationError::store(CACHE_DEPENDENCY, StoreError::Corrupt(e.to_string()))
    })?;
    with_timeout(op_timeout, store.set(key, &payload, ttl))
        .await
        .map_err(|e| ApplicationError::store(CACHE_DEPENDENCY, e))?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, String>>,
        fail: bool,
    }

    #[async_trait]
    impl CacheStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("down".to_string()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, payload: &str, _ttl: Duration) -> Result<(), StoreError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), payload.to_string());
            Ok(())
        }

        async fn invalidate(&self, keys: &[String]) -> Result<(), StoreError> {
            let mut entries = self.entries.lock().unwrap();
            for key in keys {
                entries.remove(key);
            }
            Ok(())
        }
    }

    const TTL: Duration = Duration::from_secs(60);
    const OP: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_miss_computes_and_stores() {
        let store = MapStore::default();
        let calls = AtomicUsize::new(0);

        let first: i64 = cache_aside(&store, "k", TTL, OP, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(41)
        })
        .await
        .unwrap();
        let second: i64 = cache_aside(&store, "k", TTL, OP, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(99)
        })
        .await
        .unwrap();

        assert_eq!(first, 41);
        assert_eq!(second, 41);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_forces_recompute() {
        let store = MapStore::default();
        let _: i64 = cache_aside(&store, "k", TTL, OP, || async { Ok(1) })
            .await
            .unwrap();
        store.invalidate(&["k".to_string()]).await.unwrap();

        let value: i64 = cache_aside(&store, "k", TTL, OP, || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = MapStore::default();
        store.set("k", "not json", TTL).await.unwrap();

        let value: i64 = cache_aside(&store, "k", TTL, OP, || async { Ok(5) })
            .await
            .unwrap();
        assert_eq!(value, 5);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let store = MapStore {
            fail: true,
            ..Default::default()
        };

        let err = cache_aside::<i64, _, _>(&store, "k", TTL, OP, || async { Ok(1) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::application::ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_compute_error_is_not_cached() {
        let store = MapStore::default();
        let err = cache_aside::<i64, _, _>(&store, "k", TTL, OP, || async {
            Err(ApplicationError::validation("bad"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), crate::application::ErrorKind::ValidationError);
        assert!(store.get("k").await.unwrap().is_none());
    }
}
