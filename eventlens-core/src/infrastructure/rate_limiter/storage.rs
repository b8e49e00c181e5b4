//! Quota counter storage backends
//!
//! - Dragonfly/Redis for distributed, production use
//! - In-memory for development and single-instance deployments

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::types::current_time_secs;
use crate::domain::errors::StoreError;

/// Atomic per-key counters with expiry
#[async_trait]
pub trait QuotaCounterStore: Send + Sync {
    /// Atomically add one to `key` and return the new count.
    /// A missing or expired key counts from zero; the key expires after `ttl_secs`.
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError>;

    /// Cleanup expired entries (for in-memory storage)
    async fn cleanup(&self);
}

/// Dragonfly/Redis storage backend
pub struct DragonflyQuotaStorage {
    connection_manager: ConnectionManager,
}

impl DragonflyQuotaStorage {
    /// Create a new Dragonfly storage backend
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| {
            warn!("Failed to create Redis client for quota counting: {}", e);
            StoreError::Unavailable(format!("invalid Dragonfly URL: {}", e))
        })?;

        let connection_manager = ConnectionManager::new(client).await.map_err(|e| {
            warn!("Failed to create connection manager for quota counting: {}", e);
            StoreError::from(e)
        })?;

        let mut conn = connection_manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| {
                warn!("Failed to ping Redis for quota counting: {}", e);
                StoreError::from(e)
            })?;

        debug!("Successfully connected to Dragonfly for quota counting");

        Ok(Self { connection_manager })
    }
}

#[async_trait]
impl QuotaCounterStore for DragonflyQuotaStorage {
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError> {
        let mut conn = self.connection_manager.clone();

        // MULTI/EXEC: the count and its expiry land together
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(key)
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from)?;

        Ok(count)
    }

    async fn cleanup(&self) {
        // Redis handles TTL-based cleanup automatically
    }
}

/// In-memory counter with expiration
struct MemoryEntry {
    count: u64,
    expires_at: u64,
}

/// In-memory storage backend for development/single instance
#[derive(Default)]
pub struct InMemoryQuotaStorage {
    counters: Mutex<HashMap<String, MemoryEntry>>,
}

impl InMemoryQuotaStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaCounterStore for InMemoryQuotaStorage {
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError> {
        let now = current_time_secs();
        let mut counters = self.counters.lock().await;

        let entry = counters.entry(key.to_string()).or_insert(MemoryEntry {
            count: 0,
            expires_at: now + ttl_secs,
        });
        if now >= entry.expires_at {
            entry.count = 0;
            entry.expires_at = now + ttl_secs;
        }
        entry.count += 1;

        Ok(entry.count)
    }

    async fn cleanup(&self) {
        let now = current_time_secs();
        let mut counters = self.counters.lock().await;
        counters.retain(|_, entry| entry.expires_at > now);
        debug!(remaining = counters.len(), "Completed quota storage cleanup");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_in_memory_increment_counts_per_key() {
        let storage = InMemoryQuotaStorage::new();

        assert_eq!(storage.increment("a", 60).await.unwrap(), 1);
        assert_eq!(storage.increment("a", 60).await.unwrap(), 2);
        assert_eq!(storage.increment("b", 60).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_expired_counter_restarts() {
        let storage = InMemoryQuotaStorage::new();
        // ttl of zero expires immediately
        assert_eq!(storage.increment("a", 0).await.unwrap(), 1);
        assert_eq!(storage.increment("a", 0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_cleanup() {
        let storage = InMemoryQuotaStorage::new();
        storage.increment("gone", 0).await.unwrap();
        storage.increment("kept", 60).await.unwrap();

        storage.cleanup().await;
        let counters = storage.counters.lock().await;
        assert_eq!(counters.len(), 1);
        assert!(counters.contains_key("kept"));
    }

    #[tokio::test]
    async fn test_in_memory_increment_is_atomic_under_concurrency() {
        let storage = Arc::new(InMemoryQuotaStorage::new());
        let mut handles = Vec::new();
        for _ in 0..100 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                storage.increment("shared", 60).await.unwrap()
            }));
        }

        let mut counts = Vec::new();
        for handle in handles {
            counts.push(handle.await.unwrap());
        }
        counts.sort_unstable();
        assert_eq!(counts, (1..=100).collect::<Vec<u64>>());
    }

    #[tokio::test]
    #[ignore] // Requires Dragonfly/Redis
    async fn test_dragonfly_increment() {
        let storage = DragonflyQuotaStorage::new("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let key = format!("test:quota:{}", current_time_secs());
        assert_eq!(storage.increment(&key, 5).await.unwrap(), 1);
        assert_eq!(storage.increment(&key, 5).await.unwrap(), 2);
    }
}
