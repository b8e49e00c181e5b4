//! In-process cache implementation using moka

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};

use crate::application::cache::CacheStore;
use crate::domain::errors::StoreError;

#[derive(Clone)]
struct CachedPayload {
    data: String,
    ttl: Duration,
}

/// Gives every entry the TTL it was stored with
struct PayloadExpiry;

impl Expiry<String, CachedPayload> for PayloadExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedPayload,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedPayload,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Single-instance cache used when Dragonfly is disabled or unreachable
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, CachedPayload>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PayloadExpiry)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.get(key).await.map(|entry| entry.data))
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), StoreError> {
        self.cache
            .insert(
                key.to_string(),
                CachedPayload {
                    data: payload.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn invalidate(&self, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            self.cache.invalidate(key).await;
        }
        Ok(())
    }
}
