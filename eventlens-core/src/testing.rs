//! In-memory repositories and store doubles for tests
//!
//! Enabled for this crate's unit tests and, through the `testing` feature,
//! for integration tests of dependent crates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::application::cache::CacheStore;
use crate::domain::analytics::{
    DeviceCount, Event, EventSummary, IEventRepository, NewEvent, ReferrerCount, UserStats,
};
use crate::domain::auth::{Credential, ICredentialRepository, TokenHash};
use crate::domain::errors::StoreError;
use crate::infrastructure::rate_limiter::QuotaCounterStore;

/// Credential repository backed by a vector
#[derive(Default)]
pub struct InMemoryCredentialRepository {
    credentials: RwLock<Vec<Credential>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a credential directly, bypassing issuance
    pub async fn insert(&self, credential: Credential) {
        self.credentials.write().await.push(credential);
    }

    /// Overwrite the expiry of the credential with `hash`
    pub async fn set_expiry(&self, hash: &TokenHash, expires_at: Option<DateTime<Utc>>) {
        let mut credentials = self.credentials.write().await;
        if let Some(c) = credentials.iter_mut().find(|c| &c.token_hash == hash) {
            c.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl ICredentialRepository for InMemoryCredentialRepository {
    async fn create(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut credentials = self.credentials.write().await;
        if credentials
            .iter()
            .any(|c| c.token_hash == credential.token_hash || c.id == credential.id)
        {
            return Err(StoreError::Duplicate);
        }
        credentials.push(credential.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &TokenHash) -> Result<Option<Credential>, StoreError> {
        let credentials = self.credentials.read().await;
        Ok(credentials
            .iter()
            .find(|c| &c.token_hash == token_hash)
            .cloned())
    }

    async fn deactivate(&self, token_hash: &TokenHash) -> Result<bool, StoreError> {
        let mut credentials = self.credentials.write().await;
        match credentials.iter_mut().find(|c| &c.token_hash == token_hash) {
            Some(c) => {
                c.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_token(
        &self,
        current: &TokenHash,
        replacement: &TokenHash,
        replacement_hint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Credential>, StoreError> {
        let mut credentials = self.credentials.write().await;
        if credentials.iter().any(|c| &c.token_hash == replacement) {
            return Err(StoreError::Duplicate);
        }
        Ok(credentials
            .iter_mut()
            .find(|c| &c.token_hash == current)
            .map(|c| {
                c.token_hash = replacement.clone();
                c.token_hint = replacement_hint.to_string();
                c.is_active = true;
                c.expires_at = Some(expires_at);
                c.clone()
            }))
    }

    async fn list(&self) -> Result<Vec<Credential>, StoreError> {
        let mut credentials = self.credentials.read().await.clone();
        credentials.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(credentials)
    }
}

/// Event repository backed by a vector, with the same grouping rules as SQL
#[derive(Default)]
pub struct InMemoryEventRepository {
    events: RwLock<Vec<Event>>,
    next_id: AtomicI64,
    summarize_calls: AtomicUsize,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `summarize` reached the store
    pub fn summarize_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }
}

fn group_counts<'a>(values: impl Iterator<Item = &'a Option<String>>) -> Vec<(Option<String>, i64)> {
    let mut groups: BTreeMap<Option<String>, i64> = BTreeMap::new();
    for value in values {
        *groups.entry(value.clone()).or_default() += 1;
    }
    let mut counted: Vec<_> = groups.into_iter().collect();
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted
}

#[async_trait]
impl IEventRepository for InMemoryEventRepository {
    async fn insert(&self, event: &NewEvent) -> Result<Event, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Event {
            id,
            token_hash: Some(event.token_hash.clone()),
            event_name: event.event_name.clone(),
            url: event.url.clone(),
            referrer: event.referrer.clone(),
            device: event.device.clone(),
            user_id: event.user_id.clone(),
            ip_address: event.ip_address.clone(),
            metadata: event.metadata.clone(),
            timestamp: Utc::now(),
        };
        self.events.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn summarize(
        &self,
        token_hash: &TokenHash,
        event_name: Option<&str>,
    ) -> Result<EventSummary, StoreError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        let events = self.events.read().await;
        let matching: Vec<&Event> = events
            .iter()
            .filter(|e| e.token_hash.as_ref() == Some(token_hash))
            .filter(|e| event_name.is_none_or(|name| e.event_name == name))
            .collect();

        Ok(EventSummary {
            total_events: matching.len() as i64,
            by_device: group_counts(matching.iter().map(|e| &e.device))
                .into_iter()
                .map(|(device, count)| DeviceCount { device, count })
                .collect(),
            by_referrer: group_counts(matching.iter().map(|e| &e.referrer))
                .into_iter()
                .map(|(referrer, count)| ReferrerCount { referrer, count })
                .collect(),
        })
    }

    async fn user_stats(
        &self,
        token_hash: &TokenHash,
        user_id: &str,
        recent_limit: i64,
    ) -> Result<UserStats, StoreError> {
        let events = self.events.read().await;
        let mut matching: Vec<&Event> = events
            .iter()
            .filter(|e| e.token_hash.as_ref() == Some(token_hash))
            .filter(|e| e.user_id.as_deref() == Some(user_id))
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        Ok(UserStats {
            user_id: user_id.to_string(),
            total_events: matching.len() as i64,
            recent_events: matching
                .iter()
                .take(usize::try_from(recent_limit).unwrap_or(0))
                .map(|e| (*e).clone())
                .collect(),
            by_device: group_counts(matching.iter().map(|e| &e.device))
                .into_iter()
                .map(|(device, count)| DeviceCount { device, count })
                .collect(),
        })
    }
}

/// Cache store whose every call fails as if the server were down
#[derive(Default)]
pub struct UnreachableCache;

#[async_trait]
impl CacheStore for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _payload: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn invalidate(&self, _keys: &[String]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Quota counter store that is always down
#[derive(Default)]
pub struct UnreachableQuotaStorage;

#[async_trait]
impl QuotaCounterStore for UnreachableQuotaStorage {
    async fn increment(&self, _key: &str, _ttl_secs: u64) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn cleanup(&self) {}
}

/// Credential repository that never answers within any reasonable timeout
#[derive(Default)]
pub struct StalledCredentialRepository;

#[async_trait]
impl ICredentialRepository for StalledCredentialRepository {
    async fn create(&self, _credential: &Credential) -> Result<(), StoreError> {
        stall().await
    }

    async fn find_by_hash(&self, _token_hash: &TokenHash) -> Result<Option<Credential>, StoreError> {
        stall().await
    }

    async fn deactivate(&self, _token_hash: &TokenHash) -> Result<bool, StoreError> {
        stall().await
    }

    async fn replace_token(
        &self,
        _current: &TokenHash,
        _replacement: &TokenHash,
        _replacement_hint: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<Option<Credential>, StoreError> {
        stall().await
    }

    async fn list(&self) -> Result<Vec<Credential>, StoreError> {
        stall().await
    }
}

async fn stall<T>() -> Result<T, StoreError> {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    Err(StoreError::Unavailable("stalled".to_string()))
}
