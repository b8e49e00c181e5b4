//! Analytics use cases

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::keys::summary_cache_key;
use crate::application::cache::{CACHE_DEPENDENCY, CacheStore, cache_aside};
use crate::application::errors::ApplicationError;
use crate::domain::analytics::{Event, EventSummary, IEventRepository, NewEvent, UserStats};
use crate::domain::auth::Credential;
use crate::infrastructure::resilience::with_timeout;

const DEPENDENCY: &str = "event_store";

/// Number of events returned in `UserStats::recent_events`
pub const RECENT_EVENTS_LIMIT: i64 = 10;

/// Caller-supplied event fields, before validation
#[derive(Debug, Clone, Default)]
pub struct RecordEventInput {
    pub event: Option<String>,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub device: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Empty strings count as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Event names are stored, filtered and cache-keyed without surrounding whitespace
fn normalized_event_name(value: Option<String>) -> Option<String> {
    non_blank(value).map(|v| v.trim().to_string())
}

/// Persist an event, then drop the aggregates it makes stale
pub struct RecordEventUseCase {
    events: Arc<dyn IEventRepository>,
    cache: Arc<dyn CacheStore>,
    op_timeout: Duration,
}

impl RecordEventUseCase {
    pub fn new(
        events: Arc<dyn IEventRepository>,
        cache: Arc<dyn CacheStore>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            events,
            cache,
            op_timeout,
        }
    }

    /// `transport_ip` is used when the caller did not send `ipAddress`.
    ///
    /// Cache invalidation failures are logged and do not fail the call; the
    /// stored event is authoritative.
    #[instrument(skip_all, fields(credential_id = %credential.id))]
    pub async fn execute(
        &self,
        credential: &Credential,
        input: RecordEventInput,
        transport_ip: Option<String>,
    ) -> Result<Event, ApplicationError> {
        let event_name = normalized_event_name(input.event)
            .ok_or_else(|| ApplicationError::validation("event is required"))?;

        let metadata = match input.metadata {
            None | Some(serde_json::Value::Null) => serde_json::Value::Object(Default::default()),
            Some(value @ serde_json::Value::Object(_)) => value,
            Some(_) => return Err(ApplicationError::validation("metadata must be an object")),
        };

        let new_event = NewEvent {
            token_hash: credential.token_hash.clone(),
            event_name,
            url: input.url,
            referrer: input.referrer,
            device: input.device,
            user_id: input.user_id,
            ip_address: non_blank(input.ip_address).or(transport_ip),
            metadata,
        };

        let stored = with_timeout(self.op_timeout, self.events.insert(&new_event))
            .await
            .map_err(|e| ApplicationError::store(DEPENDENCY, e))?;

        let stale = [
            summary_cache_key(&credential.token_hash, None),
            summary_cache_key(&credential.token_hash, Some(&stored.event_name)),
        ];
        match with_timeout(self.op_timeout, self.cache.invalidate(&stale)).await {
            Ok(()) => debug!(event_id = stored.id, "Invalidated summary cache"),
            Err(e) => warn!(
                event_id = stored.id,
                dependency = CACHE_DEPENDENCY,
                error = %e,
                "Summary cache invalidation failed; cached aggregates may be stale until TTL"
            ),
        }

        Ok(stored)
    }
}

/// Summary read through the aggregate cache
pub struct GetEventSummaryUseCase {
    events: Arc<dyn IEventRepository>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    op_timeout: Duration,
}

impl GetEventSummaryUseCase {
    pub fn new(
        events: Arc<dyn IEventRepository>,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
        op_timeout: Duration,
    ) -> Self {
        Self {
            events,
            cache,
            ttl,
            op_timeout,
        }
    }

    /// A blank `event` filter means no filter
    #[instrument(skip_all, fields(credential_id = %credential.id))]
    pub async fn execute(
        &self,
        credential: &Credential,
        event: Option<String>,
    ) -> Result<EventSummary, ApplicationError> {
        let filter = normalized_event_name(event);
        let key = summary_cache_key(&credential.token_hash, filter.as_deref());

        let events = self.events.as_ref();
        let token_hash = &credential.token_hash;
        let filter = filter.as_deref();
        let op_timeout = self.op_timeout;

        cache_aside(self.cache.as_ref(), &key, self.ttl, op_timeout, || async move {
            with_timeout(op_timeout, events.summarize(token_hash, filter))
                .await
                .map_err(|e| ApplicationError::store(DEPENDENCY, e))
        })
        .await
    }
}

/// Per-user activity. Not cached.
pub struct GetUserStatsUseCase {
    events: Arc<dyn IEventRepository>,
    op_timeout: Duration,
}

impl GetUserStatsUseCase {
    pub fn new(events: Arc<dyn IEventRepository>, op_timeout: Duration) -> Self {
        Self { events, op_timeout }
    }

    #[instrument(skip_all, fields(credential_id = %credential.id))]
    pub async fn execute(
        &self,
        credential: &Credential,
        user_id: Option<String>,
    ) -> Result<UserStats, ApplicationError> {
        let user_id =
            non_blank(user_id).ok_or_else(|| ApplicationError::validation("userId is required"))?;

        with_timeout(
            self.op_timeout,
            self.events
                .user_stats(&credential.token_hash, &user_id, RECENT_EVENTS_LIMIT),
        )
        .await
        .map_err(|e| ApplicationError::store(DEPENDENCY, e))
    }
}
