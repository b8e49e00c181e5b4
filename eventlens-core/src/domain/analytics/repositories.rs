//! Event repository trait

use async_trait::async_trait;

use super::entities::{Event, EventSummary, NewEvent, UserStats};
use crate::domain::auth::TokenHash;
use crate::domain::errors::StoreError;

#[async_trait]
pub trait IEventRepository: Send + Sync {
    /// Persist an event and return it with its assigned id and timestamp
    async fn insert(&self, event: &NewEvent) -> Result<Event, StoreError>;

    /// Total, per-device and per-referrer counts, read from one snapshot
    async fn summarize(
        &self,
        token_hash: &TokenHash,
        event_name: Option<&str>,
    ) -> Result<EventSummary, StoreError>;

    /// Counts and the `recent_limit` newest events for one end user
    async fn user_stats(
        &self,
        token_hash: &TokenHash,
        user_id: &str,
        recent_limit: i64,
    ) -> Result<UserStats, StoreError>;
}
