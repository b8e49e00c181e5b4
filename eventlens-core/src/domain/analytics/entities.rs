//! Event entities and aggregate read models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::auth::TokenHash;

/// An event ready to be persisted. The timestamp is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub token_hash: TokenHash,
    pub event_name: String,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub device: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: serde_json::Value,
}

/// A stored, immutable event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    #[serde(skip)]
    pub token_hash: Option<TokenHash>,
    #[serde(rename = "event")]
    pub event_name: String,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub device: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCount {
    pub device: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerCount {
    pub referrer: Option<String>,
    pub count: i64,
}

/// Aggregate over a credential's events, optionally narrowed to one event name.
/// This is also the cached payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub total_events: i64,
    pub by_device: Vec<DeviceCount>,
    pub by_referrer: Vec<ReferrerCount>,
}

/// Activity of one end user under a credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    pub total_events: i64,
    pub recent_events: Vec<Event>,
    pub by_device: Vec<DeviceCount>,
}
