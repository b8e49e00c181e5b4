//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eventlens_core::application::analytics::RecordEventInput;

/// Error response body shared by every rejection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Stable machine-readable kind, e.g. `Revoked`
    pub code: String,

    /// Human-readable message
    pub message: String,

    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    pub request_id: Uuid,

    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Event submission body. Every field is optional at the wire level so that
/// a missing `event` surfaces as a validation error rather than a decode error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectEventRequest {
    pub event: Option<String>,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub device: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl From<CollectEventRequest> for RecordEventInput {
    fn from(request: CollectEventRequest) -> Self {
        RecordEventInput {
            event: request.event,
            url: request.url,
            referrer: request.referrer,
            device: request.device,
            user_id: request.user_id,
            ip_address: request.ip_address,
            metadata: request.metadata,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectEventResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventSummaryQuery {
    pub event: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsQuery {
    pub user_id: Option<String>,
}
