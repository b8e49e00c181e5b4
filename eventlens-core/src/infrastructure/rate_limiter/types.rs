//! Quota limiter types

use std::time::{SystemTime, UNIX_EPOCH};

use crate::application::errors::ApplicationError;
use crate::domain::auth::TokenHash;

/// Whose requests a window counts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuotaIdentity {
    /// A presented token, by digest
    Token(TokenHash),
    /// Client network address when no token was presented
    Ip(String),
}

impl QuotaIdentity {
    pub fn kind(&self) -> &'static str {
        match self {
            QuotaIdentity::Token(_) => "token",
            QuotaIdentity::Ip(_) => "ip",
        }
    }

    /// Counter key for the window starting at `window_start`
    pub fn to_redis_key(&self, prefix: &str, window_start: u64) -> String {
        match self {
            QuotaIdentity::Token(hash) => format!("{}:token:{}:{}", prefix, hash, window_start),
            QuotaIdentity::Ip(ip) => format!("{}:ip:{}:{}", prefix, ip, window_start),
        }
    }
}

/// Outcome of one quota check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// Requests admitted per window
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp when the current window ends
    pub reset_at: u64,
    /// Seconds until the window ends (only set when blocked)
    pub retry_after: Option<u64>,
}

impl QuotaDecision {
    pub fn allowed(limit: u64, remaining: u64, reset_at: u64) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            reset_at,
            retry_after: None,
        }
    }

    pub fn blocked(limit: u64, reset_at: u64, retry_after: u64) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_at,
            retry_after: Some(retry_after),
        }
    }

    /// `RateLimited` when blocked
    pub fn into_result(self) -> Result<Self, ApplicationError> {
        match self.retry_after {
            Some(retry_after_secs) if !self.allowed => Err(ApplicationError::RateLimited {
                limit: self.limit,
                retry_after_secs,
            }),
            _ => Ok(self),
        }
    }
}

/// Start of the window containing `now`
pub fn window_start(now: u64, window_secs: u64) -> u64 {
    now - now % window_secs
}

/// Get current Unix timestamp in seconds
pub fn current_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
