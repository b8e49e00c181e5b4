//! Quota limiter service
//!
//! Fixed-window limiter keyed by credential digest or client address. It has
//! no knowledge of credential validity and is safe to call with or without a
//! preceding credential check.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::storage::{DragonflyQuotaStorage, InMemoryQuotaStorage, QuotaCounterStore};
use super::types::{QuotaDecision, QuotaIdentity, current_time_secs, window_start};
use crate::application::errors::ApplicationError;
use crate::config::{QuotaConfig, QuotaStorageBackend};
use crate::infrastructure::resilience::with_timeout;

const KEY_PREFIX: &str = "quota";
const DEPENDENCY: &str = "quota_counter";

/// Per-identity fixed-window request quota
pub struct QuotaLimiter {
    storage: Arc<dyn QuotaCounterStore>,
    config: QuotaConfig,
    op_timeout: Duration,
    /// Unix seconds source for `check`
    clock: fn() -> u64,
}

impl QuotaLimiter {
    /// Create a limiter with the configured backend, falling back to memory
    /// when Dragonfly cannot be reached at startup
    pub async fn new_with_url(
        config: QuotaConfig,
        dragonfly_url: &str,
        op_timeout: Duration,
    ) -> Self {
        let storage: Arc<dyn QuotaCounterStore> = match config.storage_backend {
            QuotaStorageBackend::Dragonfly => {
                match DragonflyQuotaStorage::new(dragonfly_url).await {
                    Ok(storage) => {
                        info!("Quota limiter using Dragonfly storage backend");
                        Arc::new(storage)
                    }
                    Err(e) => {
                        warn!(
                            "Failed to connect to Dragonfly for quota counting, falling back to in-memory: {}",
                            e
                        );
                        Arc::new(InMemoryQuotaStorage::new())
                    }
                }
            }
            QuotaStorageBackend::Memory => {
                info!("Quota limiter using in-memory storage backend");
                Arc::new(InMemoryQuotaStorage::new())
            }
        };

        Self::with_storage(storage, config, op_timeout)
    }

    /// Create with a custom storage backend (for testing)
    pub fn with_storage(
        storage: Arc<dyn QuotaCounterStore>,
        config: QuotaConfig,
        op_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            config,
            op_timeout,
            clock: current_time_secs,
        }
    }

    /// Replace the wall clock `check` reads windows from
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn limit(&self) -> u64 {
        self.config.max_requests
    }

    /// Count one request for `identity` in the current window
    pub async fn check(&self, identity: &QuotaIdentity) -> Result<QuotaDecision, ApplicationError> {
        self.check_at(identity, (self.clock)()).await
    }

    /// Count one request for `identity` in the window containing `now` (Unix seconds).
    ///
    /// Returns a blocked decision once the window's count exceeds the ceiling;
    /// counter-store failures and timeouts are `Unavailable`.
    pub async fn check_at(
        &self,
        identity: &QuotaIdentity,
        now: u64,
    ) -> Result<QuotaDecision, ApplicationError> {
        let limit = self.config.max_requests;
        if !self.config.enabled {
            return Ok(QuotaDecision::allowed(limit, limit, 0));
        }

        let window_secs = self.config.window_seconds;
        let start = window_start(now, window_secs);
        let reset_at = start + window_secs;
        let key = identity.to_redis_key(KEY_PREFIX, start);

        let count = with_timeout(self.op_timeout, self.storage.increment(&key, window_secs))
            .await
            .map_err(|e| ApplicationError::store(DEPENDENCY, e))?;

        if count <= limit {
            debug!(identity = identity.kind(), count, limit, "Quota check passed");
            Ok(QuotaDecision::allowed(limit, limit - count, reset_at))
        } else {
            let retry_after = (reset_at - now).max(1);
            Ok(QuotaDecision::blocked(limit, reset_at, retry_after))
        }
    }

    /// Periodically sweep expired counters until `shutdown` is cancelled
    pub fn start_cleanup_task(self: &Arc<Self>, shutdown: CancellationToken) {
        let limiter = Arc::clone(self);
        let period = Duration::from_secs(self.config.cleanup_interval_seconds);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => limiter.storage.cleanup().await,
                    _ = shutdown.cancelled() => {
                        debug!("Quota cleanup task shutting down");
                        return;
                    }
                }
            }
        });
    }
}
