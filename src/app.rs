//! Application setup and wiring

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

use eventlens_core::Config;
use eventlens_core::application::CacheStore;
use eventlens_core::domain::analytics::IEventRepository;
use eventlens_core::domain::auth::ICredentialRepository;
use eventlens_core::infrastructure::{
    DragonflyCache, MemoryCache, QuotaLimiter, SqlxCredentialRepository, SqlxEventRepository,
};
use eventlens_gateway::{GatewayState, create_router};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Every store the application runs on
pub struct AppStores {
    pub credentials: Arc<dyn ICredentialRepository>,
    pub events: Arc<dyn IEventRepository>,
    pub cache: Arc<dyn CacheStore>,
    pub quota_limiter: Arc<QuotaLimiter>,
}

/// Build the router over already-constructed stores and start background tasks
pub fn assemble_app(config: &Config, stores: AppStores) -> AppHandle {
    let shutdown_token = CancellationToken::new();

    if stores.quota_limiter.is_enabled() {
        stores
            .quota_limiter
            .start_cleanup_task(shutdown_token.clone());
    }

    let state = GatewayState::new(
        stores.credentials,
        stores.events,
        stores.cache,
        stores.quota_limiter,
        config,
    );

    AppHandle {
        router: create_router(state, &config.server),
        shutdown_token,
    }
}

/// Connect to PostgreSQL and Dragonfly, then create the application router
pub async fn create_app(
    config: Config,
) -> Result<AppHandle, Box<dyn std::error::Error + Send + Sync>> {
    let startup_time = Instant::now();
    let op_timeout = config.stores.operation_timeout();

    // Initialize database pool
    let db_pool = Arc::new(
        PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_idle.unwrap_or(0))
            .acquire_timeout(std::time::Duration::from_secs(
                config.database.connect_timeout_seconds,
            ))
            .max_lifetime(
                config
                    .database
                    .max_lifetime_seconds
                    .map(std::time::Duration::from_secs),
            )
            .idle_timeout(
                config
                    .database
                    .idle_timeout_seconds
                    .map(std::time::Duration::from_secs),
            )
            .test_before_acquire(config.database.enable_health_checks)
            .connect(&config.database.url)
            .await?,
    );

    let cache: Arc<dyn CacheStore> = if config.cache.dragonfly_enabled {
        tracing::info!(
            "Initializing Dragonfly DB cache at {}",
            config.cache.dragonfly_url
        );
        Arc::new(
            DragonflyCache::new(
                &config.cache.dragonfly_url,
                config.cache.enable_cache_compression,
                config.cache.compression_threshold_bytes,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to initialize Dragonfly DB cache: {}", e);
                e
            })?,
        )
    } else {
        tracing::info!(
            max_entries = config.cache.memory_max_entries,
            "Dragonfly disabled; using in-memory aggregate cache"
        );
        Arc::new(MemoryCache::new(config.cache.memory_max_entries))
    };

    let quota_limiter = Arc::new(
        QuotaLimiter::new_with_url(
            config.quota.clone(),
            &config.cache.dragonfly_url,
            op_timeout,
        )
        .await,
    );

    let stores = AppStores {
        credentials: Arc::new(SqlxCredentialRepository::new(db_pool.clone())),
        events: Arc::new(SqlxEventRepository::new(db_pool)),
        cache,
        quota_limiter,
    };

    let handle = assemble_app(&config, stores);

    tracing::info!(
        startup_ms = startup_time.elapsed().as_millis(),
        "Application initialized"
    );

    Ok(handle)
}
