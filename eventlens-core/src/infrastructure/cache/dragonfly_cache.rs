//! Dragonfly database cache implementation
//!
//! Payloads are wrapped in an envelope that carries their own expiry, so an
//! entry is never served past its TTL even if the server-side expiry lags.
// cspell:ignore Dragonfly GzEncoder GzDecoder flate

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::application::cache::CacheStore;
use crate::domain::errors::StoreError;

const COMPRESSION_MARKER: &[u8; 4] = b"GZIP";

/// Cache entry metadata wrapper
#[derive(serde::Serialize, serde::Deserialize)]
struct CacheEntry {
    data: String,
    created_at_ms: u64,
    expires_at_ms: u64,
}

/// Dragonfly database cache implementation
#[derive(Clone)]
pub struct DragonflyCache {
    connection_manager: ConnectionManager,
    enable_compression: bool,
    compression_threshold_bytes: u64,
}

impl DragonflyCache {
    /// Connect and PING the server.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the connection cannot be established
    pub async fn new(
        url: &str,
        enable_compression: bool,
        compression_threshold_bytes: u64,
    ) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            StoreError::Unavailable(format!("invalid Dragonfly URL: {}", e))
        })?;

        let connection_manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to create connection manager: {}", e);
            StoreError::from(e)
        })?;

        let mut conn = connection_manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| {
                error!("Failed to ping the Dragonfly database: {}", e);
                StoreError::from(e)
            })?;

        debug!("Successfully connected to the Dragonfly database");

        Ok(Self {
            connection_manager,
            enable_compression,
            compression_threshold_bytes,
        })
    }

    fn compress_data(data: &[u8]) -> Result<Vec<u8>, StoreError> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(data)
            .map_err(|e| StoreError::Corrupt(format!("compression error: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| StoreError::Corrupt(format!("compression finish error: {}", e)))
    }

    fn decompress_data(data: &[u8]) -> Result<Vec<u8>, StoreError> {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let mut decoder = GzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| StoreError::Corrupt(format!("decompression error: {}", e)))?;
        Ok(decompressed)
    }

    fn current_timestamp_ms() -> u64 {
        let elapsed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Envelope `payload`, gzip-framing it when the envelope exceeds `compress_above` bytes
    fn encode(
        payload: &str,
        ttl: Duration,
        now_ms: u64,
        compress_above: Option<u64>,
    ) -> Result<Vec<u8>, StoreError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let entry = CacheEntry {
            data: payload.to_string(),
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        };
        let serialized =
            serde_json::to_vec(&entry).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if compress_above.is_some_and(|threshold| serialized.len() as u64 > threshold) {
            let mut framed = COMPRESSION_MARKER.to_vec();
            framed.extend_from_slice(&Self::compress_data(&serialized)?);
            Ok(framed)
        } else {
            Ok(serialized)
        }
    }

    /// Returns the payload, or `None` if the envelope has expired at `now_ms`
    fn decode(raw: &[u8], now_ms: u64) -> Result<Option<String>, StoreError> {
        let bytes = match raw.strip_prefix(COMPRESSION_MARKER.as_slice()) {
            Some(compressed) => Self::decompress_data(compressed)?,
            None => raw.to_vec(),
        };
        let entry: CacheEntry =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if now_ms >= entry.expires_at_ms {
            return Ok(None);
        }
        Ok(Some(entry.data))
    }
}

#[async_trait]
impl CacheStore for DragonflyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection_manager.clone();

        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Failed to get cache key {}: {}", key, e);
                StoreError::from(e)
            })?;

        let Some(raw) = value else {
            return Ok(None);
        };

        match Self::decode(&raw, Self::current_timestamp_ms()) {
            Ok(Some(payload)) => Ok(Some(payload)),
            Ok(None) => {
                debug!("Cache entry expired for key: {}", key);
                if let Err(e) = redis::cmd("DEL").arg(key).query_async::<i64>(&mut conn).await {
                    warn!("Failed to delete expired key {}: {}", key, e);
                }
                Ok(None)
            }
            Err(e) => {
                warn!("Unreadable cache entry for key {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection_manager.clone();
        let data = Self::encode(
            payload,
            ttl,
            Self::current_timestamp_ms(),
            self.enable_compression
                .then_some(self.compression_threshold_bytes),
        )?;

        // PX keeps sub-second TTLs intact
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        redis::cmd("SET")
            .arg(key)
            .arg(data)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| {
                error!("Failed to set cache key {}: {}", key, e);
                StoreError::from(e)
            })?;

        debug!("Cached entry for key: {} with TTL: {}ms", key, ttl_ms);
        Ok(())
    }

    async fn invalidate(&self, keys: &[String]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection_manager.clone();

        let deleted: i64 = redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Failed to invalidate cache keys {:?}: {}", keys, e);
                StoreError::from(e)
            })?;

        debug!("Invalidated {} of {} cache keys", deleted, keys.len());
        Ok(())
    }
}
