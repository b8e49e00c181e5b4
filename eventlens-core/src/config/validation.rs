//! Configuration validation module

use crate::config::{
    CacheConfig, Config, CredentialConfig, DatabaseConfig, LoggingConfig, QuotaConfig,
    ServerConfig, StoreConfig,
};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Database configuration error: {message}")]
    Database { message: String },

    #[error("Cache configuration error: {message}")]
    Cache { message: String },

    #[error("Credential configuration error: {message}")]
    Credentials { message: String },

    #[error("Quota configuration error: {message}")]
    Quota { message: String },

    #[error("Store configuration error: {message}")]
    Stores { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::Quota {
            message: message.into(),
        }
    }

    pub fn stores(message: impl Into<String>) -> Self {
        Self::Stores {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // u16 cannot exceed 65535, so only 0 is out of range
        if self.port == 0 {
            return Err(ValidationError::server(format!(
                "Port must be in range 1-65535, got {}",
                self.port
            )));
        }

        if self.host.is_empty() {
            return Err(ValidationError::server("Host cannot be empty"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::server(
                "Request timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::database("Database URL cannot be empty"));
        }

        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::database(
                "Database URL must start with postgres:// or postgresql://",
            ));
        }

        if self.max_connections == 0 {
            return Err(ValidationError::database(
                "max_connections must be greater than 0",
            ));
        }

        if let Some(min_idle) = self.min_idle
            && min_idle > self.max_connections
        {
            return Err(ValidationError::database(format!(
                "min_idle ({}) cannot exceed max_connections ({})",
                min_idle, self.max_connections
            )));
        }

        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.summary_ttl_seconds == 0 {
            return Err(ValidationError::cache(
                "Summary TTL must be greater than 0 seconds",
            ));
        }

        if self.dragonfly_enabled
            && !self.dragonfly_url.starts_with("redis://")
            && !self.dragonfly_url.starts_with("rediss://")
        {
            return Err(ValidationError::cache(format!(
                "dragonfly_url must start with redis:// or rediss://, got: {}",
                self.dragonfly_url
            )));
        }

        if self.memory_max_entries == 0 {
            return Err(ValidationError::cache(
                "memory_max_entries must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Ten years
const MAX_EXPIRY_DAYS: i64 = 3650;

impl Validate for CredentialConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 16 bytes is the floor for 128 bits of entropy
        if self.token_bytes < 16 {
            return Err(ValidationError::credentials(format!(
                "token_bytes must be at least 16, got {}",
                self.token_bytes
            )));
        }

        if self.expiry_days <= 0 || self.expiry_days > MAX_EXPIRY_DAYS {
            return Err(ValidationError::credentials(format!(
                "expiry_days must be between 1 and {}, got {}",
                MAX_EXPIRY_DAYS, self.expiry_days
            )));
        }

        if self.header_name.trim().is_empty() {
            return Err(ValidationError::credentials("header_name cannot be empty"));
        }

        if header_name_is_invalid(&self.header_name) {
            return Err(ValidationError::credentials(format!(
                "header_name is not a valid HTTP header name: {}",
                self.header_name
            )));
        }

        Ok(())
    }
}

/// Header names must be RFC 7230 tokens.
fn header_name_is_invalid(name: &str) -> bool {
    !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

impl Validate for QuotaConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.window_seconds == 0 {
            return Err(ValidationError::quota(
                "window_seconds must be greater than 0",
            ));
        }

        if self.max_requests == 0 {
            return Err(ValidationError::quota("max_requests must be greater than 0"));
        }

        if self.cleanup_interval_seconds == 0 {
            return Err(ValidationError::quota(
                "cleanup_interval_seconds must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.operation_timeout_ms == 0 {
            return Err(ValidationError::stores(
                "operation_timeout_ms must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.level.trim().is_empty() {
            return Err(ValidationError::logging("Log level cannot be empty"));
        }

        match self.format.to_ascii_lowercase().as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "Log format must be \"json\" or \"pretty\", got: {}",
                other
            ))),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.cache.validate()?;
        self.credentials.validate()?;
        self.quota.validate()?;
        self.stores.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
