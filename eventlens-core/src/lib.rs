//! EventLens Core - Domain, use cases and stores for the EventLens analytics service
//!
//! # Modules
//!
//! - [`config`]: Strongly-typed configuration with TOML and environment variable support
//! - [`domain`]: Credentials, events, aggregates and their repository traits
//! - [`application`]: Use cases, the cache-aside read path and the error taxonomy
//! - [`infrastructure`]: PostgreSQL repositories, Dragonfly/Redis and in-memory stores
//! - [`logging`]: Structured logging with tracing
//!
//! # Architecture
//!
//! ```text
//! eventlens-core/
//! ├── domain/           # Entities, value objects, repository traits
//! ├── application/      # Use cases, cache-aside, ApplicationError
//! ├── infrastructure/
//! │   ├── auth/         # Token generation, credential repository
//! │   ├── analytics/    # Event repository
//! │   ├── cache/        # Dragonfly and moka cache stores
//! │   └── rate_limiter/ # Fixed-window quota limiter
//! └── config/           # Configuration management
//! ```
//!
//! # Configuration
//!
//! Environment variables use the `EVENTLENS__` prefix with double underscore separators:
//!
//! ```bash
//! EVENTLENS__SERVER__PORT=3000
//! EVENTLENS__QUOTA__MAX_REQUESTS=30
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::Config;
pub use logging::init_tracing;
