//! Infrastructure: store implementations and resilience helpers

pub mod analytics;
pub mod auth;
pub mod cache;
pub mod rate_limiter;
pub mod resilience;

pub use analytics::SqlxEventRepository;
pub use auth::{SqlxCredentialRepository, TokenGenerator};
pub use cache::{DragonflyCache, MemoryCache};
pub use rate_limiter::QuotaLimiter;
