//! Application layer: use cases, cache-aside and the error taxonomy

pub mod analytics;
pub mod auth;
pub mod cache;
pub mod errors;

pub use cache::{CacheStore, cache_aside};
pub use errors::{ApplicationError, ErrorKind};
