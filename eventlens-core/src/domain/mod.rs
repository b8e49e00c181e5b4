//! Domain layer: credentials, events and aggregates

pub mod analytics;
pub mod auth;
pub mod errors;

pub use errors::StoreError;
