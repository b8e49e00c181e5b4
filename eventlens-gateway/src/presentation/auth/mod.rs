//! Credential management endpoints and request extractors

pub mod controller;
pub mod extractors;
pub mod models;

pub use extractors::{AuthenticatedCredential, ClientIp};
