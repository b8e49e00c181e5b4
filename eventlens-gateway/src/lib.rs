//! EventLens Gateway - HTTP presentation layer
//!
//! Routes, the credential gate and quota middleware, and the JSON models
//! exchanged with clients. All behaviour lives in `eventlens-core`; this crate
//! only translates between HTTP and use cases.

pub mod presentation;

pub use presentation::controllers::GatewayState;
pub use presentation::routes::create_router;
