//! EventLens - Main application library
//!
//! Wires the core stores and use cases into the HTTP gateway

mod app;

pub use app::{AppHandle, AppStores, assemble_app, create_app};
pub use eventlens_core::{Config, init_tracing};
pub use eventlens_gateway::GatewayState;

// Re-export for convenience
pub use eventlens_core;
pub use eventlens_gateway;
