//! EventLens - Main application entry point
//!
//! Starts the HTTP API server.

use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;

use eventlens::{Config, create_app, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize rustls crypto provider before any TLS operations
    let _ = rustls::crypto::ring::default_provider().install_default();

    run_server().await
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // Only warn if it's not a "file not found" error
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let config = Config::load().context(
        "Failed to load configuration. Check DATABASE_URL and EVENTLENS__* env vars",
    )?;

    // Initialize tracing (after config is loaded so we can use logging config)
    init_tracing(&config.logging)?;

    tracing::info!("Starting EventLens server...");
    tracing::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let app_handle = create_app(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create application: {}", e))?;

    let addr = SocketAddr::new(
        server_host
            .parse()
            .with_context(|| format!("Invalid server host {}", server_host))?,
        server_port,
    );

    tracing::info!("Server listening on {}", addr);

    // Start server with graceful shutdown; peer addresses feed the client IP fallback
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app_handle
            .router
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(app_handle.shutdown_token, shutdown_timeout))
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals and cancel background tasks
async fn shutdown_signal(shutdown_token: CancellationToken, timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }

    tracing::info!("Cancelling background tasks...");
    shutdown_token.cancel();

    tokio::time::sleep(timeout).await;
    tracing::info!("Background tasks shutdown timeout reached");
}
