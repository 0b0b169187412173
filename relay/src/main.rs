//! Archive relay web server.
//!
//! Receives Bitbucket Server push webhooks, verifies their signatures,
//! downloads the pushed branch archive, and stores it in object storage.
//! One delivery is one transaction; there is no queueing and no retry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::web::{bitbucket_webhook, health, AppState};
use relay::{BitbucketClient, Config, FileSecretProvider, HttpObjectStore, Relay};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        secret_name_set = !config.secret_name.is_empty(),
        server_url_set = !config.server_url.is_empty(),
        bucket_set = !config.bucket.is_empty(),
        store_endpoint_set = !config.store_endpoint.is_empty(),
        proxy_configured = config.proxy.is_some(),
        request_timeout_ms = config.request_timeout_ms,
        "config_loaded"
    );

    let timeout = Duration::from_millis(config.request_timeout_ms);

    // Outbound clients are built once and reused across deliveries. Only
    // the Bitbucket client goes through the forward proxy.
    let fetcher = BitbucketClient::new(timeout, config.proxy.as_ref())
        .context("Failed to build Bitbucket client")?;

    let store_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build object store client")?;
    let publisher = HttpObjectStore::new(store_client, config.store_endpoint.clone());

    let relay = Relay::new(
        config.clone(),
        Arc::new(FileSecretProvider),
        Arc::new(fetcher),
        Arc::new(publisher),
    );
    let state = AppState::new(relay);

    // Build the router
    let app = Router::new()
        .route("/health", get(health))
        .route("/webhooks/bitbucket", post(bitbucket_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("relay_shutting_down");
}
