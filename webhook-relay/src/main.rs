//! Webhook relay server.
//!
//! This binary:
//! - Receives GitHub webhooks
//! - Verifies their signatures
//! - Enqueues known event types to SQS with metadata attributes
//! - Returns 200 OK once the enqueue outcome is known

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webhook_relay::web::is_signature_verification_enabled;
use webhook_relay::{router, AppState, Config, Dispatcher, Relay, SqsQueueClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("webhook_relay_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_path = %config.webhook_path,
        event_source = %config.event_source,
        signature_verification = is_signature_verification_enabled(&config.webhook_secret),
        max_message_bytes = config.max_message_bytes,
        "config_loaded"
    );

    if !is_signature_verification_enabled(&config.webhook_secret) {
        warn!("github_webhook_secret_not_configured");
    }

    let queue_url = config
        .queue_url
        .clone()
        .context("QUEUE_URL must be set")?;

    // Create the queue client and everything that depends on it
    let client = SqsQueueClient::from_config(&config, queue_url).await;
    let relay = Relay::new(Arc::new(client), config.max_message_bytes);
    let dispatcher = Dispatcher::github(relay, &config.event_source, &config.enabled_events);
    info!(events = ?dispatcher.event_names(), "dispatcher_ready");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, dispatcher));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("webhook_relay_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
