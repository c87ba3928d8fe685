//! Web server module for receiving GitHub webhooks.
//!
//! This module provides a thin web server that:
//! - Verifies delivery signatures
//! - Classifies the event from the `X-GitHub-Event` header
//! - Relays known event types to the queue, ignoring the rest
//! - Returns 200 OK for every authenticated, well-formed delivery

pub mod error;
pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::WebhookError;
pub use handlers::{
    github_webhook, greeting, health, AppState, HealthResponse, WebhookResponse,
    DELIVERY_HEADER, EVENT_HEADER,
};
pub use signature::{is_signature_verification_enabled, verify_github_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let webhook_path = state.config.webhook_path.clone();

    Router::new()
        .route("/", get(greeting))
        .route("/health", get(health))
        .route(&webhook_path, post(github_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
