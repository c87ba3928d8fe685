//! Webhook endpoint handlers.
//!
//! The delivery handler only:
//! 1. Verifies the signature
//! 2. Classifies the event and extracts the JSON payload
//! 3. Hands it to the dispatcher and reports the outcome
//!
//! Every well-formed, authenticated delivery gets 200, whether or not the
//! enqueue succeeded. Queue failures are visible in logs only.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::{de::IgnoredAny, Serialize};
use tracing::{debug, info, warn};

use crate::dispatch::{Delivery, Dispatcher};
use crate::relay::Disposition;
use crate::web::error::WebhookError;
use crate::web::signature::{
    is_signature_verification_enabled, verify_github_signature, SIGNATURE_HEADER,
};
use crate::Config;

/// Header naming the event type.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Header carrying the unique delivery id.
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

// =============================================================================
// Greeting / Health Check
// =============================================================================

/// Fixed greeting served at `/`.
pub async fn greeting(State(state): State<AppState>) -> String {
    debug!("greeting_requested");
    state.config.greeting.clone()
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    fn from_disposition(disposition: Option<Disposition>) -> Self {
        match disposition {
            Some(Disposition::Enqueued { message_id }) => Self {
                status: "enqueued",
                message_id: Some(message_id),
                error: None,
            },
            Some(Disposition::Dropped { error_kind }) => Self {
                status: "dropped",
                message_id: None,
                error: Some(error_kind.to_string()),
            },
            None => Self {
                status: "ignored",
                message_id: None,
                error: None,
            },
        }
    }
}

/// GitHub webhook endpoint.
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let event_name = header_str(&headers, EVENT_HEADER);
    let delivery_id = header_str(&headers, DELIVERY_HEADER).map(str::to_string);

    info!(
        event = ?event_name,
        delivery_id = ?delivery_id,
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        "webhook_received"
    );

    // Verify signature if a secret is configured
    if is_signature_verification_enabled(&state.config.webhook_secret) {
        let secret = state.config.webhook_secret.as_deref().unwrap_or_default();
        let signature = match header_str(&headers, SIGNATURE_HEADER) {
            Some(signature) => signature,
            None => {
                warn!(delivery_id = ?delivery_id, "github_signature_missing");
                return Err(WebhookError::MissingSignature);
            }
        };

        if !verify_github_signature(secret, &body, signature) {
            warn!(delivery_id = ?delivery_id, "github_signature_invalid");
            return Err(WebhookError::InvalidSignature);
        }
    }

    let event_name = match event_name {
        Some(name) => name,
        None => {
            warn!(delivery_id = ?delivery_id, "github_event_header_missing");
            return Err(WebhookError::MissingEventType);
        }
    };

    let payload = extract_payload(&headers, body).map_err(|e| {
        warn!(event = %event_name, delivery_id = ?delivery_id, error = %e, "github_payload_malformed");
        e
    })?;

    let disposition = state
        .dispatcher
        .dispatch(
            event_name,
            Delivery {
                body: payload,
                delivery_id: delivery_id.clone(),
            },
        )
        .await;

    if disposition.is_none() {
        info!(event = %event_name, delivery_id = ?delivery_id, "webhook_event_ignored");
    }

    Ok(Json(WebhookResponse::from_disposition(disposition)))
}

/// Pull the JSON payload out of a JSON or form-encoded body.
fn extract_payload(headers: &HeaderMap, body: Bytes) -> Result<Bytes, WebhookError> {
    let is_form = header_str(headers, CONTENT_TYPE.as_str())
        .and_then(|ct| ct.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false);

    let payload = if is_form {
        url::form_urlencoded::parse(&body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| Bytes::from(value.into_owned()))
            .ok_or_else(|| WebhookError::MalformedPayload("form body has no payload field".into()))?
    } else {
        body
    };

    serde_json::from_slice::<IgnoredAny>(&payload)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    Ok(payload)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
