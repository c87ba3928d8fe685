//! Request rejections at the receiver boundary.
//!
//! Nothing here reaches the relay; the provider sees a client-error status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::handlers::WebhookResponse;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing X-Hub-Signature-256 header")]
    MissingSignature,

    #[error("signature does not match payload")]
    InvalidSignature,

    #[error("missing X-GitHub-Event header")]
    MissingEventType,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::MissingEventType | WebhookError::MalformedPayload(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => "unauthorized",
            WebhookError::MissingEventType | WebhookError::MalformedPayload(_) => {
                "malformed_request"
            }
        };

        (
            self.status_code(),
            Json(WebhookResponse {
                status,
                message_id: None,
                error: Some(self.to_string()),
            }),
        )
            .into_response()
    }
}
