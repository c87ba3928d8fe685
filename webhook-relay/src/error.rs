//! Relay error types.

use thiserror::Error;

/// Failure to build message attributes from event metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    /// SQS rejects empty string attribute values.
    #[error("attribute {0} has an empty value")]
    EmptyValue(&'static str),
}

/// Failure to hand a message to the queue service.
///
/// Either way the event is dropped after logging.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The queue service could not be reached (transport, timeout, 5xx).
    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),

    /// The queue service, or the relay on its behalf, refused the message.
    #[error("queue rejected message: {0}")]
    QueueRejected(String),
}

impl RelayError {
    /// Stable label used in logs and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::QueueUnavailable(_) => "queue_unavailable",
            RelayError::QueueRejected(_) => "queue_rejected",
        }
    }
}

impl From<AttributeError> for RelayError {
    fn from(err: AttributeError) -> Self {
        RelayError::QueueRejected(err.to_string())
    }
}
