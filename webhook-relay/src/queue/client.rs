//! Queue client abstraction.

use async_trait::async_trait;

use super::types::QueueMessage;
use crate::error::RelayError;

/// Something that can accept a message and return its assigned id.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Submit a message, returning the queue-assigned message id.
    async fn send(&self, message: QueueMessage) -> Result<String, RelayError>;
}
