//! Queue message types.
//!
//! This module defines what the relay submits to the queue service:
//! - `MessageAttributes`: named string metadata, distinct from the body
//! - `QueueMessage`: attributes, body and delivery options for one send

use std::collections::BTreeMap;
use std::time::Duration;

/// Delivery delay applied to every message.
///
/// Gives downstream consumers a window to suppress near-duplicates.
pub const DELIVERY_DELAY: Duration = Duration::from_secs(10);

/// Attribute carrying the provider name.
pub const SOURCE_ATTRIBUTE: &str = "Source";

/// Attribute carrying the receipt time.
pub const TIMESTAMP_ATTRIBUTE: &str = "Timestamp";

/// Attribute carrying the event type.
pub const EVENT_TYPE_ATTRIBUTE: &str = "EventType";

// =============================================================================
// Message Attributes
// =============================================================================

/// SQS attribute data type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "String",
        }
    }
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    pub data_type: DataType,
    pub string_value: String,
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: DataType::String,
            string_value: value.into(),
        }
    }
}

/// Attribute name to value, ordered by name.
pub type MessageAttributes = BTreeMap<String, AttributeValue>;

// =============================================================================
// Queue Message
// =============================================================================

/// One message ready for submission.
///
/// Ownership passes to the queue client; the relay keeps no reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Metadata attached to the message
    pub attributes: MessageAttributes,
    /// Raw webhook payload
    pub body: String,
    /// Delay before the message becomes visible to consumers
    pub delay: Duration,
}

impl QueueMessage {
    /// Create a message with the standard delivery delay.
    pub fn new(attributes: MessageAttributes, body: String) -> Self {
        Self {
            attributes,
            body,
            delay: DELIVERY_DELAY,
        }
    }

    /// Size as counted against the SQS message limit.
    ///
    /// The body plus each attribute's name, data type and value.
    pub fn size(&self) -> usize {
        let attributes: usize = self
            .attributes
            .iter()
            .map(|(name, value)| name.len() + value.data_type.as_str().len() + value.string_value.len())
            .sum();

        self.body.len() + attributes
    }
}
