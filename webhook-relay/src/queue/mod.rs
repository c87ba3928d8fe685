//! Queue module for the relay's single outbound hop.
//!
//! This module provides:
//! - Message types submitted to the queue service
//! - The `QueueClient` seam the relay depends on
//! - An SQS implementation of that seam
//!
//! ## Architecture
//!
//! ```text
//! Web Server → Dispatcher → Relay → QueueClient → SQS
//! ```

pub mod client;
pub mod sqs;
pub mod types;

pub use client::QueueClient;
pub use sqs::SqsQueueClient;
pub use types::{
    AttributeValue, DataType, MessageAttributes, QueueMessage, DELIVERY_DELAY,
    EVENT_TYPE_ATTRIBUTE, SOURCE_ATTRIBUTE, TIMESTAMP_ATTRIBUTE,
};
