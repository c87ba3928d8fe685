//! Webhook relay - GitHub webhook to SQS forwarder.
//!
//! Receives webhook deliveries over HTTP, classifies the event type, attaches
//! metadata attributes and enqueues each delivery once. Events are not
//! processed, validated for business meaning, or deduplicated here.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → Web Server → Dispatcher → Relay → QueueClient → SQS
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod queue;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{Delivery, Dispatcher, EventHandler, RelayHandler};
pub use error::{AttributeError, RelayError};
pub use event::{Event, EventType};
pub use queue::{MessageAttributes, QueueClient, QueueMessage, SqsQueueClient};
pub use relay::{build_attributes, Disposition, Relay};
pub use web::{router, AppState};
