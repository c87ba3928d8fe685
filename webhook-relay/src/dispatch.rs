//! Event-type dispatch table.
//!
//! Maps `X-GitHub-Event` names to handlers. The table is built once at
//! startup and only read afterwards; names without a handler are ignored.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use tracing::debug;

use crate::event::{Event, EventType};
use crate::relay::{Disposition, Relay};

/// A verified delivery, ready for a handler.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// JSON payload
    pub body: Bytes,
    /// Value of `X-GitHub-Delivery`, if sent
    pub delivery_id: Option<String>,
}

/// Handles deliveries of one event type.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, delivery: Delivery) -> Disposition;
}

/// Stamps a delivery as an [`Event`] and hands it to the [`Relay`].
pub struct RelayHandler {
    relay: Relay,
    source: Arc<str>,
    event_type: EventType,
}

impl RelayHandler {
    pub fn new(relay: Relay, source: Arc<str>, event_type: EventType) -> Self {
        Self {
            relay,
            source,
            event_type,
        }
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn handle(&self, delivery: Delivery) -> Disposition {
        debug!(event_type = %self.event_type, "event_handler_invoked");
        let event = Event::new(&*self.source, self.event_type, delivery.body);
        self.relay.relay(event, delivery.delivery_id).await
    }
}

/// Event name to handler.
#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one relay handler per enabled GitHub event type.
    pub fn github(relay: Relay, source: &str, enabled: &[EventType]) -> Self {
        let source: Arc<str> = Arc::from(source);
        let mut dispatcher = Self::new();
        for &event_type in enabled {
            dispatcher.register(
                event_type.as_str(),
                Arc::new(RelayHandler::new(relay.clone(), source.clone(), event_type)),
            );
        }
        dispatcher
    }

    /// Register a handler, replacing any previous one for the name.
    pub fn register(&mut self, event_name: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(event_name.into(), handler);
    }

    /// Registered event names, sorted.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler for `event_name`, or return `None` if there is none.
    pub async fn dispatch(&self, event_name: &str, delivery: Delivery) -> Option<Disposition> {
        let handler = self.handlers.get(event_name)?;
        Some(handler.handle(delivery).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _delivery: Delivery) -> Disposition {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Disposition::Enqueued {
                message_id: "counted".to_string(),
            }
        }
    }

    fn delivery() -> Delivery {
        Delivery {
            body: Bytes::from_static(b"{}"),
            delivery_id: None,
        }
    }

    #[tokio::test]
    async fn test_dispatch_registered() {
        let handler = Arc::new(CountingHandler {
            calls: AtomicUsize::new(0),
        });
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("push", handler.clone());

        let disposition = dispatcher.dispatch("push", delivery()).await;

        assert_eq!(
            disposition,
            Some(Disposition::Enqueued {
                message_id: "counted".to_string()
            })
        );
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_is_none() {
        let handler = Arc::new(CountingHandler {
            calls: AtomicUsize::new(0),
        });
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("push", handler.clone());

        assert_eq!(dispatcher.dispatch("ping", delivery()).await, None);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_names_sorted() {
        let mut dispatcher = Dispatcher::new();
        for name in ["push", "issues", "issue_comment"] {
            dispatcher.register(
                name,
                Arc::new(CountingHandler {
                    calls: AtomicUsize::new(0),
                }),
            );
        }
        assert_eq!(dispatcher.event_names(), vec!["issue_comment", "issues", "push"]);
    }
}
