//! Event relay.
//!
//! Turns an accepted [`Event`] into a single queue submission. There is no
//! retry or buffering here: a failed submission is logged and the event is
//! dropped.

use std::sync::Arc;

use axum::body::Bytes;
use tracing::{error, info};

use crate::error::{AttributeError, RelayError};
use crate::event::{Event, EventType};
use crate::queue::{
    AttributeValue, MessageAttributes, QueueClient, QueueMessage, EVENT_TYPE_ATTRIBUTE,
    SOURCE_ATTRIBUTE, TIMESTAMP_ATTRIBUTE,
};

/// Build the metadata attached to every message.
///
/// Pure; identical inputs always produce equal attributes.
pub fn build_attributes(
    source: &str,
    timestamp: &str,
    event_type: EventType,
) -> Result<MessageAttributes, AttributeError> {
    let fields = [
        (SOURCE_ATTRIBUTE, source),
        (TIMESTAMP_ATTRIBUTE, timestamp),
        (EVENT_TYPE_ATTRIBUTE, event_type.as_str()),
    ];

    let mut attributes = MessageAttributes::new();
    for (name, value) in fields {
        if value.is_empty() {
            return Err(AttributeError::EmptyValue(name));
        }
        attributes.insert(name.to_string(), AttributeValue::string(value));
    }

    Ok(attributes)
}

/// What became of a relayed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Accepted by the queue under this id
    Enqueued { message_id: String },
    /// Dropped after a failed submission
    Dropped { error_kind: &'static str },
}

/// Submits events to the injected queue client.
#[derive(Clone)]
pub struct Relay {
    client: Arc<dyn QueueClient>,
    max_message_bytes: usize,
}

impl Relay {
    pub fn new(client: Arc<dyn QueueClient>, max_message_bytes: usize) -> Self {
        Self {
            client,
            max_message_bytes,
        }
    }

    /// Submit a body with its attributes, returning the queue's message id.
    pub async fn enqueue(
        &self,
        attributes: MessageAttributes,
        body: Bytes,
    ) -> Result<String, RelayError> {
        let body = std::str::from_utf8(&body)
            .map_err(|e| RelayError::QueueRejected(format!("body is not valid UTF-8: {}", e)))?
            .to_owned();

        let message = QueueMessage::new(attributes, body);

        let size = message.size();
        if size > self.max_message_bytes {
            return Err(RelayError::QueueRejected(format!(
                "message is {} bytes, limit is {}",
                size, self.max_message_bytes
            )));
        }

        self.client.send(message).await
    }

    /// Build attributes for an event, enqueue it and log the outcome.
    ///
    /// `delivery_id` is only recorded in logs.
    pub async fn relay(&self, event: Event, delivery_id: Option<String>) -> Disposition {
        let event_type = event.event_type();

        let result = match build_attributes(event.source(), event.timestamp(), event_type) {
            Ok(attributes) => self.enqueue(attributes, event.into_body()).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(message_id) => {
                info!(
                    event_type = %event_type,
                    delivery_id = ?delivery_id,
                    message_id = %message_id,
                    "event_enqueued"
                );
                Disposition::Enqueued { message_id }
            }
            Err(e) => {
                error!(
                    event_type = %event_type,
                    delivery_id = ?delivery_id,
                    error_kind = e.kind(),
                    error = %e,
                    "event_dropped"
                );
                Disposition::Dropped {
                    error_kind: e.kind(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records messages and answers with a canned result.
    struct StubQueue {
        sent: Mutex<Vec<QueueMessage>>,
        fail_with: Option<fn() -> RelayError>,
    }

    impl StubQueue {
        fn accepting() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_with: None,
            })
        }

        fn failing(err: fn() -> RelayError) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(err),
            })
        }

        fn sent(&self) -> Vec<QueueMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueueClient for StubQueue {
        async fn send(&self, message: QueueMessage) -> Result<String, RelayError> {
            self.sent.lock().unwrap().push(message);
            match self.fail_with {
                Some(err) => Err(err()),
                None => Ok("msg-1".to_string()),
            }
        }
    }

    #[test]
    fn test_build_attributes() {
        let attributes =
            build_attributes("Github repo", "2024-05-01T12:00:00.000000Z", EventType::Push).unwrap();

        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes["Source"], AttributeValue::string("Github repo"));
        assert_eq!(
            attributes["Timestamp"],
            AttributeValue::string("2024-05-01T12:00:00.000000Z")
        );
        assert_eq!(attributes["EventType"], AttributeValue::string("push"));
    }

    #[test]
    fn test_build_attributes_is_pure() {
        let first = build_attributes("src", "ts", EventType::IssueComment).unwrap();
        let second = build_attributes("src", "ts", EventType::IssueComment).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_attributes_rejects_empty_value() {
        assert_eq!(
            build_attributes("", "ts", EventType::Issues),
            Err(AttributeError::EmptyValue("Source"))
        );
        assert_eq!(
            build_attributes("src", "", EventType::Issues),
            Err(AttributeError::EmptyValue("Timestamp"))
        );
    }

    #[tokio::test]
    async fn test_enqueue_submits_with_delay() {
        let queue = StubQueue::accepting();
        let relay = Relay::new(queue.clone(), 1024);
        let attributes = build_attributes("src", "ts", EventType::Push).unwrap();

        let id = relay
            .enqueue(attributes.clone(), Bytes::from_static(b"{\"a\":1}"))
            .await
            .unwrap();

        assert_eq!(id, "msg-1");
        let sent = queue.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attributes, attributes);
        assert_eq!(sent[0].body, "{\"a\":1}");
        assert_eq!(sent[0].delay, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_enqueue_oversized_body_is_rejected_without_send() {
        let queue = StubQueue::accepting();
        let relay = Relay::new(queue.clone(), 64);
        let attributes = build_attributes("src", "ts", EventType::Push).unwrap();

        let err = relay
            .enqueue(attributes, Bytes::from(vec![b'a'; 64]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "queue_rejected");
        assert!(queue.sent().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_size_limit_is_inclusive() {
        let attributes = build_attributes("src", "ts", EventType::Push).unwrap();
        let body = "{}".to_string();
        let exact = QueueMessage::new(attributes.clone(), body.clone()).size();

        let queue = StubQueue::accepting();
        let at_limit = Relay::new(queue.clone(), exact);
        assert!(at_limit
            .enqueue(attributes.clone(), Bytes::from(body.clone()))
            .await
            .is_ok());
        assert_eq!(queue.sent().len(), 1);

        let queue = StubQueue::accepting();
        let below_limit = Relay::new(queue.clone(), exact - 1);
        let err = below_limit
            .enqueue(attributes, Bytes::from(body))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "queue_rejected");
        assert!(queue.sent().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_non_utf8_body_is_rejected() {
        let queue = StubQueue::accepting();
        let relay = Relay::new(queue.clone(), 1024);
        let attributes = build_attributes("src", "ts", EventType::Push).unwrap();

        let err = relay
            .enqueue(attributes, Bytes::from_static(&[0xff, 0xfe]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "queue_rejected");
        assert!(queue.sent().is_empty());
    }

    #[tokio::test]
    async fn test_relay_enqueued() {
        let queue = StubQueue::accepting();
        let relay = Relay::new(queue.clone(), 1024);
        let event = Event::new("Github repo", EventType::Issues, Bytes::from_static(b"{}"));

        let disposition = relay.relay(event, Some("delivery-1".to_string())).await;

        assert_eq!(
            disposition,
            Disposition::Enqueued {
                message_id: "msg-1".to_string()
            }
        );
        let sent = queue.sent();
        assert_eq!(sent[0].attributes["EventType"].string_value, "issues");
    }

    #[tokio::test]
    async fn test_relay_same_delivery_twice_sends_two_messages() {
        let queue = StubQueue::accepting();
        let relay = Relay::new(queue.clone(), 1024);

        for _ in 0..2 {
            let event = Event::new("Github repo", EventType::Push, Bytes::from_static(b"{}"));
            relay.relay(event, Some("delivery-1".to_string())).await;
        }

        let sent = queue.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body, sent[1].body);
    }

    #[tokio::test]
    async fn test_relay_drops_on_unavailable() {
        let queue = StubQueue::failing(|| RelayError::QueueUnavailable("connection refused".into()));
        let relay = Relay::new(queue.clone(), 1024);
        let event = Event::new("Github repo", EventType::Push, Bytes::from_static(b"{}"));

        let disposition = relay.relay(event, None).await;

        assert_eq!(
            disposition,
            Disposition::Dropped {
                error_kind: "queue_unavailable"
            }
        );
        assert_eq!(queue.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_relay_drops_on_rejected() {
        let queue = StubQueue::failing(|| RelayError::QueueRejected("throttled".into()));
        let relay = Relay::new(queue, 1024);
        let event = Event::new("Github repo", EventType::Push, Bytes::from_static(b"{}"));

        assert_eq!(
            relay.relay(event, None).await,
            Disposition::Dropped {
                error_kind: "queue_rejected"
            }
        );
    }
}
