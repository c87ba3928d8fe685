//! Inbound event model.
//!
//! An [`Event`] is created when a delivery is accepted and consumed by the
//! relay within the same request. It is never stored.

use std::fmt;
use std::str::FromStr;

use axum::body::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// GitHub event types the relay forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Push,
    Issues,
    IssueComment,
}

impl EventType {
    /// Every supported event type.
    pub const ALL: [EventType; 3] = [EventType::Push, EventType::Issues, EventType::IssueComment];

    /// Name as it appears in the `X-GitHub-Event` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Push => "push",
            EventType::Issues => "issues",
            EventType::IssueComment => "issue_comment",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an event name has no matching [`EventType`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported event type: {0}")]
pub struct UnsupportedEventType(pub String);

impl FromStr for EventType {
    type Err = UnsupportedEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnsupportedEventType(s.to_string()))
    }
}

/// A single accepted webhook delivery.
#[derive(Debug, Clone)]
pub struct Event {
    source: String,
    timestamp: String,
    event_type: EventType,
    body: Bytes,
}

impl Event {
    /// Create an event stamped with the current UTC time.
    pub fn new(source: impl Into<String>, event_type: EventType, body: Bytes) -> Self {
        Self::at(source, Utc::now(), event_type, body)
    }

    /// Create an event stamped with a given receipt time.
    pub fn at(
        source: impl Into<String>,
        received_at: DateTime<Utc>,
        event_type: EventType,
        body: Bytes,
    ) -> Self {
        Self {
            source: source.into(),
            timestamp: format_timestamp(received_at),
            event_type,
            body,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Consume the event, returning its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// RFC 3339 UTC with microseconds, e.g. `2024-05-01T12:00:00.123456Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
