//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup; there is no runtime reconfiguration.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::event::EventType;

/// Default SQS message size limit (256 KiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 262_144;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Path the webhook provider posts deliveries to
    pub webhook_path: String,

    /// Fixed body returned by `GET /`
    pub greeting: String,

    /// Value of the `Source` attribute on every message
    pub event_source: String,

    /// GitHub webhook secret for HMAC-SHA256 signature verification
    pub webhook_secret: Option<String>,

    /// Events that get a relay handler registered
    pub enabled_events: Vec<EventType>,

    // =========================================================================
    // Queue Configuration
    // =========================================================================

    /// Destination queue URL
    pub queue_url: Option<String>,

    /// AWS region of the queue
    pub aws_region: String,

    /// Endpoint override for SQS-compatible services (LocalStack, ElasticMQ)
    pub sqs_endpoint: Option<String>,

    /// Per-operation timeout for queue calls in milliseconds
    pub sqs_timeout_ms: u64,

    /// Maximum attempts the SDK makes per send, including the first
    pub sqs_max_attempts: u32,

    /// Message group used when the queue is FIFO
    pub sqs_message_group_id: String,

    /// Upper bound on body plus attributes, in bytes
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            webhook_path: "/postreceive".to_string(),
            greeting: "Hello, World!".to_string(),
            event_source: "Github repo".to_string(),
            webhook_secret: None,
            enabled_events: EventType::ALL.to_vec(),
            queue_url: None,
            aws_region: "us-east-1".to_string(),
            sqs_endpoint: None,
            sqs_timeout_ms: 5000,
            sqs_max_attempts: 3,
            sqs_message_group_id: "webhook".to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            webhook_path: env::var("WEBHOOK_PATH")
                .ok()
                .map(normalize_path)
                .unwrap_or(defaults.webhook_path),

            greeting: env::var("GREETING").unwrap_or(defaults.greeting),

            event_source: non_empty("EVENT_SOURCE").unwrap_or(defaults.event_source),

            webhook_secret: env::var("GITHUB_WEBHOOK_SECRET").ok(),

            enabled_events: parse_events("RELAY_EVENTS").unwrap_or(defaults.enabled_events),

            queue_url: non_empty("QUEUE_URL"),

            aws_region: non_empty("AWS_REGION").unwrap_or(defaults.aws_region),

            sqs_endpoint: non_empty("SQS_ENDPOINT"),

            sqs_timeout_ms: parse_or("SQS_TIMEOUT_MS", defaults.sqs_timeout_ms),

            sqs_max_attempts: parse_or("SQS_MAX_ATTEMPTS", defaults.sqs_max_attempts).max(1),

            sqs_message_group_id: non_empty("SQS_MESSAGE_GROUP_ID")
                .unwrap_or(defaults.sqs_message_group_id),

            max_message_bytes: parse_or("QUEUE_MAX_MESSAGE_BYTES", defaults.max_message_bytes),
        }
    }

    /// Whether the configured queue is a FIFO queue.
    pub fn is_fifo_queue(&self) -> bool {
        self.queue_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').ends_with(".fifo"))
            .unwrap_or(false)
    }
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

/// Parse a comma-separated list of event names, skipping unknown ones.
fn parse_events(name: &str) -> Option<Vec<EventType>> {
    let names = parse_csv(name)?;

    let mut events = Vec::with_capacity(names.len());
    for raw in names {
        match raw.parse::<EventType>() {
            Ok(event) if !events.contains(&event) => events.push(event),
            Ok(_) => {}
            Err(_) => warn!(env_var = name, event = %raw, "Unsupported event type, skipping"),
        }
    }

    Some(events)
}

fn normalize_path(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_valid() {
        env::set_var("TEST_RELAY_PORT", "9090");
        assert_eq!(parse_or("TEST_RELAY_PORT", 8080u16), 9090);
        env::remove_var("TEST_RELAY_PORT");
    }

    #[test]
    fn test_parse_or_invalid_uses_default() {
        env::set_var("TEST_RELAY_TIMEOUT", "soon");
        assert_eq!(parse_or("TEST_RELAY_TIMEOUT", 5000u64), 5000);
        env::remove_var("TEST_RELAY_TIMEOUT");
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or("NONEXISTENT_RELAY_VAR", 3u32), 3);
    }

    #[test]
    fn test_parse_csv() {
        env::set_var("TEST_RELAY_CSV", "foo, bar, ,baz");
        let result = parse_csv("TEST_RELAY_CSV");
        assert_eq!(result, Some(vec!["foo".to_string(), "bar".to_string(), "baz".to_string()]));
        env::remove_var("TEST_RELAY_CSV");
    }

    #[test]
    fn test_parse_events_skips_unknown_and_duplicates() {
        env::set_var("TEST_RELAY_EVENTS", "push, release, push, issue_comment");
        let result = parse_events("TEST_RELAY_EVENTS");
        assert_eq!(result, Some(vec![EventType::Push, EventType::IssueComment]));
        env::remove_var("TEST_RELAY_EVENTS");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("hooks".to_string()), "/hooks");
        assert_eq!(normalize_path(" /postreceive ".to_string()), "/postreceive");
    }

    #[test]
    fn test_is_fifo_queue() {
        let mut config = Config::default();
        assert!(!config.is_fifo_queue());

        config.queue_url = Some("https://sqs.us-east-1.amazonaws.com/123/webhook.fifo".to_string());
        assert!(config.is_fifo_queue());

        config.queue_url = Some("https://sqs.us-east-1.amazonaws.com/123/webhook".to_string());
        assert!(!config.is_fifo_queue());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.webhook_path, "/postreceive");
        assert_eq!(config.greeting, "Hello, World!");
        assert_eq!(config.event_source, "Github repo");
        assert_eq!(config.enabled_events, EventType::ALL.to_vec());
        assert_eq!(config.max_message_bytes, 262_144);
    }
}
