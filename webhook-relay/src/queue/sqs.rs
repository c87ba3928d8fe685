//! AWS SQS queue client.
//!
//! Wraps the SDK client and maps relay messages onto `SendMessage`. Works
//! against any SQS-compatible endpoint (LocalStack, ElasticMQ) when an
//! endpoint override is configured.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::{
    config::{http::HttpResponse, retry::RetryConfig, timeout::TimeoutConfig},
    error::{DisplayErrorContext, SdkError},
    operation::send_message::{builders::SendMessageFluentBuilder, SendMessageError},
    types::MessageAttributeValue,
    Client,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::client::QueueClient;
use super::types::{MessageAttributes, QueueMessage, DELIVERY_DELAY};
use crate::error::RelayError;
use crate::Config;

/// SQS-backed [`QueueClient`].
///
/// Cloning is cheap; the SDK client is reference counted internally.
#[derive(Clone)]
pub struct SqsQueueClient {
    client: Client,
    queue_url: String,
    fifo: bool,
    message_group_id: String,
}

impl SqsQueueClient {
    /// Build a client from configuration.
    ///
    /// Credentials come from the standard AWS provider chain.
    pub async fn from_config(config: &Config, queue_url: String) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_sqs::config::Builder::from(&shared)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_millis(config.sqs_timeout_ms))
                    .build(),
            )
            .retry_config(RetryConfig::standard().with_max_attempts(config.sqs_max_attempts));

        if let Some(endpoint) = &config.sqs_endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let fifo = config.is_fifo_queue();

        info!(
            queue_url = %queue_url,
            region = %config.aws_region,
            endpoint = ?config.sqs_endpoint,
            fifo = fifo,
            "sqs_client_initialized"
        );

        if fifo {
            warn!(
                queue_url = %queue_url,
                delay_seconds = DELIVERY_DELAY.as_secs(),
                "fifo_queue_level_delay_applies"
            );
        }

        Self {
            client: Client::from_conf(builder.build()),
            queue_url,
            fifo,
            message_group_id: config.sqs_message_group_id.clone(),
        }
    }
}

impl SqsQueueClient {
    /// Map a relay message onto a `SendMessage` request.
    ///
    /// FIFO queues get a group id and a fresh deduplication id per send, and
    /// no per-message delay (SQS only allows the queue-level one there).
    fn build_request(&self, message: QueueMessage) -> Result<SendMessageFluentBuilder, RelayError> {
        let attributes = to_sqs_attributes(&message.attributes)?;

        let request = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .set_message_attributes(Some(attributes))
            .message_body(message.body);

        let request = if self.fifo {
            request
                .message_group_id(&self.message_group_id)
                .message_deduplication_id(Uuid::new_v4().to_string())
        } else {
            request.delay_seconds(delay_seconds(message.delay)?)
        };

        Ok(request)
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn send(&self, message: QueueMessage) -> Result<String, RelayError> {
        let output = self
            .build_request(message)?
            .send()
            .await
            .map_err(classify_send_error)?;

        output
            .message_id()
            .map(str::to_string)
            .ok_or_else(|| RelayError::QueueRejected("response carried no message id".to_string()))
    }
}

fn delay_seconds(delay: Duration) -> Result<i32, RelayError> {
    i32::try_from(delay.as_secs())
        .map_err(|_| RelayError::QueueRejected(format!("delay of {:?} is out of range", delay)))
}

/// Convert relay attributes into SDK attribute values.
fn to_sqs_attributes(
    attributes: &MessageAttributes,
) -> Result<HashMap<String, MessageAttributeValue>, RelayError> {
    attributes
        .iter()
        .map(|(name, value)| {
            MessageAttributeValue::builder()
                .data_type(value.data_type.as_str())
                .string_value(&value.string_value)
                .build()
                .map(|built| (name.clone(), built))
                .map_err(|e| RelayError::QueueRejected(format!("attribute {}: {}", name, e)))
        })
        .collect()
}

/// Client errors from the service are permanent; everything else means the
/// queue could not be reached.
fn classify_send_error(err: SdkError<SendMessageError, HttpResponse>) -> RelayError {
    let status = match &err {
        SdkError::ServiceError(service) => Some(service.raw().status().as_u16()),
        _ => None,
    };
    classify_status(status, DisplayErrorContext(&err).to_string())
}

fn classify_status(status: Option<u16>, detail: String) -> RelayError {
    match status {
        Some(code) if (400..500).contains(&code) => RelayError::QueueRejected(detail),
        _ => RelayError::QueueUnavailable(detail),
    }
}
