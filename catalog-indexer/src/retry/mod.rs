//! Failure classification and retry/dead-letter routing.
//!
//! Failed deliveries are never retried in place. Transient failures are
//! republished to the delay destination with an incremented attempt counter;
//! the delay relay redelivers them to the original topic after a fixed
//! interval. Exhausted and fatal failures go to the dead-letter destination.
//! The original delivery is committed in every terminal branch, so the
//! delay-then-republish step is the only redelivery mechanism.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{error, info, warn};

use crate::consumer::envelope;
use crate::errors::ConsumeError;
use crate::handlers::HandlerError;

/// Delay destination: a TTL relay republishes payloads from here to the
/// topic named in the original-destination header after the delay elapses.
pub const RETRY_DELAY_TOPIC: &str = "product.retry.5s";

/// Terminal destination for exhausted and undecodable deliveries. Never
/// consumed by this service.
pub const DEAD_LETTER_TOPIC: &str = "product.dlq";

/// Default maximum delivery attempts before dead-lettering.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Produce timeout for retry/dead-letter publishes.
const PRODUCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Retry policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts allowed before a transient failure is dead-lettered.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Where a failed delivery goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Republish to the delay destination with the incremented counter.
    Delay { next_retry_count: u32 },
    /// Publish to the dead-letter destination. `retry_count` is the counter
    /// header to carry, `None` when it must be stripped.
    DeadLetter { retry_count: Option<u32> },
}

/// Decide the next destination for a failed delivery.
///
/// `retry_count` is the attempt counter read from the delivery headers
/// (0 when absent). Fatal failures dead-letter immediately with the counter
/// untouched; transient failures delay-retry until the policy is exhausted,
/// at which point the counter header is stripped and the payload
/// dead-lettered.
pub fn decide(transient: bool, retry_count: u32, policy: &RetryPolicy) -> Disposition {
    if !transient {
        return Disposition::DeadLetter {
            retry_count: (retry_count > 0).then_some(retry_count),
        };
    }

    if retry_count < policy.max_attempts {
        Disposition::Delay {
            next_retry_count: retry_count + 1,
        }
    } else {
        Disposition::DeadLetter { retry_count: None }
    }
}

/// Publisher for retry and dead-letter destinations.
#[async_trait]
pub trait RetryPublisher: Send + Sync {
    /// Publish the original payload to the delay destination, carrying the
    /// incremented counter and the original topic name.
    async fn publish_delayed(
        &self,
        original_topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        next_retry_count: u32,
    ) -> Result<(), ConsumeError>;

    /// Publish the original payload to the dead-letter destination.
    async fn publish_dead_letter(
        &self,
        original_topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        retry_count: Option<u32>,
    ) -> Result<(), ConsumeError>;
}

/// Kafka-backed retry publisher.
pub struct KafkaRetryPublisher {
    producer: FutureProducer,
}

impl KafkaRetryPublisher {
    /// Create a producer for the retry and dead-letter destinations.
    pub fn new(brokers: &str) -> Result<Self, ConsumeError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| ConsumeError::kafka(e.to_string()))?;

        info!(brokers = %brokers, "Created retry publisher");
        Ok(Self { producer })
    }

    async fn produce(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        headers: rdkafka::message::OwnedHeaders,
    ) -> Result<(), ConsumeError> {
        let mut record: FutureRecord<'_, [u8], [u8]> =
            FutureRecord::to(topic).payload(payload).headers(headers);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, PRODUCE_TIMEOUT)
            .await
            .map_err(|(e, _)| ConsumeError::kafka(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl RetryPublisher for KafkaRetryPublisher {
    async fn publish_delayed(
        &self,
        original_topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        next_retry_count: u32,
    ) -> Result<(), ConsumeError> {
        let headers = envelope::delay_headers(original_topic, next_retry_count);
        self.produce(RETRY_DELAY_TOPIC, key, payload, headers).await
    }

    async fn publish_dead_letter(
        &self,
        original_topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        retry_count: Option<u32>,
    ) -> Result<(), ConsumeError> {
        let headers = envelope::dead_letter_headers(original_topic, retry_count);
        self.produce(DEAD_LETTER_TOPIC, key, payload, headers).await
    }
}

/// Routes failed deliveries according to the policy.
pub struct RetryRouter {
    publisher: Arc<dyn RetryPublisher>,
    policy: RetryPolicy,
}

impl RetryRouter {
    pub fn new(publisher: Arc<dyn RetryPublisher>, policy: RetryPolicy) -> Self {
        Self { publisher, policy }
    }

    /// Route a failed delivery to its next destination.
    pub async fn route(
        &self,
        error: &HandlerError,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        retry_count: u32,
    ) -> Result<(), ConsumeError> {
        match decide(error.is_transient(), retry_count, &self.policy) {
            Disposition::Delay { next_retry_count } => {
                warn!(
                    topic = %topic,
                    retry_count = next_retry_count,
                    max_attempts = self.policy.max_attempts,
                    error = %error,
                    "Transient failure, scheduling delayed redelivery"
                );
                self.publisher
                    .publish_delayed(topic, key, payload, next_retry_count)
                    .await
            }
            Disposition::DeadLetter { retry_count } => {
                error!(
                    topic = %topic,
                    retry_count = ?retry_count,
                    error = %error,
                    "Dead-lettering delivery"
                );
                self.publisher
                    .publish_dead_letter(topic, key, payload, retry_count)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_failures_delay_until_exhausted() {
        let policy = RetryPolicy::default();
        assert_eq!(
            decide(true, 0, &policy),
            Disposition::Delay {
                next_retry_count: 1
            }
        );
        assert_eq!(
            decide(true, 2, &policy),
            Disposition::Delay {
                next_retry_count: 3
            }
        );
        assert_eq!(
            decide(true, 3, &policy),
            Disposition::DeadLetter { retry_count: None }
        );
    }

    #[test]
    fn test_fatal_failures_dead_letter_immediately() {
        let policy = RetryPolicy::default();
        assert_eq!(
            decide(false, 0, &policy),
            Disposition::DeadLetter { retry_count: None }
        );
        // Counter left untouched on a fatal failure mid-retry.
        assert_eq!(
            decide(false, 2, &policy),
            Disposition::DeadLetter {
                retry_count: Some(2)
            }
        );
    }

    #[test]
    fn test_zero_attempt_policy_never_delays() {
        let policy = RetryPolicy { max_attempts: 0 };
        assert_eq!(
            decide(true, 0, &policy),
            Disposition::DeadLetter { retry_count: None }
        );
    }
}
