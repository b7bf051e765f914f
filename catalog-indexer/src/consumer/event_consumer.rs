//! Per-topic Kafka consumer loop.
//!
//! Each loop owns one stream consumer subscribed to a single event topic,
//! invokes its handler per delivery, and hands failures to the retry
//! router. Offsets are committed manually in every terminal branch; a
//! delivery whose routing publish fails is left uncommitted so Kafka
//! redelivers it.

use std::sync::Arc;

use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::Message as KafkaMessage,
};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::envelope;
use crate::errors::ConsumeError;
use crate::handlers::EventHandler;
use crate::retry::RetryRouter;

/// Kafka consumer loop for one event topic.
pub struct EventConsumer {
    consumer: StreamConsumer,
    topic: String,
    handler: Arc<dyn EventHandler>,
    router: Arc<RetryRouter>,
}

impl EventConsumer {
    /// Create a consumer for one topic.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID, shared by workers of the same topic
    /// * `topic` - The event topic to consume
    /// * `handler` - Handler applying this topic's events
    /// * `router` - Router for failed deliveries
    pub fn new(
        brokers: &str,
        group_id: &str,
        topic: impl Into<String>,
        handler: Arc<dyn EventHandler>,
        router: Arc<RetryRouter>,
    ) -> Result<Self, ConsumeError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| ConsumeError::kafka(e.to_string()))?;

        let topic = topic.into();
        info!(
            brokers = %brokers,
            group_id = %group_id,
            topic = %topic,
            "Created event consumer"
        );

        Ok(Self {
            consumer,
            topic,
            handler,
            router,
        })
    }

    /// Subscribe to the configured topic.
    pub fn subscribe(&self) -> Result<(), ConsumeError> {
        self.consumer
            .subscribe(&[self.topic.as_str()])
            .map_err(|e| ConsumeError::kafka(e.to_string()))?;

        info!(topic = %self.topic, "Subscribed to Kafka topic");
        Ok(())
    }

    /// Consume until the shutdown signal fires.
    #[instrument(skip(self, shutdown), fields(topic = %self.topic))]
    pub async fn run(
        &self,
        mut shutdown: tokio::sync::broadcast::Receiver<()>,
    ) -> Result<(), ConsumeError> {
        use futures::StreamExt;

        let mut message_stream = self.consumer.stream();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!(topic = %self.topic, "Consumer received shutdown signal");
                    break;
                }
                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            debug!(
                                topic = %msg.topic(),
                                partition = msg.partition(),
                                offset = msg.offset(),
                                "Received message from Kafka"
                            );
                            self.process(&msg).await;
                        }
                        Some(Err(e)) => {
                            error!(topic = %self.topic, error = %e, "Kafka error");
                        }
                        None => {
                            info!(topic = %self.topic, "Kafka stream ended");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply one delivery and settle its offset.
    async fn process(&self, msg: &rdkafka::message::BorrowedMessage<'_>) {
        let payload = msg.payload().unwrap_or_default();
        let retry_count = envelope::retry_count(msg.headers());

        match self.handler.handle(payload).await {
            Ok(()) => {
                debug!(
                    event = self.handler.event_label(),
                    offset = msg.offset(),
                    "Event applied"
                );
            }
            Err(e) => {
                warn!(
                    event = self.handler.event_label(),
                    offset = msg.offset(),
                    retry_count = retry_count,
                    error = %e,
                    "Handler failed, routing delivery"
                );
                if let Err(route_err) = self
                    .router
                    .route(&e, &self.topic, msg.key(), payload, retry_count)
                    .await
                {
                    // Leave the offset uncommitted; Kafka redelivers.
                    error!(
                        topic = %self.topic,
                        offset = msg.offset(),
                        error = %route_err,
                        "Failed to route delivery, offset not committed"
                    );
                    return;
                }
            }
        }

        if let Err(e) = self.consumer.commit_message(msg, CommitMode::Async) {
            error!(
                topic = %self.topic,
                offset = msg.offset(),
                error = %e,
                "Failed to commit offset"
            );
        }
    }
}
