//! Dependency initialization and wiring for the catalog indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::consumer::{
    EventConsumer, PRODUCT_CREATED_TOPIC, PRODUCT_DELETED_TOPIC, PRODUCT_UPDATED_TOPIC,
};
use crate::errors::ConsumeError;
use crate::handlers::{
    EventHandler, ProductCreatedHandler, ProductDeletedHandler, ProductUpdatedHandler,
};
use crate::retry::{KafkaRetryPublisher, RetryPolicy, RetryRouter};
use crate::IndexingError;
use catalog_indexer_repository::opensearch::IndexConfig;
use catalog_indexer_repository::{CatalogWriter, DocumentStore, OpenSearchProvider};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID prefix.
const DEFAULT_KAFKA_GROUP_ID: &str = "catalog-indexer";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default number of consumer workers per event topic.
const DEFAULT_WORKERS_PER_TOPIC: usize = 1;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        match env::var("OPENSEARCH_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    consumers: Vec<EventConsumer>,
    shutdown: broadcast::Sender<()>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_ALIAS`: Index base name (default: "products")
    /// - `PRODUCTS_INDEX_VERSION`: Index version number (default: 1)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID prefix (default: catalog-indexer)
    /// - `CONSUMER_WORKERS_PER_TOPIC`: Workers per event topic (default: 1)
    /// - `RETRY_MAX_ATTEMPTS`: Delivery attempts before dead-lettering (default: 3)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    pub async fn new() -> Result<Self, IndexingError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let kafka_broker =
            env::var("KAFKA_BROKER").unwrap_or_else(|_| DEFAULT_KAFKA_BROKER.to_string());
        let kafka_group_id =
            env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| DEFAULT_KAFKA_GROUP_ID.to_string());
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let workers_per_topic = env::var("CONSUMER_WORKERS_PER_TOPIC")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_WORKERS_PER_TOPIC);
        let max_attempts = env::var("RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(RetryPolicy::default().max_attempts);

        info!(
            opensearch_url = %opensearch_url,
            kafka_broker = %kafka_broker,
            kafka_group_id = %kafka_group_id,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            workers_per_topic = workers_per_topic,
            max_attempts = max_attempts,
            "Initializing dependencies"
        );

        let index_alias = env::var("INDEX_ALIAS").unwrap_or_else(|_| "products".to_string());
        let index_version = env::var("PRODUCTS_INDEX_VERSION")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);
        let index_config = IndexConfig::new(index_alias, index_version);

        let store = Self::connect_to_opensearch(
            &opensearch_url,
            index_config,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        // Exits if index and aliases cannot be created
        store
            .ensure_index_exists()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))?;

        let store: Arc<dyn DocumentStore> = Arc::new(store);
        let writer = Arc::new(CatalogWriter::new(store));

        let publisher = KafkaRetryPublisher::new(&kafka_broker).map_err(|e| {
            IndexingError::config(format!("Failed to create retry publisher: {}", e))
        })?;
        let router = Arc::new(RetryRouter::new(
            Arc::new(publisher),
            RetryPolicy { max_attempts },
        ));

        let topics: [(&str, Arc<dyn EventHandler>); 3] = [
            (
                PRODUCT_CREATED_TOPIC,
                Arc::new(ProductCreatedHandler::new(writer.clone())),
            ),
            (
                PRODUCT_UPDATED_TOPIC,
                Arc::new(ProductUpdatedHandler::new(writer.clone())),
            ),
            (
                PRODUCT_DELETED_TOPIC,
                Arc::new(ProductDeletedHandler::new(writer.clone())),
            ),
        ];

        let mut consumers = Vec::with_capacity(topics.len() * workers_per_topic);
        for (topic, handler) in topics {
            // One consumer group per event type; workers share it.
            let group_id = format!("{}.{}", kafka_group_id, topic);
            for _ in 0..workers_per_topic {
                let consumer = EventConsumer::new(
                    &kafka_broker,
                    &group_id,
                    topic,
                    handler.clone(),
                    router.clone(),
                )
                .map_err(|e| {
                    IndexingError::config(format!("Failed to create Kafka consumer: {}", e))
                })?;
                consumers.push(consumer);
            }
        }

        info!(consumer_count = consumers.len(), "Kafka consumers created");

        let (shutdown, _) = broadcast::channel(1);

        Ok(Self {
            consumers,
            shutdown,
        })
    }

    /// Run all consumer loops until ctrl-c, then shut down gracefully.
    pub async fn run(self) -> Result<(), ConsumeError> {
        let mut handles = Vec::with_capacity(self.consumers.len());

        for consumer in self.consumers {
            consumer.subscribe()?;
            let shutdown_rx = self.shutdown.subscribe();
            handles.push(tokio::spawn(async move { consumer.run(shutdown_rx).await }));
        }

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| ConsumeError::channel(format!("Failed to listen for ctrl-c: {}", e)))?;

        info!("Shutdown signal received, stopping consumers");
        let _ = self.shutdown.send(());

        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Consumer loop failed"),
                Err(e) => error!(error = %e, "Consumer task panicked"),
            }
        }

        info!("All consumers stopped");
        Ok(())
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match OpenSearchProvider::new(url, index_config.clone()) {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
