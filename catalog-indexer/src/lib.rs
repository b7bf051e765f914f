//! # Catalog Indexer
//!
//! Catalog indexer for the product search engine - consumes product
//! lifecycle events from Kafka and indexes them into OpenSearch.
//!
//! ## Architecture
//!
//! One consumer loop per event topic feeds a per-event handler:
//!
//! 1. **Consumer**: Receives events from Kafka with manual commits
//! 2. **Handlers**: Decode events and apply them through the write engine
//! 3. **Retry router**: Classifies failures and republishes to the delay
//!    or dead-letter destination
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Kafka consumer loops and retry headers
//! - [`handlers`]: Per-event-type handlers over the write engine
//! - [`retry`]: Failure classification and retry/dead-letter routing
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod consumer;
pub mod errors;
pub mod handlers;
pub mod retry;

pub use config::Dependencies;
pub use errors::ConsumeError;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Consume error.
    #[error("Consume error: {0}")]
    ConsumeError(#[from] ConsumeError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
