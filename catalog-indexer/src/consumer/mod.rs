//! Consumer module for the catalog indexer.
//!
//! Provides the per-topic Kafka consumer loop and the retry envelope
//! headers carried on redelivered messages.

pub mod envelope;
mod event_consumer;

pub use event_consumer::EventConsumer;

/// Topic for product created events.
pub const PRODUCT_CREATED_TOPIC: &str = "product.created";

/// Topic for product updated events.
pub const PRODUCT_UPDATED_TOPIC: &str = "product.updated";

/// Topic for product deleted events.
pub const PRODUCT_DELETED_TOPIC: &str = "product.deleted";
