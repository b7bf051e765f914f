//! Per-event-type handlers over the catalog write engine.
//!
//! Each handler decodes one event payload shape and delegates to the
//! matching write operation. Handlers never retry and never swallow a
//! failure; classification and redelivery are the retry router's job.

mod created;
mod deleted;
mod updated;

pub use created::ProductCreatedHandler;
pub use deleted::ProductDeletedHandler;
pub use updated::ProductUpdatedHandler;

use async_trait::async_trait;
use catalog_indexer_repository::SearchStoreError;
use thiserror::Error;

/// Failure applying an event.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The payload could not be decoded. Redelivery cannot fix this.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The document store rejected or failed the operation.
    #[error("Store error: {0}")]
    Store(#[from] SearchStoreError),
}

impl HandlerError {
    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether redelivering the same payload could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            HandlerError::Decode(_) => false,
            HandlerError::Store(e) => e.is_transient(),
        }
    }
}

/// A handler for one event type.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short label for logging.
    fn event_label(&self) -> &'static str;

    /// Apply the raw event payload.
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError>;
}
