//! Handler for product updated events.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::handlers::{EventHandler, HandlerError};
use catalog_indexer_repository::CatalogWriter;
use catalog_indexer_shared::{ProductDocument, ProductUpdatedEvent};

/// Applies product updates under optimistic concurrency.
pub struct ProductUpdatedHandler {
    writer: Arc<CatalogWriter>,
}

impl ProductUpdatedHandler {
    pub fn new(writer: Arc<CatalogWriter>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl EventHandler for ProductUpdatedHandler {
    fn event_label(&self) -> &'static str {
        "product.updated"
    }

    #[instrument(skip(self, payload))]
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let event: ProductUpdatedEvent = serde_json::from_slice(payload)
            .map_err(|e| HandlerError::decode(format!("invalid updated event: {}", e)))?;

        debug!(product_id = %event.id, "Handling product updated event");

        let outcome = self.writer.update(ProductDocument::from(event)).await?;
        debug!(outcome = ?outcome, "Update applied");
        Ok(())
    }
}
