//! Handler for product deleted events.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::handlers::{EventHandler, HandlerError};
use catalog_indexer_repository::CatalogWriter;
use catalog_indexer_shared::ProductDeletedEvent;

/// Removes deleted products from the index.
pub struct ProductDeletedHandler {
    writer: Arc<CatalogWriter>,
}

impl ProductDeletedHandler {
    pub fn new(writer: Arc<CatalogWriter>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl EventHandler for ProductDeletedHandler {
    fn event_label(&self) -> &'static str {
        "product.deleted"
    }

    #[instrument(skip(self, payload))]
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let event: ProductDeletedEvent = serde_json::from_slice(payload)
            .map_err(|e| HandlerError::decode(format!("invalid deleted event: {}", e)))?;

        debug!(product_id = %event.id, "Handling product deleted event");

        let outcome = self.writer.delete(&event.id).await?;
        debug!(outcome = ?outcome, "Delete applied");
        Ok(())
    }
}
