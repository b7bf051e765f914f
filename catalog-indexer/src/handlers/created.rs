//! Handler for product created events.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::handlers::{EventHandler, HandlerError};
use catalog_indexer_repository::CatalogWriter;
use catalog_indexer_shared::{ProductCreatedEvent, ProductDocument};

/// Indexes newly created products.
pub struct ProductCreatedHandler {
    writer: Arc<CatalogWriter>,
}

impl ProductCreatedHandler {
    pub fn new(writer: Arc<CatalogWriter>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl EventHandler for ProductCreatedHandler {
    fn event_label(&self) -> &'static str {
        "product.created"
    }

    #[instrument(skip(self, payload))]
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let event: ProductCreatedEvent = serde_json::from_slice(payload)
            .map_err(|e| HandlerError::decode(format!("invalid created event: {}", e)))?;

        debug!(product_id = %event.id, "Handling product created event");

        let outcome = self.writer.create(ProductDocument::from(event)).await?;
        debug!(outcome = ?outcome, "Create applied");
        Ok(())
    }
}
