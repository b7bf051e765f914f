//! Event payloads published by the system of record.
//!
//! Every event carries the full current field values of the product, not a
//! diff. The deleted event echoes the name/description the producer had at
//! deletion time; only the id is used by the consumer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::product_document::ProductDocument;

/// A product was created in the system of record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCreatedEvent {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// A product was updated in the system of record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductUpdatedEvent {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// A product was deleted in the system of record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDeletedEvent {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ProductCreatedEvent> for ProductDocument {
    fn from(event: ProductCreatedEvent) -> Self {
        ProductDocument::new(event.id, event.name, event.description, event.price)
    }
}

impl From<ProductUpdatedEvent> for ProductDocument {
    fn from(event: ProductUpdatedEvent) -> Self {
        ProductDocument::new(event.id, event.name, event.description, event.price)
    }
}
