//! This module defines the core data structures and types used across the
//! catalog indexer. It re-exports specific types like `ProductDocument`.

pub mod events;
pub mod product_document;
pub mod search_query;
pub mod search_result;

pub use events::{ProductCreatedEvent, ProductDeletedEvent, ProductUpdatedEvent};
pub use product_document::ProductDocument;
pub use search_query::{CatalogSearchRequest, SortDirection};
pub use search_result::{CatalogSearchResponse, ProductHit};
