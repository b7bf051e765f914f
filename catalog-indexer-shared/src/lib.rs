//! # Catalog Indexer Shared
//!
//! This crate defines shared data structures and types used across the
//! catalog indexer ecosystem: the product document as stored in the search
//! index, the event payloads published by the system of record, and the
//! search request/response types served by the query engines.

pub mod types;

pub use types::events::{ProductCreatedEvent, ProductDeletedEvent, ProductUpdatedEvent};
pub use types::product_document::{
    build_identity_key, clean_name_for_spellcheck, ProductDocument,
};
pub use types::search_query::{CatalogSearchRequest, SortDirection, MAX_PAGE};
pub use types::search_result::{CatalogSearchResponse, ProductHit};
