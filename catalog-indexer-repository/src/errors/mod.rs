//! Error types for the catalog indexer repository.

mod search_store_error;

pub use search_store_error::SearchStoreError;
