//! Trait definitions for the catalog indexer repository.

mod document_store;

pub use document_store::DocumentStore;
