//! # Catalog Indexer Repository
//!
//! This crate provides traits and implementations for interacting with the
//! catalog search index. It includes definitions for errors, the document
//! store interface with its OpenSearch implementation, the write engine,
//! and the search/autocomplete query engines.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod query;
pub mod types;
pub mod writer;

pub use config::QueryConfig;
pub use errors::SearchStoreError;
pub use interfaces::DocumentStore;
pub use opensearch::{IndexConfig, OpenSearchProvider};
pub use query::{AutocompleteEngine, CatalogSearchEngine};
pub use types::{VersionToken, WriteOutcome};
pub use writer::CatalogWriter;
