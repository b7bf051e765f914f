//! Document store trait definition.
//!
//! This module defines the abstract interface for document-level operations
//! against the search engine, allowing for different backend implementations
//! (OpenSearch, Elasticsearch, mocks for testing).

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::SearchStoreError;
use crate::types::VersionToken;
use catalog_indexer_shared::ProductDocument;

/// Abstracts the underlying search engine for the write and query paths.
///
/// Implementations are injected into the write engine and the query engines,
/// so tests can run against in-memory mocks. All document writes go through
/// the *write* alias and all queries through the *read* alias; callers never
/// name a versioned index directly, which keeps alias repointing invisible
/// to this interface.
///
/// # Concurrency
///
/// `get_with_version` and `put_versioned` together form the conditional
/// read-modify-write protocol: a `put_versioned` with a token from an
/// earlier read fails with [`SearchStoreError::Conflict`] when another
/// writer has landed in between. The store never resolves such races itself.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ensure the versioned index and its read/write aliases exist, creating
    /// them if necessary. Called once at startup, never on the hot path.
    async fn ensure_index_exists(&self) -> Result<(), SearchStoreError>;

    /// Fetch a document together with its version token.
    ///
    /// Returns `Ok(None)` when the id is absent; that is not an error at
    /// this layer.
    async fn get_with_version(
        &self,
        id: &Uuid,
    ) -> Result<Option<(ProductDocument, VersionToken)>, SearchStoreError>;

    /// Create-only write: fails with [`SearchStoreError::Conflict`] if the
    /// id already exists, never overwrites.
    async fn create_only(&self, doc: &ProductDocument) -> Result<(), SearchStoreError>;

    /// Conditional full-document write. Fails with
    /// [`SearchStoreError::Conflict`] when `token` no longer matches the
    /// stored document.
    async fn put_versioned(
        &self,
        doc: &ProductDocument,
        token: VersionToken,
    ) -> Result<(), SearchStoreError>;

    /// Delete by id. Returns `false` when the id was already absent, which
    /// callers treat as success (idempotent delete).
    async fn delete(&self, id: &Uuid) -> Result<bool, SearchStoreError>;

    /// Point lookup for an existing document with the given identity key.
    ///
    /// Term query against the keyword-mapped identity field, never a scan.
    async fn exists_by_identity_key(&self, key: &str) -> Result<bool, SearchStoreError>;

    /// Execute a raw search body against the read alias and return the
    /// engine's JSON response. Used by the query engines, which own query
    /// construction and response interpretation.
    async fn search_raw(&self, body: Value) -> Result<Value, SearchStoreError>;
}
