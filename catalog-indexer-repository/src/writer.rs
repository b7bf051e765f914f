//! Catalog write engine.
//!
//! Applies product lifecycle events to the document store with idempotent,
//! conflict-safe semantics. Creates are deduplicated on the identity key,
//! updates are read-modify-write under optimistic concurrency, and deletes
//! are idempotent no-ops when the document is already gone.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::SearchStoreError;
use crate::interfaces::DocumentStore;
use crate::types::WriteOutcome;
use catalog_indexer_shared::ProductDocument;

/// Write-side service over a [`DocumentStore`].
pub struct CatalogWriter {
    store: Arc<dyn DocumentStore>,
}

impl CatalogWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Index a newly created product.
    ///
    /// The identity key (normalized name + description) is checked first;
    /// a product with the same content is treated as a redelivery and
    /// skipped. The write itself is create-only, so a concurrent create of
    /// the same id also resolves to a duplicate skip rather than a
    /// lost-update overwrite.
    pub async fn create(
        &self,
        mut doc: ProductDocument,
    ) -> Result<WriteOutcome, SearchStoreError> {
        doc.rebuild_derived_fields();

        if self.store.exists_by_identity_key(&doc.identity_key).await? {
            info!(
                product_id = %doc.id,
                identity_key = %doc.identity_key,
                "Duplicate product content, skipping create"
            );
            return Ok(WriteOutcome::SkippedDuplicate);
        }

        match self.store.create_only(&doc).await {
            Ok(()) => {
                info!(product_id = %doc.id, "Product indexed");
                Ok(WriteOutcome::Created)
            }
            Err(SearchStoreError::Conflict(_)) => {
                // Same id already indexed, a redelivered create.
                info!(product_id = %doc.id, "Product id already indexed, skipping create");
                Ok(WriteOutcome::SkippedDuplicate)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply an update event to an indexed product.
    ///
    /// Reads the current document together with its version token, overlays
    /// the incoming fields onto it, and writes back conditioned on the token.
    /// A missing document falls back to indexing the incoming state as-is,
    /// which keeps out-of-order create/update deliveries converging. A
    /// version conflict is propagated so the caller can redeliver.
    pub async fn update(&self, incoming: ProductDocument) -> Result<WriteOutcome, SearchStoreError> {
        match self.store.get_with_version(&incoming.id).await? {
            Some((mut current, token)) => {
                current.apply_update(&incoming);
                match self.store.put_versioned(&current, token).await {
                    Ok(()) => {
                        info!(product_id = %current.id, "Product updated");
                        Ok(WriteOutcome::Updated)
                    }
                    Err(SearchStoreError::Conflict(msg)) => {
                        warn!(product_id = %current.id, "Concurrent modification, update must be retried");
                        Err(SearchStoreError::conflict(msg))
                    }
                    Err(e) => Err(e),
                }
            }
            None => {
                warn!(
                    product_id = %incoming.id,
                    "Update for unindexed product, indexing incoming state"
                );
                let mut doc = incoming;
                doc.rebuild_derived_fields();
                match self.store.create_only(&doc).await {
                    Ok(()) => Ok(WriteOutcome::CreatedFromUpdate),
                    // The document appeared between the read and the write.
                    Err(SearchStoreError::Conflict(msg)) => Err(SearchStoreError::conflict(msg)),
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Remove a product from the index. Safe to replay.
    pub async fn delete(&self, id: &Uuid) -> Result<WriteOutcome, SearchStoreError> {
        if self.store.delete(id).await? {
            info!(product_id = %id, "Product removed from index");
            Ok(WriteOutcome::Deleted)
        } else {
            debug!(product_id = %id, "Product already absent from index");
            Ok(WriteOutcome::AlreadyAbsent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VersionToken;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockStore {
        existing_doc: Mutex<Option<(ProductDocument, VersionToken)>>,
        identity_key_exists: std::sync::atomic::AtomicBool,
        create_conflicts: std::sync::atomic::AtomicBool,
        put_conflicts: std::sync::atomic::AtomicBool,
        delete_returns: std::sync::atomic::AtomicBool,
        create_calls: AtomicUsize,
        put_calls: AtomicUsize,
        last_written: Mutex<Option<ProductDocument>>,
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn ensure_index_exists(&self) -> Result<(), SearchStoreError> {
            Ok(())
        }

        async fn get_with_version(
            &self,
            _id: &Uuid,
        ) -> Result<Option<(ProductDocument, VersionToken)>, SearchStoreError> {
            Ok(self.existing_doc.lock().unwrap().clone())
        }

        async fn create_only(&self, doc: &ProductDocument) -> Result<(), SearchStoreError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if self.create_conflicts.load(Ordering::SeqCst) {
                return Err(SearchStoreError::conflict("exists"));
            }
            *self.last_written.lock().unwrap() = Some(doc.clone());
            Ok(())
        }

        async fn put_versioned(
            &self,
            doc: &ProductDocument,
            _token: VersionToken,
        ) -> Result<(), SearchStoreError> {
            self.put_calls.fetch_add(1, Ordering::SeqCst);
            if self.put_conflicts.load(Ordering::SeqCst) {
                return Err(SearchStoreError::conflict("stale"));
            }
            *self.last_written.lock().unwrap() = Some(doc.clone());
            Ok(())
        }

        async fn delete(&self, _id: &Uuid) -> Result<bool, SearchStoreError> {
            Ok(self.delete_returns.load(Ordering::SeqCst))
        }

        async fn exists_by_identity_key(&self, _key: &str) -> Result<bool, SearchStoreError> {
            Ok(self.identity_key_exists.load(Ordering::SeqCst))
        }

        async fn search_raw(&self, _body: Value) -> Result<Value, SearchStoreError> {
            Ok(Value::Null)
        }
    }

    fn sample_doc() -> ProductDocument {
        ProductDocument::new(
            Uuid::new_v4(),
            "Widget abc123".to_string(),
            "A fine widget".to_string(),
            9.99,
        )
    }

    #[tokio::test]
    async fn test_create_indexes_new_product() {
        let store = Arc::new(MockStore::default());
        let writer = CatalogWriter::new(store.clone());

        let outcome = writer.create(sample_doc()).await.unwrap();

        assert_eq!(outcome, WriteOutcome::Created);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_skips_duplicate_content() {
        let store = Arc::new(MockStore::default());
        store.identity_key_exists.store(true, Ordering::SeqCst);
        let writer = CatalogWriter::new(store.clone());

        let outcome = writer.create(sample_doc()).await.unwrap();

        assert_eq!(outcome, WriteOutcome::SkippedDuplicate);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_skips_id_conflict() {
        let store = Arc::new(MockStore::default());
        store.create_conflicts.store(true, Ordering::SeqCst);
        let writer = CatalogWriter::new(store.clone());

        let outcome = writer.create(sample_doc()).await.unwrap();

        assert_eq!(outcome, WriteOutcome::SkippedDuplicate);
    }

    #[tokio::test]
    async fn test_update_overlays_existing_document() {
        let store = Arc::new(MockStore::default());
        let existing = sample_doc();
        let id = existing.id;
        *store.existing_doc.lock().unwrap() = Some((existing, VersionToken::new(3, 1)));
        let writer = CatalogWriter::new(store.clone());

        let mut incoming = ProductDocument::new(
            id,
            "Widget abc123".to_string(),
            "A better widget".to_string(),
            12.50,
        );
        incoming.price_changed_at = incoming.updated_at;

        let outcome = writer.update(incoming).await.unwrap();

        assert_eq!(outcome, WriteOutcome::Updated);
        let written = store.last_written.lock().unwrap().clone().unwrap();
        assert_eq!(written.description, "A better widget");
        assert_eq!(written.price, 12.50);
    }

    #[tokio::test]
    async fn test_update_falls_back_to_create_when_missing() {
        let store = Arc::new(MockStore::default());
        let writer = CatalogWriter::new(store.clone());

        let outcome = writer.update(sample_doc()).await.unwrap();

        assert_eq!(outcome, WriteOutcome::CreatedFromUpdate);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
        let written = store.last_written.lock().unwrap().clone().unwrap();
        assert!(!written.identity_key.is_empty());
    }

    #[tokio::test]
    async fn test_update_propagates_version_conflict() {
        let store = Arc::new(MockStore::default());
        *store.existing_doc.lock().unwrap() =
            Some((sample_doc(), VersionToken::new(0, 1)));
        store.put_conflicts.store(true, Ordering::SeqCst);
        let writer = CatalogWriter::new(store.clone());

        let result = writer.update(sample_doc()).await;

        assert!(matches!(result, Err(SearchStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = Arc::new(MockStore::default());
        let writer = CatalogWriter::new(store.clone());
        let id = Uuid::new_v4();

        assert_eq!(writer.delete(&id).await.unwrap(), WriteOutcome::AlreadyAbsent);

        store.delete_returns.store(true, Ordering::SeqCst);
        assert_eq!(writer.delete(&id).await.unwrap(), WriteOutcome::Deleted);
    }
}
