//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `DocumentStore`
//! using the OpenSearch Rust crate. All writes address the write alias and
//! all queries the read alias; the versioned index name is only used during
//! startup index creation.

use async_trait::async_trait;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesPutAliasParts},
    CreateParts, DeleteParts, GetParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::errors::SearchStoreError;
use crate::interfaces::DocumentStore;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::VersionToken;
use catalog_indexer_shared::ProductDocument;

/// OpenSearch-backed document store.
///
/// # Example
///
/// ```ignore
/// use catalog_indexer_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let config = IndexConfig::new("products", 1);
/// let provider = OpenSearchProvider::new("http://localhost:9200", config)?;
/// provider.ensure_index_exists().await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index naming configuration
    pub fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchStoreError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.versioned_index(),
            read_alias = %index_config.read_alias(),
            write_alias = %index_config.write_alias(),
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    fn serialize_doc(doc: &ProductDocument) -> Result<Value, SearchStoreError> {
        serde_json::to_value(doc).map_err(|e| SearchStoreError::serialization(e.to_string()))
    }

    /// Extract the concurrency token from a get response body.
    fn parse_version_token(body: &Value) -> Result<VersionToken, SearchStoreError> {
        let seq_no = body["_seq_no"]
            .as_i64()
            .ok_or_else(|| SearchStoreError::parse("get response missing _seq_no"))?;
        let primary_term = body["_primary_term"]
            .as_i64()
            .ok_or_else(|| SearchStoreError::parse("get response missing _primary_term"))?;
        Ok(VersionToken::new(seq_no, primary_term))
    }
}

#[async_trait]
impl DocumentStore for OpenSearchProvider {
    /// Ensure the versioned index and both aliases exist.
    ///
    /// If the read alias already resolves, an active index version exists
    /// and nothing is touched. Otherwise the versioned index is created with
    /// the catalog settings/mappings and both aliases are pointed at it.
    async fn ensure_index_exists(&self) -> Result<(), SearchStoreError> {
        let read_alias = self.index_config.read_alias();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&read_alias]))
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        if response.status_code().is_success() {
            info!(alias = %read_alias, "Read alias already exists, index ready");
            return Ok(());
        }

        let versioned = self.index_config.versioned_index();
        info!(index = %versioned, "Creating initial catalog index");

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&versioned))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchStoreError::index_creation(format!(
                "failed to create index {}: {}",
                versioned, body
            )));
        }

        for alias in [read_alias, self.index_config.write_alias()] {
            let response = self
                .client
                .indices()
                .put_alias(IndicesPutAliasParts::IndexName(&[&versioned], &alias))
                .send()
                .await
                .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

            if !response.status_code().is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SearchStoreError::index_creation(format!(
                    "failed to create alias {}: {}",
                    alias, body
                )));
            }

            info!(index = %versioned, alias = %alias, "Alias created");
        }

        Ok(())
    }

    async fn get_with_version(
        &self,
        id: &Uuid,
    ) -> Result<Option<(ProductDocument, VersionToken)>, SearchStoreError> {
        let write_alias = self.index_config.write_alias();
        let doc_id = id.to_string();

        let response = self
            .client
            .get(GetParts::IndexId(&write_alias, &doc_id))
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchStoreError::unknown(format!(
                "get failed with status {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchStoreError::parse(e.to_string()))?;

        if !body["found"].as_bool().unwrap_or(false) {
            return Ok(None);
        }

        let token = Self::parse_version_token(&body)?;
        let doc: ProductDocument = serde_json::from_value(body["_source"].clone())
            .map_err(|e| SearchStoreError::parse(e.to_string()))?;

        Ok(Some((doc, token)))
    }

    /// Create-only write via the `_create` document endpoint; an existing id
    /// yields a 409 which surfaces as `Conflict`.
    async fn create_only(&self, doc: &ProductDocument) -> Result<(), SearchStoreError> {
        let write_alias = self.index_config.write_alias();
        let doc_id = doc.id.to_string();
        let body = Self::serialize_doc(doc)?;

        let response = self
            .client
            .create(CreateParts::IndexId(&write_alias, &doc_id))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 409 {
            return Err(SearchStoreError::conflict(format!(
                "document {} already exists",
                doc_id
            )));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Create request failed");
            return Err(SearchStoreError::unknown(format!(
                "create failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document created");
        Ok(())
    }

    /// Full-document write conditioned on the previously-read version token
    /// (`if_seq_no` + `if_primary_term`); a stale token yields a 409.
    async fn put_versioned(
        &self,
        doc: &ProductDocument,
        token: VersionToken,
    ) -> Result<(), SearchStoreError> {
        let write_alias = self.index_config.write_alias();
        let doc_id = doc.id.to_string();
        let body = Self::serialize_doc(doc)?;

        let response = self
            .client
            .index(IndexParts::IndexId(&write_alias, &doc_id))
            .if_seq_no(token.seq_no)
            .if_primary_term(token.primary_term)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 409 {
            warn!(doc_id = %doc_id, "Version conflict, another writer won the race");
            return Err(SearchStoreError::conflict(format!(
                "stale version token for document {}",
                doc_id
            )));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Conditional update failed");
            return Err(SearchStoreError::unknown(format!(
                "conditional update failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, seq_no = token.seq_no, "Document updated");
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, SearchStoreError> {
        let write_alias = self.index_config.write_alias();
        let doc_id = id.to_string();

        let response = self
            .client
            .delete(DeleteParts::IndexId(&write_alias, &doc_id))
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            debug!(doc_id = %doc_id, "Delete ignored, document already absent");
            return Ok(false);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchStoreError::unknown(format!(
                "delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(true)
    }

    /// Exact term query on the lowercase-normalized identity key. The query
    /// counts at most one match; the hot path never scans.
    async fn exists_by_identity_key(&self, key: &str) -> Result<bool, SearchStoreError> {
        let write_alias = self.index_config.write_alias();

        let response = self
            .client
            .search(SearchParts::Index(&[&write_alias]))
            .body(json!({
                "size": 0,
                "terminate_after": 1,
                "track_total_hits": true,
                "query": {
                    "term": {
                        "identity_key": key
                    }
                }
            }))
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchStoreError::query(format!(
                "identity key lookup failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchStoreError::parse(e.to_string()))?;

        Ok(body["hits"]["total"]["value"].as_u64().unwrap_or(0) > 0)
    }

    async fn search_raw(&self, body: Value) -> Result<Value, SearchStoreError> {
        let read_alias = self.index_config.read_alias();

        let response = self
            .client
            .search(SearchParts::Index(&[&read_alias]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchStoreError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(SearchStoreError::query(format!(
                "search failed with status {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SearchStoreError::parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_token() {
        let body = json!({
            "found": true,
            "_seq_no": 14,
            "_primary_term": 2,
            "_source": {}
        });
        let token = OpenSearchProvider::parse_version_token(&body).unwrap();
        assert_eq!(token, VersionToken::new(14, 2));
    }

    #[test]
    fn test_parse_version_token_missing_fields() {
        let body = json!({"found": true, "_source": {}});
        let result = OpenSearchProvider::parse_version_token(&body);
        assert!(matches!(result, Err(SearchStoreError::ParseError(_))));
    }
}
