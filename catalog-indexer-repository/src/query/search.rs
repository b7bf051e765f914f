//! Full-text catalog search with a spell-correction rerun.
//!
//! The direct query is a weighted fuzzy multi-match with an optional price
//! filter. When the query text is present and the direct total lands below
//! the low-result threshold, a phrase spell-suggestion against `name_spell`
//! is attempted and, if it changes the term, the full query is rerun with
//! the correction. An empty result without a usable correction falls back
//! to a vocabulary sample and finally to static suggestions, so callers
//! always get something actionable.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::errors::SearchStoreError;
use crate::interfaces::DocumentStore;
use catalog_indexer_shared::{CatalogSearchRequest, CatalogSearchResponse, ProductDocument, ProductHit};

/// Read-side search service over a [`DocumentStore`].
pub struct CatalogSearchEngine {
    store: Arc<dyn DocumentStore>,
    config: QueryConfig,
}

impl CatalogSearchEngine {
    pub fn new(store: Arc<dyn DocumentStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// Execute a catalog search.
    ///
    /// Store failures never propagate as errors here; the caller receives
    /// an empty page with the `error` indicator set instead.
    pub async fn search(&self, request: &CatalogSearchRequest) -> CatalogSearchResponse {
        if let Err(reason) = request.validate() {
            return CatalogSearchResponse::degraded(request.page, request.page_size, reason);
        }

        let body = build_search_body(request, None);
        let raw = match self.store.search_raw(body).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Search request failed, returning degraded response");
                return CatalogSearchResponse::degraded(
                    request.page,
                    request.page_size,
                    "search engine unreachable",
                );
            }
        };

        let (items, total) = match parse_hits(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Unparseable search response");
                return CatalogSearchResponse::degraded(
                    request.page,
                    request.page_size,
                    "search engine returned an invalid response",
                );
            }
        };

        let query_text = match request.query_text() {
            Some(text) => text.to_string(),
            // Browse mode, nothing to correct or suggest.
            None => {
                return CatalogSearchResponse {
                    items,
                    total,
                    page: request.page,
                    page_size: request.page_size,
                    suggestions: Vec::new(),
                    corrected_query: None,
                    error: None,
                }
            }
        };

        if total >= self.config.low_result_threshold {
            return CatalogSearchResponse {
                items,
                total,
                page: request.page,
                page_size: request.page_size,
                suggestions: Vec::new(),
                corrected_query: None,
                error: None,
            };
        }

        if let Some(corrected) = self.correct_query(&query_text).await {
            debug!(original = %query_text, corrected = %corrected, "Rerunning query with spelling correction");
            if let Ok(raw) = self.store.search_raw(build_search_body(request, Some(&corrected))).await {
                if let Ok((mut corrected_items, corrected_total)) = parse_hits(&raw) {
                    for item in &mut corrected_items {
                        item.document.corrected_query = Some(corrected.clone());
                    }
                    return CatalogSearchResponse {
                        items: corrected_items,
                        total: corrected_total,
                        page: request.page,
                        page_size: request.page_size,
                        suggestions: vec![corrected.clone()],
                        corrected_query: Some(corrected),
                        error: None,
                    };
                }
            }
        }

        if total > 0 {
            return CatalogSearchResponse {
                items,
                total,
                page: request.page,
                page_size: request.page_size,
                suggestions: Vec::new(),
                corrected_query: None,
                error: None,
            };
        }

        // Nothing matched and nothing to correct; hand back vocabulary.
        let mut suggestions = self.suggest_vocabulary().await;
        if suggestions.is_empty() {
            suggestions = self.config.static_suggestions.clone();
        }

        CatalogSearchResponse {
            suggestions,
            ..CatalogSearchResponse::empty(request.page, request.page_size)
        }
    }

    /// Ask the phrase suggester for a corrected term. Returns `None` when no
    /// suggestion exists, the suggestion matches the original (case
    /// insensitive), or the suggester call fails.
    async fn correct_query(&self, original: &str) -> Option<String> {
        let raw = match self.store.search_raw(build_spell_suggest_body(original)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Spell suggestion failed, keeping original term");
                return None;
            }
        };
        extract_correction(&raw, original)
    }

    /// Sample distinct indexed product names, sorted and capped.
    async fn suggest_vocabulary(&self) -> Vec<String> {
        let raw = match self
            .store
            .search_raw(build_vocabulary_body(self.config.vocabulary_limit))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Vocabulary sample failed");
                return Vec::new();
            }
        };
        parse_vocabulary(&raw, self.config.suggestion_limit)
    }
}

/// Build the full search request body. `query_override` replaces the request
/// query text on the spell-corrected rerun.
pub(crate) fn build_search_body(request: &CatalogSearchRequest, query_override: Option<&str>) -> Value {
    let mut must = Vec::new();

    let query_text = query_override.or_else(|| request.query_text());
    if let Some(text) = query_text {
        must.push(json!({
            "multi_match": {
                "query": text,
                "fields": ["name.standard^3", "description"],
                "fuzziness": "AUTO"
            }
        }));
    }

    if request.min_price.is_some() || request.max_price.is_some() {
        let mut range = serde_json::Map::new();
        if let Some(min) = request.min_price {
            range.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = request.max_price {
            range.insert("lte".to_string(), json!(max));
        }
        must.push(json!({ "range": { "price": range } }));
    }

    json!({
        "from": request.page.saturating_mul(request.page_size),
        "size": request.page_size,
        "track_total_hits": true,
        "query": {
            "bool": { "must": must }
        },
        "sort": [
            { (sort_field_for(&request.sort_field)): { "order": request.sort_direction.as_str() } }
        ],
        "highlight": {
            "pre_tags": ["<strong>"],
            "post_tags": ["</strong>"],
            "fields": {
                "name": {},
                "description": {}
            }
        }
    })
}

/// Resolve a caller-facing sort field to its sortable mapping. `name` is a
/// `text` field the engine refuses to sort on; its keyword subfield is the
/// sortable form.
fn sort_field_for(field: &str) -> &str {
    match field {
        "name" => "name.raw",
        other => other,
    }
}

/// Phrase suggester request against the spelling dictionary field.
pub(crate) fn build_spell_suggest_body(text: &str) -> Value {
    json!({
        "size": 0,
        "suggest": {
            "text": text,
            "simple_phrase": {
                "phrase": {
                    "field": "name_spell",
                    "size": 1,
                    "gram_size": 2,
                    "direct_generator": [{
                        "field": "name_spell",
                        "suggest_mode": "popular"
                    }]
                }
            }
        }
    })
}

/// Bounded sample of documents with a name, fetching only the name field.
pub(crate) fn build_vocabulary_body(limit: usize) -> Value {
    json!({
        "size": limit,
        "_source": ["name"],
        "query": {
            "exists": { "field": "name" }
        }
    })
}

/// Parse hits from a search response, substituting highlighted fragments
/// into `name` and `description` where the engine returned them.
pub(crate) fn parse_hits(raw: &Value) -> Result<(Vec<ProductHit>, u64), SearchStoreError> {
    let total = raw["hits"]["total"]["value"]
        .as_u64()
        .ok_or_else(|| SearchStoreError::parse("search response missing hits.total.value"))?;

    let hits = raw["hits"]["hits"]
        .as_array()
        .ok_or_else(|| SearchStoreError::parse("search response missing hits.hits"))?;

    let mut items = Vec::with_capacity(hits.len());
    for hit in hits {
        let mut document: ProductDocument = serde_json::from_value(hit["_source"].clone())
            .map_err(|e| SearchStoreError::parse(e.to_string()))?;

        if let Some(fragments) = hit["highlight"]["name"].as_array() {
            if let Some(fragment) = fragments.first().and_then(Value::as_str) {
                document.name = fragment.to_string();
            }
        }
        if let Some(fragments) = hit["highlight"]["description"].as_array() {
            if let Some(fragment) = fragments.first().and_then(Value::as_str) {
                document.description = fragment.to_string();
            }
        }

        items.push(ProductHit {
            document,
            relevance_score: hit["_score"].as_f64().unwrap_or(0.0),
        });
    }

    Ok((items, total))
}

/// Pull the top phrase suggestion out of a suggester response, when it
/// actually differs from the original term.
pub(crate) fn extract_correction(raw: &Value, original: &str) -> Option<String> {
    let options = raw["suggest"]["simple_phrase"]
        .as_array()?
        .first()?
        .get("options")?
        .as_array()?;

    let suggestion = options.first()?.get("text")?.as_str()?;
    if suggestion.trim().is_empty() || suggestion.eq_ignore_ascii_case(original) {
        return None;
    }
    Some(suggestion.to_string())
}

/// Distinct, sorted, capped name sample from a vocabulary query response.
pub(crate) fn parse_vocabulary(raw: &Value, limit: usize) -> Vec<String> {
    let mut names: Vec<String> = raw["hits"]["hits"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["_source"]["name"].as_str())
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    names.sort();
    names.dedup();
    names.truncate(limit);
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_indexer_shared::SortDirection;
    use uuid::Uuid;

    fn hit_json(name: &str, score: f64) -> Value {
        json!({
            "_score": score,
            "_source": {
                "id": Uuid::new_v4(),
                "name": name,
                "description": "desc",
                "price": 10.0,
                "name_suggest": name,
                "name_spell": name,
                "identity_key": "k",
                "updated_at": "2026-01-01T00:00:00Z",
                "price_changed_at": "2026-01-01T00:00:00Z"
            }
        })
    }

    #[test]
    fn test_search_body_includes_weighted_fields_and_fuzziness() {
        let request = CatalogSearchRequest::with_query("keybord");
        let body = build_search_body(&request, None);

        let multi_match = &body["query"]["bool"]["must"][0]["multi_match"];
        assert_eq!(multi_match["query"], "keybord");
        assert_eq!(multi_match["fields"][0], "name.standard^3");
        assert_eq!(multi_match["fuzziness"], "AUTO");
        assert_eq!(body["highlight"]["pre_tags"][0], "<strong>");
    }

    #[test]
    fn test_search_body_paging_and_sort() {
        let request = CatalogSearchRequest::with_query("laptop")
            .with_page(2)
            .with_page_size(20)
            .with_sort("price", SortDirection::Desc);
        let body = build_search_body(&request, None);

        assert_eq!(body["from"], 40);
        assert_eq!(body["size"], 20);
        assert_eq!(body["sort"][0]["price"]["order"], "desc");
    }

    #[test]
    fn test_search_body_offset_never_overflows() {
        let mut request = CatalogSearchRequest::with_query("laptop").with_page_size(100);
        request.page = usize::MAX;
        let body = build_search_body(&request, None);
        assert_eq!(body["from"], usize::MAX as u64);
    }

    #[test]
    fn test_sort_on_name_uses_keyword_subfield() {
        let request =
            CatalogSearchRequest::with_query("laptop").with_sort("name", SortDirection::Asc);
        let body = build_search_body(&request, None);
        assert_eq!(body["sort"][0]["name.raw"]["order"], "asc");
        assert!(body["sort"][0].get("name").is_none());
    }

    #[tokio::test]
    async fn test_search_rejects_excessive_page() {
        let mut request = CatalogSearchRequest::with_query("laptop");
        request.page = usize::MAX;
        // No store interaction: validation degrades the request up front.
        let engine = engine(vec![]);
        let response = engine.search(&request).await;
        assert!(response.is_empty());
        assert!(response.error.is_some());
    }

    #[test]
    fn test_search_body_price_filter_bounds() {
        let request = CatalogSearchRequest::with_query("laptop")
            .with_price_range(Some(10.0), None);
        let body = build_search_body(&request, None);

        let range = &body["query"]["bool"]["must"][1]["range"]["price"];
        assert_eq!(range["gte"], 10.0);
        assert!(range.get("lte").is_none());
    }

    #[test]
    fn test_search_body_without_query_is_browse_mode() {
        let request = CatalogSearchRequest::default();
        let body = build_search_body(&request, None);
        assert_eq!(body["query"]["bool"]["must"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_query_override_replaces_term() {
        let request = CatalogSearchRequest::with_query("keybord");
        let body = build_search_body(&request, Some("keyboard"));
        assert_eq!(body["query"]["bool"]["must"][0]["multi_match"]["query"], "keyboard");
    }

    #[test]
    fn test_parse_hits_substitutes_highlights() {
        let mut hit = hit_json("Mechanical Keyboard", 3.1);
        hit["highlight"] = json!({ "name": ["Mechanical <strong>Keyboard</strong>"] });
        let raw = json!({ "hits": { "total": { "value": 1 }, "hits": [hit] } });

        let (items, total) = parse_hits(&raw).unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].document.name, "Mechanical <strong>Keyboard</strong>");
        assert_eq!(items[0].relevance_score, 3.1);
    }

    #[test]
    fn test_parse_hits_rejects_malformed_response() {
        assert!(parse_hits(&json!({"hits": {}})).is_err());
    }

    #[test]
    fn test_extract_correction() {
        let raw = json!({
            "suggest": {
                "simple_phrase": [{
                    "options": [{ "text": "keyboard", "score": 0.9 }]
                }]
            }
        });
        assert_eq!(extract_correction(&raw, "keybord").as_deref(), Some("keyboard"));
        assert_eq!(extract_correction(&raw, "Keyboard"), None);
        assert_eq!(extract_correction(&json!({}), "keybord"), None);
    }

    use crate::interfaces::DocumentStore;
    use crate::types::VersionToken;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Store stub that replays a scripted queue of `search_raw` responses.
    struct ScriptedStore {
        responses: Mutex<VecDeque<Result<Value, SearchStoreError>>>,
    }

    impl ScriptedStore {
        fn new(responses: Vec<Result<Value, SearchStoreError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for ScriptedStore {
        async fn ensure_index_exists(&self) -> Result<(), SearchStoreError> {
            Ok(())
        }
        async fn get_with_version(
            &self,
            _id: &Uuid,
        ) -> Result<Option<(ProductDocument, VersionToken)>, SearchStoreError> {
            Ok(None)
        }
        async fn create_only(&self, _doc: &ProductDocument) -> Result<(), SearchStoreError> {
            Ok(())
        }
        async fn put_versioned(
            &self,
            _doc: &ProductDocument,
            _token: VersionToken,
        ) -> Result<(), SearchStoreError> {
            Ok(())
        }
        async fn delete(&self, _id: &Uuid) -> Result<bool, SearchStoreError> {
            Ok(false)
        }
        async fn exists_by_identity_key(&self, _key: &str) -> Result<bool, SearchStoreError> {
            Ok(false)
        }
        async fn search_raw(&self, _body: Value) -> Result<Value, SearchStoreError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SearchStoreError::unavailable("script exhausted")))
        }
    }

    fn engine(responses: Vec<Result<Value, SearchStoreError>>) -> CatalogSearchEngine {
        CatalogSearchEngine::new(Arc::new(ScriptedStore::new(responses)), QueryConfig::default())
    }

    fn result_page(names: &[&str]) -> Value {
        json!({
            "hits": {
                "total": { "value": names.len() },
                "hits": names.iter().map(|n| hit_json(n, 1.0)).collect::<Vec<_>>()
            }
        })
    }

    fn suggestion_response(text: &str) -> Value {
        json!({
            "suggest": {
                "simple_phrase": [{ "options": [{ "text": text }] }]
            }
        })
    }

    #[tokio::test]
    async fn test_search_above_threshold_skips_correction() {
        let engine = engine(vec![Ok(result_page(&["Keyboard A", "Keyboard B", "Keyboard C"]))]);
        let response = engine
            .search(&CatalogSearchRequest::with_query("keyboard"))
            .await;

        assert_eq!(response.total, 3);
        assert!(response.corrected_query.is_none());
        assert!(response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_search_reruns_with_corrected_term() {
        let engine = engine(vec![
            Ok(result_page(&[])),
            Ok(suggestion_response("keyboard")),
            Ok(result_page(&["Keyboard A", "Keyboard B"])),
        ]);
        let response = engine
            .search(&CatalogSearchRequest::with_query("keybord"))
            .await;

        assert_eq!(response.total, 2);
        assert_eq!(response.corrected_query.as_deref(), Some("keyboard"));
        assert_eq!(response.suggestions, vec!["keyboard"]);
        assert_eq!(
            response.items[0].document.corrected_query.as_deref(),
            Some("keyboard")
        );
    }

    #[tokio::test]
    async fn test_empty_result_falls_back_to_vocabulary() {
        let engine = engine(vec![
            Ok(result_page(&[])),
            // Suggester returns the original term, so no correction.
            Ok(suggestion_response("laptopp")),
            Ok(result_page(&["Monitor", "Laptop"])),
        ]);
        let response = engine
            .search(&CatalogSearchRequest::with_query("laptopp"))
            .await;

        assert!(response.is_empty());
        assert_eq!(response.suggestions, vec!["Laptop", "Monitor"]);
        assert!(response.corrected_query.is_none());
    }

    #[tokio::test]
    async fn test_empty_index_falls_back_to_static_suggestions() {
        let engine = engine(vec![
            Ok(result_page(&[])),
            Ok(json!({})),
            Ok(result_page(&[])),
        ]);
        let response = engine
            .search(&CatalogSearchRequest::with_query("anything"))
            .await;

        assert!(response.is_empty());
        assert_eq!(response.suggestions, QueryConfig::default().static_suggestions);
    }

    #[tokio::test]
    async fn test_store_failure_degrades() {
        let engine = engine(vec![Err(SearchStoreError::unavailable("down"))]);
        let response = engine
            .search(&CatalogSearchRequest::with_query("keyboard"))
            .await;

        assert!(response.is_empty());
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_blank_query_browses_without_suggestions() {
        let engine = engine(vec![Ok(result_page(&["Mouse"]))]);
        let response = engine.search(&CatalogSearchRequest::default()).await;

        assert_eq!(response.total, 1);
        assert!(response.suggestions.is_empty());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_parse_vocabulary_dedups_and_sorts() {
        let raw = json!({
            "hits": { "total": { "value": 4 }, "hits": [
                { "_source": { "name": "Mouse" } },
                { "_source": { "name": "Keyboard" } },
                { "_source": { "name": "Mouse" } },
                { "_source": { "name": "  " } }
            ]}
        });
        assert_eq!(parse_vocabulary(&raw, 5), vec!["Keyboard", "Mouse"]);
        assert_eq!(parse_vocabulary(&raw, 1), vec!["Keyboard"]);
    }
}
