//! Tiered autocomplete.
//!
//! Three strategies run in order of strictness: phrase-prefix, then a
//! case-insensitive contains-wildcard, then a fuzzy match. The first tier
//! that yields anything wins outright; tiers never merge. A tier that
//! fails at the store degrades to the next one.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use crate::config::QueryConfig;
use crate::interfaces::DocumentStore;

/// Autocomplete service over a [`DocumentStore`].
pub struct AutocompleteEngine {
    store: Arc<dyn DocumentStore>,
    config: QueryConfig,
}

impl AutocompleteEngine {
    pub fn new(store: Arc<dyn DocumentStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// Suggest product names completing the given prefix. Blank input
    /// returns nothing.
    pub async fn suggest(&self, prefix: &str) -> Vec<String> {
        let clean = prefix.trim().to_lowercase();
        if clean.is_empty() {
            return Vec::new();
        }

        let limit = self.config.autocomplete_limit;
        let tiers = [
            build_phrase_prefix_body(&clean, limit),
            build_wildcard_body(&clean, limit),
            build_fuzzy_body(&clean, limit),
        ];

        for body in tiers {
            match self.store.search_raw(body).await {
                Ok(raw) => {
                    let names = extract_names(&raw, limit);
                    if !names.is_empty() {
                        return names;
                    }
                }
                Err(e) => {
                    warn!(error = %e, prefix = %clean, "Autocomplete tier failed, trying next");
                }
            }
        }

        Vec::new()
    }
}

/// Tier 1: phrase-prefix multi-match, the strict completion case.
pub(crate) fn build_phrase_prefix_body(term: &str, limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "multi_match": {
                "query": term,
                "fields": ["name", "name_suggest"],
                "type": "phrase_prefix",
                "max_expansions": 20
            }
        }
    })
}

/// Tier 2: contains-anywhere wildcard over the same fields.
pub(crate) fn build_wildcard_body(term: &str, limit: usize) -> Value {
    let pattern = format!("*{}*", term);
    json!({
        "size": limit,
        "query": {
            "bool": {
                "should": [
                    { "wildcard": { "name": { "value": pattern, "case_insensitive": true } } },
                    { "wildcard": { "name_suggest": { "value": pattern, "case_insensitive": true } } }
                ]
            }
        }
    })
}

/// Tier 3: fuzzy match on the name, tolerating typos.
pub(crate) fn build_fuzzy_body(term: &str, limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "match": {
                "name": {
                    "query": term,
                    "fuzziness": "AUTO",
                    "max_expansions": 20
                }
            }
        }
    })
}

/// Distinct names from a tier response, order preserved, capped.
pub(crate) fn extract_names(raw: &Value, limit: usize) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(hits) = raw["hits"]["hits"].as_array() {
        for hit in hits {
            if let Some(name) = hit["_source"]["name"].as_str() {
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                    if names.len() == limit {
                        break;
                    }
                }
            }
        }
    }
    names
}
