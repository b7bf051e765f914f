//! OpenSearch index configuration and mappings.
//!
//! This module defines the versioned index naming scheme, the stable
//! read/write aliases, and the settings and mappings for the product
//! catalog index.

use serde_json::{json, Value};

/// The base name of the catalog index (without version).
pub const INDEX_BASE_NAME: &str = "products";

/// Configuration for the catalog index.
///
/// The versioned index `products_v{n}` sits behind two stable aliases:
/// `products_read` for the query path and `products_write` for the write
/// path. Cutting over to a new index version repoints the aliases without
/// interrupting either path.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The base name for the index family (e.g., "products").
    pub base: String,
    /// The version number of the active index (e.g., 1 for "products_v1").
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(base: impl Into<String>, version: u32) -> Self {
        Self {
            base: base.into(),
            version,
        }
    }

    /// The versioned index name (e.g., "products_v1").
    pub fn versioned_index(&self) -> String {
        format!("{}_v{}", self.base, self.version)
    }

    /// The stable alias used by the query path.
    pub fn read_alias(&self) -> String {
        format!("{}_read", self.base)
    }

    /// The stable alias used by the write path.
    pub fn write_alias(&self) -> String {
        format!("{}_write", self.base)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(INDEX_BASE_NAME, 1)
    }
}

/// Get the index settings and mappings for the product catalog index.
///
/// The configuration includes:
/// - **Edge-ngram autocomplete analyzer** on `name` (indexed with ngrams,
///   searched with the standard analyzer) plus `name.standard` for ranked
///   full-text matching and `name.raw` for exact lookups
/// - **Spelling dictionary fields**: `name_suggest` (verbatim name) and
///   `name_spell` (suffix-cleaned name) with the standard analyzer
/// - **Lowercase-normalized keyword** for the identity key, so duplicate
///   lookups are exact point queries
/// - **Date fields** for the audit timestamps
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1,
            "analysis": {
                "analyzer": {
                    "autocomplete_analyzer": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", "autocomplete_edge_ngram"]
                    }
                },
                "filter": {
                    "autocomplete_edge_ngram": {
                        "type": "edge_ngram",
                        "min_gram": 2,
                        "max_gram": 20
                    }
                },
                "normalizer": {
                    "lowercase_normalizer": {
                        "type": "custom",
                        "filter": ["lowercase"]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "id": {
                    "type": "keyword"
                },
                "name": {
                    "type": "text",
                    "analyzer": "autocomplete_analyzer",
                    "search_analyzer": "standard",
                    "fields": {
                        "standard": {
                            "type": "text",
                            "analyzer": "standard"
                        },
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "description": {
                    "type": "text"
                },
                "price": {
                    "type": "double"
                },
                "name_suggest": {
                    "type": "text",
                    "analyzer": "standard"
                },
                "name_spell": {
                    "type": "text",
                    "analyzer": "standard"
                },
                "identity_key": {
                    "type": "keyword",
                    "normalizer": "lowercase_normalizer"
                },
                "updated_at": {
                    "type": "date"
                },
                "price_changed_at": {
                    "type": "date"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_and_index_names() {
        let config = IndexConfig::default();
        assert_eq!(config.versioned_index(), "products_v1");
        assert_eq!(config.read_alias(), "products_read");
        assert_eq!(config.write_alias(), "products_write");

        let config = IndexConfig::new("catalog", 3);
        assert_eq!(config.versioned_index(), "catalog_v3");
        assert_eq!(config.read_alias(), "catalog_read");
        assert_eq!(config.write_alias(), "catalog_write");
    }

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert_eq!(
            settings["settings"]["analysis"]["filter"]["autocomplete_edge_ngram"]["type"],
            "edge_ngram"
        );

        let props = &settings["mappings"]["properties"];
        assert_eq!(props["name"]["analyzer"], "autocomplete_analyzer");
        assert_eq!(props["name"]["search_analyzer"], "standard");
        assert_eq!(props["name"]["fields"]["standard"]["type"], "text");
        assert_eq!(props["name"]["fields"]["raw"]["type"], "keyword");
        assert_eq!(props["identity_key"]["type"], "keyword");
        assert_eq!(props["identity_key"]["normalizer"], "lowercase_normalizer");
        assert_eq!(props["price"]["type"], "double");
        assert_eq!(props["name_spell"]["analyzer"], "standard");
        assert_eq!(props["updated_at"]["type"], "date");
        assert_eq!(props["price_changed_at"]["type"], "date");
    }
}
