//! Search result types returned by the catalog query engine.

use serde::{Deserialize, Serialize};

use crate::types::product_document::ProductDocument;

/// A single search hit: the document with highlight substitutions applied,
/// plus its relevance score from the search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductHit {
    #[serde(flatten)]
    pub document: ProductDocument,

    /// Relevance score assigned by the search engine. Higher is better.
    pub relevance_score: f64,
}

/// Complete search response with results, paging metadata, and the
/// suggestion/correction annotations from the spell-correction loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSearchResponse {
    /// The page of results, ordered per the request sort.
    pub items: Vec<ProductHit>,

    /// Total number of matching documents across all pages.
    pub total: u64,

    /// Zero-based page index echoed from the request.
    pub page: usize,

    /// Page size echoed from the request.
    pub page_size: usize,

    /// Alternative terms for the caller when results are empty or corrected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    /// The corrected term when a spelling correction was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_query: Option<String>,

    /// Set when the search engine was unreachable; the response is then an
    /// empty page, not an authoritative "no matches".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CatalogSearchResponse {
    /// Create an empty page with no annotations.
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
            suggestions: Vec::new(),
            corrected_query: None,
            error: None,
        }
    }

    /// Create an empty page carrying an error indicator.
    pub fn degraded(page: usize, page_size: usize, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(page, page_size)
        }
    }

    /// Returns true if there are no results on this page.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_empty_response() {
        let response = CatalogSearchResponse::empty(0, 12);
        assert!(response.is_empty());
        assert_eq!(response.total, 0);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_degraded_response_carries_error() {
        let response = CatalogSearchResponse::degraded(2, 12, "search engine unreachable");
        assert!(response.is_empty());
        assert_eq!(response.page, 2);
        assert_eq!(
            response.error.as_deref(),
            Some("search engine unreachable")
        );
    }

    #[test]
    fn test_serialization_omits_empty_annotations() {
        let response = CatalogSearchResponse::empty(0, 12);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("suggestions").is_none());
        assert!(json.get("corrected_query").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_hit_flattens_document() {
        let hit = ProductHit {
            document: ProductDocument::new(
                Uuid::new_v4(),
                "Keyboard".to_string(),
                "Mechanical".to_string(),
                149.9,
            ),
            relevance_score: 2.5,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["name"], "Keyboard");
        assert_eq!(json["relevance_score"], 2.5);
    }
}
