//! Search request types for the catalog query engine.

use serde::{Deserialize, Serialize};

/// Sort direction for search results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The order keyword the search engine expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Highest page index a caller may request. Deep pagination beyond this is
/// rejected rather than turned into an enormous result-window offset.
pub const MAX_PAGE: usize = 10_000;

fn default_page_size() -> usize {
    12
}

fn default_sort_field() -> String {
    "price".to_string()
}

/// Parameters for a catalog search.
///
/// A blank or absent `query` matches all documents (browse mode); price
/// bounds are optional and may be given independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSearchRequest {
    /// Full-text query. `None` or blank returns the default-sorted catalog.
    #[serde(default)]
    pub query: Option<String>,

    /// Inclusive lower price bound.
    #[serde(default)]
    pub min_price: Option<f64>,

    /// Inclusive upper price bound.
    #[serde(default)]
    pub max_price: Option<f64>,

    /// Zero-based page index.
    #[serde(default)]
    pub page: usize,

    /// Page size. Default is 12, capped at 100.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Field to sort by.
    #[serde(default = "default_sort_field")]
    pub sort_field: String,

    /// Sort direction.
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl Default for CatalogSearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            min_price: None,
            max_price: None,
            page: 0,
            page_size: default_page_size(),
            sort_field: default_sort_field(),
            sort_direction: SortDirection::Asc,
        }
    }
}

impl CatalogSearchRequest {
    /// Create a request for the given query text with default paging.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Set the price bounds.
    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Set the page index.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Set the page size, clamped to 1..=100.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    /// Set the sort field and direction.
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = field.into();
        self.sort_direction = direction;
        self
    }

    /// The query text with surrounding whitespace removed, when non-blank.
    pub fn query_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Validate the request parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("page_size must be at least 1".to_string());
        }
        if self.page_size > 100 {
            return Err("page_size cannot exceed 100".to_string());
        }
        if self.page > MAX_PAGE {
            return Err(format!("page cannot exceed {}", MAX_PAGE));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err("min_price cannot exceed max_price".to_string());
            }
        }
        if self.sort_field.trim().is_empty() {
            return Err("sort_field cannot be empty".to_string());
        }
        Ok(())
    }
}
