//! Query-side tuning knobs.

/// Configuration for the search and autocomplete engines.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Below this many direct hits a spell-corrected rerun is attempted.
    pub low_result_threshold: u64,
    /// Maximum number of distinct product names sampled for the
    /// vocabulary fallback.
    pub vocabulary_limit: usize,
    /// Maximum number of suggestions returned on an empty result.
    pub suggestion_limit: usize,
    /// Maximum number of autocomplete completions.
    pub autocomplete_limit: usize,
    /// Canned suggestions shown when the index has nothing to offer.
    pub static_suggestions: Vec<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            low_result_threshold: 3,
            vocabulary_limit: 200,
            suggestion_limit: 5,
            autocomplete_limit: 10,
            static_suggestions: vec![
                "laptop".to_string(),
                "phone".to_string(),
                "monitor".to_string(),
                "keyboard".to_string(),
                "headphones".to_string(),
            ],
        }
    }
}
