pub mod autocomplete;
pub mod search;

pub use autocomplete::AutocompleteEngine;
pub use search::CatalogSearchEngine;
