pub mod index_config;
pub mod provider;

pub use index_config::{get_index_settings, IndexConfig, INDEX_BASE_NAME};
pub use provider::OpenSearchProvider;
