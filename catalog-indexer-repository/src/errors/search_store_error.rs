//! Search store error types.
//!
//! This module defines the unified error type for all document store and
//! query operations. The write-path retry decision is a pure function of
//! these variants, so the taxonomy distinguishes transient failures
//! (optimistic-concurrency loss, backend unavailability) from failures that
//! redelivery can never fix.

use thiserror::Error;

/// Unified errors from document store and query operations.
#[derive(Debug, Clone, Error)]
pub enum SearchStoreError {
    /// A conditional write lost an optimistic-concurrency race, or a
    /// create-only write found the id already present.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// The requested document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The search engine is unreachable or returned a server-side failure.
    #[error("Search engine unavailable: {0}")]
    Unavailable(String),

    /// Input failed validation (e.g., empty id, malformed field).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to serialize a document or request body.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to create the versioned index or its aliases.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// A query request was rejected by the search engine.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchStoreError {
    /// Create a write conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unavailability error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Whether redelivering the triggering message could plausibly succeed.
    ///
    /// Conflicts resolve once the racing writer finishes; unavailability and
    /// unclassified failures may clear up. Validation, serialization, and
    /// parse failures are deterministic and will fail identically on every
    /// redelivery.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::Unavailable(_) | Self::QueryError(_) | Self::Unknown(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SearchStoreError::conflict("seq_no mismatch").is_transient());
        assert!(SearchStoreError::unavailable("connection refused").is_transient());
        assert!(SearchStoreError::unknown("timeout").is_transient());

        assert!(!SearchStoreError::validation("empty id").is_transient());
        assert!(!SearchStoreError::serialization("bad body").is_transient());
        assert!(!SearchStoreError::parse("unexpected shape").is_transient());
        assert!(!SearchStoreError::not_found("gone").is_transient());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = SearchStoreError::conflict("version_conflict_engine_exception");
        assert!(err.to_string().contains("version_conflict_engine_exception"));
    }
}
