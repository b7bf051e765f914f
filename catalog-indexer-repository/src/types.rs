//! Request/response types shared between the document store trait, the
//! write engine, and their callers.

/// Optimistic-concurrency handle returned alongside every read and required
/// by conditional writes.
///
/// Maps onto the search engine's per-document sequence number and per-shard
/// primary term; a conditional write with a stale pair is rejected with a
/// distinguishable conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionToken {
    pub seq_no: i64,
    pub primary_term: i64,
}

impl VersionToken {
    pub fn new(seq_no: i64, primary_term: i64) -> Self {
        Self {
            seq_no,
            primary_term,
        }
    }
}

/// The terminal result of a write-engine operation.
///
/// Every variant is a success from the caller's point of view; the variants
/// exist so consumers can log what actually happened (a skipped duplicate is
/// not the same thing as a fresh create).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A create event produced a new document.
    Created,
    /// A create event matched an existing identity key and was skipped.
    SkippedDuplicate,
    /// An update event was applied through the conditional-write protocol.
    Updated,
    /// An update event arrived before its create was visible and fell back
    /// to creating the document.
    CreatedFromUpdate,
    /// A delete event removed the document.
    Deleted,
    /// A delete event targeted an id that was already absent.
    AlreadyAbsent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_token_equality() {
        let a = VersionToken::new(7, 2);
        let b = VersionToken::new(7, 2);
        assert_eq!(a, b);
        assert_ne!(a, VersionToken::new(8, 2));
        assert_ne!(a, VersionToken::new(7, 3));
    }
}
