//! Product document types for the search index.
//!
//! This module defines the document structure that is stored in the search
//! engine, including the derived fields (identity key, normalized name
//! variants) and audit timestamps that the write path keeps in sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the generated disambiguation suffix appended to product names
/// by the system of record (a lowercase hexadecimal token).
const HEX_SUFFIX_LEN: usize = 6;

/// Document representation of a product in the search index.
///
/// Derived fields are never set directly: `new` and `apply_update` keep
/// `name_suggest`, `name_spell`, `identity_key` and the audit timestamps
/// consistent with the payload fields.
///
/// # Fields
///
/// - `id`: stable identifier assigned by the system of record
/// - `name`, `description`, `price`: mutable payload fields
/// - `name_suggest`: copy of `name`, analyzed for autocomplete
/// - `name_spell`: `name` with the generated hex suffix stripped, used as the
///   spelling dictionary field
/// - `identity_key`: content-derived duplicate-detection key
/// - `updated_at`: bumped on every applied write
/// - `price_changed_at`: bumped only when a write changes the price value
/// - `corrected_query`: query-time annotation, never authoritative state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDocument {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub name_suggest: String,
    pub name_spell: String,
    pub identity_key: String,
    pub updated_at: DateTime<Utc>,
    pub price_changed_at: DateTime<Utc>,
    /// Set on search results when a spelling correction was applied to the
    /// query that produced them. Not part of the indexed document state.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub corrected_query: Option<String>,
}

impl ProductDocument {
    /// Create a new document with all derived fields computed.
    ///
    /// The initial price counts as a price change, so both audit timestamps
    /// start at creation time.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_indexer_shared::ProductDocument;
    /// use uuid::Uuid;
    ///
    /// let doc = ProductDocument::new(
    ///     Uuid::new_v4(),
    ///     "Keyboard RGB".to_string(),
    ///     "Mechanical keyboard".to_string(),
    ///     149.90,
    /// );
    /// assert_eq!(doc.identity_key, "keyboard rgb::mechanical keyboard");
    /// ```
    pub fn new(id: Uuid, name: String, description: String, price: f64) -> Self {
        let now = Utc::now();
        let name_suggest = name.clone();
        let name_spell = clean_name_for_spellcheck(&name);
        let identity_key = build_identity_key(&name, &description);

        Self {
            id,
            name,
            description,
            price,
            name_suggest,
            name_spell,
            identity_key,
            updated_at: now,
            price_changed_at: now,
            corrected_query: None,
        }
    }

    /// Overlay the payload fields of `incoming` onto this document.
    ///
    /// Recomputes the derived fields, bumps `updated_at`, and bumps
    /// `price_changed_at` only if the price value actually changed. Fields
    /// not carried by events (audit timestamps) are preserved from `self`,
    /// so a stale read never clobbers them backwards.
    pub fn apply_update(&mut self, incoming: &ProductDocument) {
        let price_changed = self.price != incoming.price;

        self.name = incoming.name.clone();
        self.description = incoming.description.clone();
        self.price = incoming.price;
        self.name_suggest = self.name.clone();
        self.name_spell = clean_name_for_spellcheck(&self.name);
        self.identity_key = build_identity_key(&self.name, &self.description);

        self.updated_at = Utc::now();
        if price_changed {
            self.price_changed_at = self.updated_at;
        }
    }

    /// Recompute the derived fields from the current payload fields.
    ///
    /// Inbound event payloads carry only the payload fields; this fills in
    /// everything the producer does not send.
    pub fn rebuild_derived_fields(&mut self) {
        self.name_suggest = self.name.clone();
        self.name_spell = clean_name_for_spellcheck(&self.name);
        self.identity_key = build_identity_key(&self.name, &self.description);
    }
}

/// Build the content-derived identity key for duplicate detection.
///
/// The key is a pure function of `name` and `description`:
/// `lowercase(trim(name)) + "::" + lowercase(trim(description))`.
pub fn build_identity_key(name: &str, description: &str) -> String {
    format!(
        "{}::{}",
        name.trim().to_lowercase(),
        description.trim().to_lowercase()
    )
}

/// Strip a trailing 6-character lowercase hexadecimal disambiguation suffix
/// from a product name.
///
/// The system of record appends such suffixes to avoid name collisions;
/// indexing them into the spelling dictionary would turn every suffix into a
/// candidate "correction", so the spellcheck field uses the cleaned name.
pub fn clean_name_for_spellcheck(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.len() >= HEX_SUFFIX_LEN {
        let split = trimmed.len() - HEX_SUFFIX_LEN;
        if trimmed.is_char_boundary(split) {
            let (head, tail) = trimmed.split_at(split);
            if tail
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            {
                return head.trim_end().to_string();
            }
        }
    }
    trimmed.to_string()
}
