//! # Core Type Definitions
//!
//! This module contains the shared value types of the tag subsystem:
//! - A single scored tag (`Tag`)
//! - The per-document aggregate (`ItemTags`)
//! - Error types (`FolioError`)
//!
//! ## Value Semantics
//!
//! Tag values are `f64`. They are frequencies, weighted scores or negative
//! adjustments; every value that reaches a tag set is finite (rows are
//! validated at the store boundary, see [`crate::rows`]).

use crate::tagset::TagSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

// =============================================================================
// TAG
// =============================================================================

/// A named numeric value, as emitted by renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// The tag name, unique within a tag set.
    pub name: String,
    /// The tag's (possibly weighted, possibly merged) value.
    pub value: f64,
}

impl Tag {
    /// Create a new tag.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Output ordering: value descending, then name ascending.
    ///
    /// `total_cmp` keeps the order total even for values that compare
    /// unordered with `partial_cmp`.
    #[must_use]
    pub fn output_order(&self, other: &Self) -> Ordering {
        other
            .value
            .total_cmp(&self.value)
            .then_with(|| self.name.cmp(&other.name))
    }
}

// =============================================================================
// ITEM TAGS
// =============================================================================

/// The aggregate tag result for one document.
pub struct ItemTags {
    /// The document identifier (classmark).
    pub id: String,
    /// The aggregated tags.
    pub tags: Box<dyn TagSet>,
}

impl ItemTags {
    /// Create a new aggregate.
    #[must_use]
    pub fn new(id: impl Into<String>, tags: Box<dyn TagSet>) -> Self {
        Self {
            id: id.into(),
            tags,
        }
    }

    /// Tags in output order (value descending, name ascending).
    #[must_use]
    pub fn sorted_tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .tags
            .entries()
            .into_iter()
            .map(|(name, value)| Tag::new(name, value))
            .collect();
        tags.sort_by(Tag::output_order);
        tags
    }
}

impl std::fmt::Debug for ItemTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemTags")
            .field("id", &self.id)
            .field("tags", &self.tags.to_map())
            .finish()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Folio tag subsystem.
///
/// - `NotFound` is the only failure of the tag set algebra
/// - `InvalidValue` covers every caller-supplied bad input
/// - All other variants are server-side failures
#[derive(Debug, Error)]
pub enum FolioError {
    /// A tag or document lookup failed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request parameter or configuration value is malformed.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A row produced by a tag data source failed validation.
    #[error("Malformed tag row: {0}")]
    MalformedRow(String),

    /// The tag store failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Rendering a response body failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl FolioError {
    /// Lookup failure for a tag name.
    #[must_use]
    pub fn tag_not_found(name: &str) -> Self {
        Self::NotFound(format!("tag \"{}\"", name))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagset::DefaultTagSet;

    #[test]
    fn output_order_is_value_desc_then_name_asc() {
        let mut tags = vec![
            Tag::new("abc", 10.0),
            Tag::new("foo", 42.0),
            Tag::new("bar", 42.0),
        ];
        tags.sort_by(Tag::output_order);

        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["bar", "foo", "abc"]);
    }

    #[test]
    fn item_tags_sorted() {
        let set = DefaultTagSet::from_pairs([("a", 1.0), ("b", 3.0), ("c", 2.0)]);
        let item = ItemTags::new("MS-1", Box::new(set));

        let names: Vec<_> = item.sorted_tags().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn not_found_message_names_tag() {
        let err = FolioError::tag_not_found("missing");
        assert_eq!(err.to_string(), "Not found: tag \"missing\"");
    }
}
