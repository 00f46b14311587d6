//! # Tag Rows
//!
//! Typed rows produced by tag data sources.
//!
//! Every row crossing the data-source boundary is validated here before
//! any tag set is built from it, so a bad row fails the whole load with a
//! descriptive [`FolioError::MalformedRow`].

use crate::FolioError;
use crate::primitives::MAX_TAG_LENGTH;
use serde::{Deserialize, Serialize};

/// One `(tag, frequency)` row from a tag data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTagRow")]
pub struct TagRow {
    tag: String,
    frequency: f64,
}

/// Unvalidated wire form of [`TagRow`].
#[derive(Deserialize)]
struct RawTagRow {
    tag: String,
    frequency: f64,
}

impl TryFrom<RawTagRow> for TagRow {
    type Error = FolioError;

    fn try_from(raw: RawTagRow) -> Result<Self, Self::Error> {
        Self::new(raw.tag, raw.frequency)
    }
}

impl TagRow {
    /// Validate and build a row.
    ///
    /// # Validation
    ///
    /// - `tag` is non-empty and at most `MAX_TAG_LENGTH` bytes
    /// - `tag` contains only characters XML 1.0 allows
    /// - `frequency` is finite
    pub fn new(tag: impl Into<String>, frequency: f64) -> Result<Self, FolioError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(FolioError::MalformedRow("tag name is empty".to_string()));
        }
        if tag.len() > MAX_TAG_LENGTH {
            return Err(FolioError::MalformedRow(format!(
                "tag name length {} exceeds maximum {} bytes",
                tag.len(),
                MAX_TAG_LENGTH
            )));
        }
        if let Some(c) = tag.chars().find(|&c| !is_xml_char(c)) {
            return Err(FolioError::MalformedRow(format!(
                "tag name {:?} contains disallowed character U+{:04X}",
                tag, c as u32
            )));
        }
        if !frequency.is_finite() {
            return Err(FolioError::MalformedRow(format!(
                "frequency of tag \"{}\" is not a finite number: {}",
                tag, frequency
            )));
        }
        Ok(Self { tag, frequency })
    }

    /// The tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The raw frequency.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Split into a `(name, value)` pair.
    #[must_use]
    pub fn into_pair(self) -> (String, f64) {
        (self.tag, self.frequency)
    }
}

/// True if `c` may appear in XML 1.0 character data.
#[must_use]
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_row() {
        let row = TagRow::new("manuscript", 3.0).expect("valid");
        assert_eq!(row.tag(), "manuscript");
        assert_eq!(row.frequency(), 3.0);
    }

    #[test]
    fn negative_frequency_allowed() {
        assert!(TagRow::new("removed", -2.0).is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        assert!(matches!(
            TagRow::new("", 1.0),
            Err(FolioError::MalformedRow(_))
        ));
    }

    #[test]
    fn oversized_name_rejected() {
        let name = "x".repeat(MAX_TAG_LENGTH + 1);
        assert!(matches!(
            TagRow::new(name, 1.0),
            Err(FolioError::MalformedRow(_))
        ));
    }

    #[test]
    fn control_characters_rejected() {
        for name in ["a\u{1}b", "\u{0}", "tag\u{1B}", "bad\u{FFFE}"] {
            let result = TagRow::new(name, 1.0);
            assert!(
                matches!(&result, Err(FolioError::MalformedRow(msg)) if msg.contains("disallowed")),
                "{name:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn whitespace_and_unicode_names_allowed() {
        for name in ["two\twords", "line\nbreak", "manuscrit médiéval", "写本", "\u{1F4DC}"] {
            assert!(TagRow::new(name, 1.0).is_ok(), "{name:?}");
        }
        assert!(is_xml_char('\r'));
        assert!(!is_xml_char('\u{7}'));
    }

    #[test]
    fn non_finite_frequency_rejected() {
        let err = TagRow::new("foo", f64::NAN).expect_err("nan");
        assert!(err.to_string().contains("foo"));
        assert!(TagRow::new("foo", f64::INFINITY).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: TagRow = serde_json::from_str(r#"{"tag":"foo","frequency":2}"#).expect("row");
        assert_eq!(ok.frequency(), 2.0);

        let bad = serde_json::from_str::<TagRow>(r#"{"tag":"","frequency":2}"#);
        assert!(bad.is_err());
    }
}
