//! # Response Formats
//!
//! The four tag output formats, how a request picks one, and how an
//! [`ItemTags`](crate::ItemTags) aggregate is rendered in each.
//!
//! - `negotiate`: `Accept` header parsing and format selection
//! - `render`: JSON, XML, CSV and plain-text bodies

pub mod negotiate;
pub mod render;

pub use negotiate::{negotiate, resolve_format};
pub use render::{format_value, render, render_csv, render_json, render_text, render_xml};

use crate::FolioError;
use std::str::FromStr;

/// A tag response format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
    Csv,
    Text,
}

impl Format {
    /// Every format, in server preference order for negotiation ties.
    pub const ALL: [Format; 4] = [Format::Json, Format::Xml, Format::Csv, Format::Text];

    /// Format for a path extension (`json`, `xml`, `csv`, `txt`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    /// Path extension of this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }

    /// `Content-Type` of this format.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Csv => "text/csv",
            Self::Text => "text/plain",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            let valid: Vec<&str> = Self::ALL.iter().map(|f| f.extension()).collect();
            FolioError::InvalidValue(format!(
                "unknown format \"{}\", expected one of: {}",
                s,
                valid.join(", ")
            ))
        })
    }
}

/// Split a trailing format extension off a path segment.
///
/// `MS-ADD-01234.json` becomes `("MS-ADD-01234", Some(Format::Json))`. A
/// suffix that is not a known extension stays part of the identifier.
#[must_use]
pub fn split_extension(segment: &str) -> (&str, Option<Format>) {
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => match Format::from_extension(ext) {
            Some(format) => (stem, Some(format)),
            None => (segment, None),
        },
        _ => (segment, None),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_roundtrip_names() {
        for format in Format::ALL {
            assert_eq!(Format::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn media_types() {
        assert_eq!(Format::Json.media_type(), "application/json");
        assert_eq!(Format::Xml.media_type(), "application/xml");
        assert_eq!(Format::Csv.media_type(), "text/csv");
        assert_eq!(Format::Text.media_type(), "text/plain");
    }

    #[test]
    fn parse_unknown_format_lists_valid() {
        let err = "pdf".parse::<Format>().expect_err("unknown");
        let msg = err.to_string();
        assert!(msg.contains("pdf"));
        assert!(msg.contains("json, xml, csv, txt"));
    }

    #[test]
    fn split_known_extension() {
        assert_eq!(split_extension("MS-FOO.json"), ("MS-FOO", Some(Format::Json)));
        assert_eq!(split_extension("MS-FOO.txt"), ("MS-FOO", Some(Format::Text)));
    }

    #[test]
    fn split_leaves_unknown_suffix() {
        assert_eq!(split_extension("MS-FOO.pdf"), ("MS-FOO.pdf", None));
        assert_eq!(split_extension("MS-FOO"), ("MS-FOO", None));
        assert_eq!(split_extension(".json"), (".json", None));
    }
}
