//! # API Request/Response Types
//!
//! Structures carried in and out of the HTTP handlers.

use axum::http::HeaderValue;
use folio_core::{Format, resolve_format};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// TAG REQUEST
// =============================================================================

/// Query string of the tag endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagQuery {
    /// Comma-separated source names; absent means every source.
    pub sources: Option<String>,
}

/// The `Accept` header as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AcceptHeader {
    /// No header; negotiates as `*/*`.
    #[default]
    Missing,
    /// Header text, parsed during negotiation.
    Text(String),
    /// Header bytes outside visible ASCII; no media range can match.
    Unreadable,
}

impl AcceptHeader {
    /// Classify a raw header value.
    #[must_use]
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        match value.map(HeaderValue::to_str) {
            None => Self::Missing,
            Some(Ok(text)) => Self::Text(text.to_string()),
            Some(Err(_)) => Self::Unreadable,
        }
    }
}

impl From<&str> for AcceptHeader {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Everything needed to answer one tag request, extracted from HTTP.
#[derive(Debug, Clone, PartialEq)]
pub struct TagRequest {
    /// Document classmark, extension removed.
    pub classmark: String,
    /// Format forced by a path extension.
    pub extension: Option<Format>,
    /// The `Accept` header.
    pub accept: AcceptHeader,
    /// Raw `sources` parameter.
    pub sources: Option<String>,
}

impl TagRequest {
    /// Build from the `{classmark}` path segment, splitting off a known extension.
    #[must_use]
    pub fn from_segment(segment: &str, query: TagQuery, accept: AcceptHeader) -> Self {
        let (classmark, extension) = folio_core::split_extension(segment);
        Self {
            classmark: classmark.to_string(),
            extension,
            accept,
            sources: query.sources,
        }
    }

    /// The response format: extension first, then the `Accept` header.
    ///
    /// An unreadable header acts like one no format satisfies, so the
    /// result is plain text.
    #[must_use]
    pub fn format(&self) -> Format {
        match &self.accept {
            AcceptHeader::Missing => resolve_format(self.extension, None),
            AcceptHeader::Text(text) => resolve_format(self.extension, Some(text)),
            AcceptHeader::Unreadable => self.extension.unwrap_or(Format::Text),
        }
    }
}
