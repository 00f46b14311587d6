//! # Content Negotiation
//!
//! Picks a [`Format`] from an explicit extension or an HTTP `Accept`
//! header.
//!
//! Each format is scored by the most specific media range that matches it
//! (`type/subtype` beats `type/*` beats `*/*`), using that range's `q`.
//! The best positive score wins, ties going to [`Format::ALL`] order. When
//! nothing is acceptable the answer is plain text, never an error.

use super::Format;

/// One parsed entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    quality: f64,
}

impl MediaRange<'_> {
    /// How specifically this range matches `media_type`, if at all.
    fn specificity(&self, media_type: &str) -> Option<u8> {
        let (kind, subtype) = media_type.split_once('/')?;
        if self.kind == "*" && self.subtype == "*" {
            Some(1)
        } else if self.kind.eq_ignore_ascii_case(kind) && self.subtype == "*" {
            Some(2)
        } else if self.kind.eq_ignore_ascii_case(kind) && self.subtype.eq_ignore_ascii_case(subtype)
        {
            Some(3)
        } else {
            None
        }
    }
}

/// Parse an `Accept` header. Malformed entries are skipped.
fn parse_accept(header: &str) -> Vec<MediaRange<'_>> {
    header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let media = parts.next()?.trim();
            let (kind, subtype) = match media {
                "*" => ("*", "*"),
                _ => media.split_once('/')?,
            };
            if kind.is_empty() || subtype.is_empty() {
                return None;
            }

            let mut quality = 1.0;
            for param in parts {
                if let Some((key, value)) = param.split_once('=') {
                    if key.trim().eq_ignore_ascii_case("q") {
                        quality = value.trim().parse::<f64>().ok()?;
                    }
                }
            }
            if !(0.0..=1.0).contains(&quality) {
                return None;
            }

            Some(MediaRange {
                kind: kind.trim(),
                subtype: subtype.trim(),
                quality,
            })
        })
        .collect()
}

/// Quality the client assigns to `format`, or `None` if no range matches.
fn quality_of(ranges: &[MediaRange<'_>], format: Format) -> Option<f64> {
    ranges
        .iter()
        .filter_map(|range| {
            range
                .specificity(format.media_type())
                .map(|specificity| (specificity, range.quality))
        })
        .max_by_key(|(specificity, _)| *specificity)
        .map(|(_, quality)| quality)
}

/// Choose a format from an `Accept` header.
///
/// A missing or blank header accepts everything.
#[must_use]
pub fn negotiate(accept: Option<&str>) -> Format {
    let header = accept.map(str::trim).unwrap_or_default();
    if header.is_empty() {
        return Format::ALL[0];
    }

    let ranges = parse_accept(header);
    let mut best: Option<(Format, f64)> = None;
    for format in Format::ALL {
        let Some(quality) = quality_of(&ranges, format) else {
            continue;
        };
        if quality <= 0.0 {
            continue;
        }
        if best.is_none_or(|(_, best_quality)| quality > best_quality) {
            best = Some((format, quality));
        }
    }

    best.map(|(format, _)| format).unwrap_or(Format::Text)
}

/// Resolve the response format: an explicit extension always wins.
#[must_use]
pub fn resolve_format(extension: Option<Format>, accept: Option<&str>) -> Format {
    extension.unwrap_or_else(|| negotiate(accept))
}

// =============================================================================
// TESTS
// =============================================================================
