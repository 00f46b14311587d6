//! # folio-core
//!
//! The tag aggregation logic for Folio - THE LOGIC.
//!
//! Folio serves item metadata for a digital library. This crate holds the
//! part of it with actual algorithmic design: composable weighted tag sets
//! and the content-negotiated rendering of an aggregated tag result.
//!
//! ## Modules
//!
//! - `tagset`: the `TagSet` trait and its default, weighted, merged and
//!   filtered variants
//! - `rows`: validated `(tag, frequency)` rows from data sources
//! - `formats`: format negotiation and JSON/XML/CSV/text rendering
//! - `storage`: redb store backing the default tag sources
//! - `types`: shared types and `FolioError`
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies (pure Rust)
//! - Tag sets are immutable; composition wraps, never mutates
//! - Renderers always emit tags value-descending, name-ascending

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod primitives;
pub mod rows;
pub mod storage;
pub mod tagset;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{FolioError, ItemTags, Tag};

// =============================================================================
// RE-EXPORTS: Tag Set Algebra
// =============================================================================

pub use rows::TagRow;
pub use tagset::{
    DefaultTagSet, FilterTagSet, MergeFn, MergedTagSet, TagSet, TagSetExt, WeightedTagSet,
};

// =============================================================================
// RE-EXPORTS: Formats & Storage
// =============================================================================

pub use formats::{Format, negotiate, render, resolve_format, split_extension};
pub use storage::{StoreCounts, TagRecord, TagStore};
