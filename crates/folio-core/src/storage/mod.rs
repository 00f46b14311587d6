//! # Storage
//!
//! Embedded persistence for the raw tag data behind the default sources.

pub mod redb_tags;

pub use redb_tags::{StoreCounts, TagRecord, TagStore, validate_classmark};
