//! # Tag Loader
//!
//! Concurrent fetch, weighting, merge and positive filter.

use super::TagSource;
use folio_core::{FolioError, ItemTags, MergedTagSet, TagSet, TagSetExt};
use futures_util::future::try_join_all;

/// Aggregate one document's tags across `sources`.
///
/// Every load starts before any is awaited. The merged contributors keep the
/// order of `sources` regardless of completion order, and the first failing
/// load fails the whole aggregation.
pub async fn load_tags(sources: &[TagSource], id: &str) -> Result<ItemTags, FolioError> {
    let loaded = try_join_all(sources.iter().map(|source| source.load_tags(id))).await?;

    let contributors = loaded.into_iter().map(TagSetExt::boxed).collect();
    let merged = MergedTagSet::new(contributors);
    let tags = merged.positive();

    tracing::debug!(
        classmark = id,
        sources = sources.len(),
        tags = tags.len(),
        "Aggregated tags"
    );

    Ok(ItemTags::new(id, tags.boxed()))
}

// =============================================================================
// TESTS
// =============================================================================
