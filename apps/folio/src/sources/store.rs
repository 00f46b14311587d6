//! # Store-Backed Sources
//!
//! The default registry: three sources reading aggregations from the redb
//! tag store. redb reads block, so each load runs on the blocking pool.

use super::{TagSource, TagSourceRegistry};
use folio_core::{
    DefaultTagSet, FolioError, TagRow, TagSetExt, TagStore,
    primitives::{
        ANNOTATIONS_SOURCE, ANNOTATIONS_WEIGHT, THIRD_PARTY_SOURCE, THIRD_PARTY_WEIGHT,
        USER_REMOVES_SOURCE, USER_REMOVES_WEIGHT,
    },
};
use std::sync::Arc;

/// A store aggregation producing validated rows for one classmark.
type RowQuery = fn(&TagStore, &str) -> Result<Vec<TagRow>, FolioError>;

/// Build the default registry over a shared store.
pub fn store_registry(store: Arc<TagStore>) -> TagSourceRegistry {
    TagSourceRegistry::new()
        .with_source(
            THIRD_PARTY_SOURCE,
            store_source(Arc::clone(&store), THIRD_PARTY_WEIGHT, TagStore::third_party_rows),
        )
        .with_source(
            ANNOTATIONS_SOURCE,
            store_source(Arc::clone(&store), ANNOTATIONS_WEIGHT, TagStore::annotation_rows),
        )
        .with_source(
            USER_REMOVES_SOURCE,
            store_source(store, USER_REMOVES_WEIGHT, TagStore::removal_rows),
        )
}

fn store_source(store: Arc<TagStore>, weight: f64, query: RowQuery) -> TagSource {
    TagSource::new(weight, move |classmark: String| {
        let store = Arc::clone(&store);
        async move {
            let rows = tokio::task::spawn_blocking(move || query(&store, &classmark))
                .await
                .map_err(|e| FolioError::StorageError(format!("Tag query task failed: {}", e)))??;
            Ok(DefaultTagSet::from_rows(rows).boxed())
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
