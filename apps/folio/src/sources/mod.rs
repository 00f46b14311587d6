//! # Tag Sources
//!
//! Named, weighted, asynchronous providers of per-document tag sets.
//!
//! ## Pipeline
//!
//! 1. `select_tag_sources` turns the `?sources=` parameter into an ordered
//!    list of sources from a `TagSourceRegistry`
//! 2. `loader::load_tags` fetches every selected source concurrently
//! 3. Each result is weighted, all are merged by summation, and the merge is
//!    filtered to positive values
//!
//! The registry is an ordinary value owned by the server state. Nothing here
//! is global or mutable after construction.

pub mod loader;
pub mod store;

pub use loader::load_tags;
pub use store::store_registry;

use folio_core::{FolioError, TagSet, WeightedTagSet, primitives::SOURCE_LIST_SEPARATOR};
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

// =============================================================================
// LOAD FUNCTIONS
// =============================================================================

/// The boxed future returned by a tag load function.
pub type TagLoadFuture = Pin<Box<dyn Future<Output = Result<Box<dyn TagSet>, FolioError>> + Send>>;

/// Fetches the raw tag set of one document, keyed by classmark.
///
/// Load functions are shared between requests and may run concurrently.
pub type TagLoadFunction = Arc<dyn Fn(String) -> TagLoadFuture + Send + Sync>;

// =============================================================================
// TAG SOURCE
// =============================================================================

/// A load function paired with the weight applied to everything it returns.
#[derive(Clone)]
pub struct TagSource {
    load: TagLoadFunction,
    weight: f64,
}

impl TagSource {
    /// Create a source from an async load function.
    pub fn new<F, Fut>(weight: f64, load: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Box<dyn TagSet>, FolioError>> + Send + 'static,
    {
        let load: TagLoadFunction = Arc::new(move |id: String| -> TagLoadFuture {
            Box::pin(load(id))
        });
        Self { load, weight }
    }

    /// The weight applied to loaded values.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The same load function under a different weight.
    #[must_use]
    pub fn with_weight(&self, weight: f64) -> Self {
        Self {
            load: Arc::clone(&self.load),
            weight,
        }
    }

    /// Load one document's tags and apply this source's weight.
    pub async fn load_tags(
        &self,
        id: impl Into<String>,
    ) -> Result<WeightedTagSet<Box<dyn TagSet>>, FolioError> {
        let raw = (self.load)(id.into()).await?;
        Ok(WeightedTagSet::new(raw, self.weight))
    }
}

impl std::fmt::Debug for TagSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSource")
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Every source a server knows, by name. Names iterate in sorted order.
#[derive(Debug, Clone, Default)]
pub struct TagSourceRegistry {
    sources: BTreeMap<String, TagSource>,
}

impl TagSourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named source.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, source: TagSource) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Look up one source.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TagSource> {
        self.sources.get(name)
    }

    /// Every source, in name order.
    pub fn all(&self) -> Vec<TagSource> {
        self.sources.values().cloned().collect()
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if no source is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Copy of this registry with some weights overridden.
    ///
    /// Every overridden name must already be registered.
    pub fn reweighted(&self, weights: &BTreeMap<String, f64>) -> Result<Self, FolioError> {
        let mut sources = self.sources.clone();
        for (name, weight) in weights {
            let Some(source) = sources.get_mut(name) else {
                return Err(self.unknown_source(name));
            };
            *source = source.with_weight(*weight);
        }
        Ok(Self { sources })
    }

    fn unknown_source(&self, name: &str) -> FolioError {
        FolioError::InvalidValue(format!(
            "Unknown tag source: \"{}\"; valid sources are: {}",
            name,
            self.names().join(", ")
        ))
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// Which sources a request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedSources<'a> {
    /// No explicit list: every registered source.
    All,
    /// Explicit names, in request order.
    List(Vec<&'a str>),
}

impl<'a> From<&'a str> for RequestedSources<'a> {
    /// Parse a comma-separated list. Names are taken verbatim.
    fn from(list: &'a str) -> Self {
        Self::List(list.split(SOURCE_LIST_SEPARATOR).collect())
    }
}

impl<'a> From<Option<&'a str>> for RequestedSources<'a> {
    fn from(list: Option<&'a str>) -> Self {
        list.map_or(Self::All, Self::from)
    }
}

impl<'a> From<Vec<&'a str>> for RequestedSources<'a> {
    fn from(names: Vec<&'a str>) -> Self {
        Self::List(names)
    }
}

/// Resolve requested names against the registry, preserving request order.
///
/// Fails with `InvalidValue` on a repeated name or a name the registry does
/// not know; the latter message lists every valid name.
pub fn select_tag_sources(
    registry: &TagSourceRegistry,
    requested: RequestedSources<'_>,
) -> Result<Vec<TagSource>, FolioError> {
    let names = match requested {
        RequestedSources::All => return Ok(registry.all()),
        RequestedSources::List(names) => names,
    };

    let mut seen = BTreeSet::new();
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name) {
            return Err(FolioError::InvalidValue(format!(
                "Duplicate tag source: \"{}\"",
                name
            )));
        }
        let source = registry
            .get(name)
            .ok_or_else(|| registry.unknown_source(name))?;
        selected.push(source.clone());
    }
    Ok(selected)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{DefaultTagSet, TagSetExt};

    fn constant(weight: f64, pairs: &'static [(&'static str, f64)]) -> TagSource {
        TagSource::new(weight, move |_id| async move {
            Ok(DefaultTagSet::from_pairs(pairs.iter().copied()).boxed())
        })
    }

    fn registry() -> TagSourceRegistry {
        TagSourceRegistry::new()
            .with_source("user-removes", constant(0.2, &[("foo", -1.0)]))
            .with_source("third-party", constant(1.0, &[("foo", 10.0)]))
            .with_source("annotations", constant(0.2, &[("foo", 1.0)]))
    }

    #[test]
    fn names_are_sorted() {
        assert_eq!(
            registry().names(),
            vec!["annotations", "third-party", "user-removes"]
        );
    }

    #[test]
    fn all_sources_when_none_requested() {
        let selected = select_tag_sources(&registry(), RequestedSources::from(None::<&str>))
            .expect("select");
        let weights: Vec<f64> = selected.iter().map(TagSource::weight).collect();
        assert_eq!(weights, vec![0.2, 1.0, 0.2]);
    }

    #[test]
    fn selection_keeps_request_order() {
        let selected =
            select_tag_sources(&registry(), "third-party,user-removes".into()).expect("select");
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].weight(), 1.0);
        assert_eq!(selected[1].weight(), 0.2);
    }

    #[test]
    fn unknown_source_lists_valid_names() {
        let err = select_tag_sources(&registry(), "3rd-party".into()).expect_err("unknown");
        assert!(matches!(
            &err,
            FolioError::InvalidValue(msg)
                if msg.contains("\"3rd-party\"")
                    && msg.ends_with("annotations, third-party, user-removes")
        ));
    }

    #[test]
    fn duplicate_source_rejected() {
        let err = select_tag_sources(&registry(), vec!["annotations", "annotations"].into())
            .expect_err("duplicate");
        assert!(matches!(err, FolioError::InvalidValue(msg) if msg.contains("Duplicate")));
    }

    #[test]
    fn names_are_not_trimmed() {
        let err = select_tag_sources(&registry(), "annotations, third-party".into())
            .expect_err("space");
        assert!(matches!(err, FolioError::InvalidValue(msg) if msg.contains("\" third-party\"")));
    }

    #[test]
    fn reweighted_overrides_known_names() {
        let weights = BTreeMap::from([("annotations".to_string(), 0.5)]);
        let registry = registry().reweighted(&weights).expect("reweight");
        assert_eq!(registry.get("annotations").map(TagSource::weight), Some(0.5));
        assert_eq!(registry.get("third-party").map(TagSource::weight), Some(1.0));

        let bad = BTreeMap::from([("nope".to_string(), 1.0)]);
        assert!(matches!(
            registry.reweighted(&bad),
            Err(FolioError::InvalidValue(_))
        ));
    }

    #[tokio::test]
    async fn source_applies_weight() {
        let source = constant(0.2, &[("foo", 5.0)]);
        let tags = source.load_tags("MS-1").await.expect("load");
        assert_eq!(tags.value("foo").expect("foo"), 1.0);
    }
}
