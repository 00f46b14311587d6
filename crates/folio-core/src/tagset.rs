//! # TagSet Algebra
//!
//! Read-only, composable views over named numeric values.
//!
//! - [`DefaultTagSet`] owns its values and is the leaf of every composition
//! - [`WeightedTagSet`] scales every value of one parent by a fixed weight
//! - [`MergedTagSet`] unions any number of contributors, reducing
//!   same-named values with a merge function (default: addition)
//! - [`FilterTagSet`] narrows one parent with a predicate
//!
//! A tag set is never mutated after construction. Composition only creates
//! new views that own (or borrow) the sets they wrap, so a composition is
//! always a tree.
//!
//! ## Lookup Contract
//!
//! `value(name)` fails with [`FolioError::NotFound`] exactly when
//! `contains(name)` is false. That is the only failure of the algebra.

use crate::rows::TagRow;
use crate::{FolioError, Tag};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// =============================================================================
// TAGSET TRAIT
// =============================================================================

/// Capability set shared by every tag set variant.
///
/// Tag sets must be `Send + Sync` so an aggregate can be held across await
/// points and rendered from any worker thread.
pub trait TagSet: Send + Sync {
    /// Names of every tag in the set. Order carries no meaning.
    fn tags(&self) -> Vec<&str>;

    /// Membership test.
    fn contains(&self, name: &str) -> bool;

    /// Value of the named tag.
    ///
    /// Returns `FolioError::NotFound` if `contains(name)` is false.
    fn value(&self, name: &str) -> Result<f64, FolioError>;

    /// Every `(name, value)` pair in the set.
    fn entries(&self) -> Vec<(&str, f64)> {
        self.tags()
            .into_iter()
            .filter_map(|name| self.value(name).ok().map(|value| (name, value)))
            .collect()
    }

    /// Materialize into a plain name → value mapping.
    fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Number of tags in the set.
    fn len(&self) -> usize {
        self.tags().len()
    }

    /// True if the set has no tags.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: TagSet + ?Sized> TagSet for &T {
    fn tags(&self) -> Vec<&str> {
        (**self).tags()
    }

    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }

    fn value(&self, name: &str) -> Result<f64, FolioError> {
        (**self).value(name)
    }
}

impl<T: TagSet + ?Sized> TagSet for Box<T> {
    fn tags(&self) -> Vec<&str> {
        (**self).tags()
    }

    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }

    fn value(&self, name: &str) -> Result<f64, FolioError> {
        (**self).value(name)
    }
}

impl<T: TagSet + ?Sized> TagSet for Arc<T> {
    fn tags(&self) -> Vec<&str> {
        (**self).tags()
    }

    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }

    fn value(&self, name: &str) -> Result<f64, FolioError> {
        (**self).value(name)
    }
}

// =============================================================================
// DEFAULT TAGSET
// =============================================================================

/// A tag set that owns its values.
///
/// Duplicate names in the construction input are summed, so building from
/// raw per-row frequencies gives the same result as building from rows that
/// were aggregated first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultTagSet {
    tags: BTreeMap<String, f64>,
}

impl DefaultTagSet {
    /// Create an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs. Duplicate names are summed.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut tags: BTreeMap<String, f64> = BTreeMap::new();
        for (name, value) in pairs {
            *tags.entry(name.into()).or_insert(0.0) += value;
        }
        Self { tags }
    }

    /// Build from validated store rows.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = TagRow>,
    {
        Self::from_pairs(rows.into_iter().map(TagRow::into_pair))
    }
}

impl FromIterator<Tag> for DefaultTagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self::from_pairs(iter.into_iter().map(|tag| (tag.name, tag.value)))
    }
}

impl TagSet for DefaultTagSet {
    fn tags(&self) -> Vec<&str> {
        self.tags.keys().map(String::as_str).collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    fn value(&self, name: &str) -> Result<f64, FolioError> {
        self.tags
            .get(name)
            .copied()
            .ok_or_else(|| FolioError::tag_not_found(name))
    }

    fn len(&self) -> usize {
        self.tags.len()
    }
}

// =============================================================================
// WEIGHTED TAGSET
// =============================================================================

/// Scales every value of its parent by a fixed weight.
///
/// Membership is unchanged: a zero weight keeps every tag at value 0, and a
/// negative weight inverts the parent's signal.
#[derive(Debug, Clone)]
pub struct WeightedTagSet<P> {
    parent: P,
    weight: f64,
}

impl<P: TagSet> WeightedTagSet<P> {
    /// Wrap `parent`, multiplying its values by `weight`.
    #[must_use]
    pub fn new(parent: P, weight: f64) -> Self {
        Self { parent, weight }
    }

    /// The weight applied to the parent's values.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The wrapped set.
    #[must_use]
    pub fn parent(&self) -> &P {
        &self.parent
    }
}

impl<P: TagSet> TagSet for WeightedTagSet<P> {
    fn tags(&self) -> Vec<&str> {
        self.parent.tags()
    }

    fn contains(&self, name: &str) -> bool {
        self.parent.contains(name)
    }

    fn value(&self, name: &str) -> Result<f64, FolioError> {
        Ok(self.parent.value(name)? * self.weight)
    }

    fn len(&self) -> usize {
        self.parent.len()
    }
}

// =============================================================================
// MERGED TAGSET
// =============================================================================

/// Binary reducer for same-named values from several contributors.
pub type MergeFn = fn(f64, f64) -> f64;

/// The default merge function.
#[must_use]
pub fn sum(a: f64, b: f64) -> f64 {
    a + b
}

/// The union of several tag sets.
///
/// `value(name)` gathers the value from every contributor that contains
/// `name`, in contributor order, and left-folds them with the merge
/// function.
pub struct MergedTagSet<M = MergeFn> {
    sets: Vec<Box<dyn TagSet>>,
    merge: M,
}

impl MergedTagSet {
    /// Merge `sets` by summing same-named values.
    #[must_use]
    pub fn new(sets: Vec<Box<dyn TagSet>>) -> Self {
        Self { sets, merge: sum }
    }
}

impl<M> MergedTagSet<M>
where
    M: Fn(f64, f64) -> f64 + Send + Sync,
{
    /// Merge `sets` with a custom reducer.
    #[must_use]
    pub fn with_merge(sets: Vec<Box<dyn TagSet>>, merge: M) -> Self {
        Self { sets, merge }
    }

    /// Number of contributing sets.
    #[must_use]
    pub fn contributor_count(&self) -> usize {
        self.sets.len()
    }
}

impl<M> std::fmt::Debug for MergedTagSet<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedTagSet")
            .field("contributors", &self.sets.len())
            .finish_non_exhaustive()
    }
}

impl<M> TagSet for MergedTagSet<M>
where
    M: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn tags(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.sets.iter().flat_map(|set| set.tags()).collect();
        names.into_iter().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.sets.iter().any(|set| set.contains(name))
    }

    fn value(&self, name: &str) -> Result<f64, FolioError> {
        let mut merged: Option<f64> = None;
        for set in self.sets.iter().filter(|set| set.contains(name)) {
            let value = set.value(name)?;
            merged = Some(match merged {
                Some(acc) => (self.merge)(acc, value),
                None => value,
            });
        }
        merged.ok_or_else(|| FolioError::tag_not_found(name))
    }
}

// =============================================================================
// FILTER TAGSET
// =============================================================================

/// Exposes only the tags of its parent accepted by a predicate.
///
/// The predicate receives the tag name, the parent's value for it and the
/// parent itself.
pub struct FilterTagSet<P, F = fn(&str, f64, &P) -> bool> {
    parent: P,
    predicate: F,
}

/// Predicate accepting every tag.
pub fn accept_all<P: ?Sized>(_name: &str, _value: f64, _parent: &P) -> bool {
    true
}

/// Predicate accepting strictly positive values. Zero is excluded.
pub fn is_positive<P: ?Sized>(_name: &str, value: f64, _parent: &P) -> bool {
    value > 0.0
}

impl<P: TagSet> FilterTagSet<P> {
    /// Wrap `parent` without narrowing it.
    #[must_use]
    pub fn new(parent: P) -> Self {
        Self {
            parent,
            predicate: accept_all::<P>,
        }
    }

    /// Keep only tags with a value strictly greater than zero.
    #[must_use]
    pub fn positive(parent: P) -> Self {
        Self {
            parent,
            predicate: is_positive::<P>,
        }
    }
}

impl<P, F> FilterTagSet<P, F>
where
    P: TagSet,
    F: Fn(&str, f64, &P) -> bool + Send + Sync,
{
    /// Wrap `parent`, keeping tags for which `predicate` returns true.
    #[must_use]
    pub fn with_predicate(parent: P, predicate: F) -> Self {
        Self { parent, predicate }
    }

    /// The wrapped set.
    #[must_use]
    pub fn parent(&self) -> &P {
        &self.parent
    }

    fn accepts(&self, name: &str) -> bool {
        if !self.parent.contains(name) {
            return false;
        }
        self.parent
            .value(name)
            .map(|value| (self.predicate)(name, value, &self.parent))
            .unwrap_or(false)
    }
}

impl<P: std::fmt::Debug, F> std::fmt::Debug for FilterTagSet<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterTagSet")
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

impl<P, F> TagSet for FilterTagSet<P, F>
where
    P: TagSet,
    F: Fn(&str, f64, &P) -> bool + Send + Sync,
{
    fn tags(&self) -> Vec<&str> {
        self.parent
            .tags()
            .into_iter()
            .filter(|name| self.accepts(name))
            .collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.accepts(name)
    }

    fn value(&self, name: &str) -> Result<f64, FolioError> {
        if self.accepts(name) {
            self.parent.value(name)
        } else {
            Err(FolioError::tag_not_found(name))
        }
    }
}

// =============================================================================
// COMPOSITION HELPERS
// =============================================================================

/// Builder-style composition for any sized tag set.
pub trait TagSetExt: TagSet + Sized {
    /// Wrap in a [`WeightedTagSet`].
    fn weighted(self, weight: f64) -> WeightedTagSet<Self> {
        WeightedTagSet::new(self, weight)
    }

    /// Wrap in a [`FilterTagSet`] keeping only strictly positive values.
    fn positive(self) -> FilterTagSet<Self> {
        FilterTagSet::positive(self)
    }

    /// Wrap in a [`FilterTagSet`] with a custom predicate.
    fn filtered<F>(self, predicate: F) -> FilterTagSet<Self, F>
    where
        F: Fn(&str, f64, &Self) -> bool + Send + Sync,
    {
        FilterTagSet::with_predicate(self, predicate)
    }

    /// Erase the concrete type.
    fn boxed(self) -> Box<dyn TagSet>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: TagSet + Sized> TagSetExt for T {}

// =============================================================================
// TESTS
// =============================================================================
