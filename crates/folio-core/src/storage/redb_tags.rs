//! # redb-backed Tag Store
//!
//! An embedded store for the raw tag data behind the three default tag
//! sources:
//! - third-party tag frequencies, one value per `(classmark, tag)`
//! - user tag annotations, a count per `(classmark, tag, user)`
//! - user tag removals, one entry per `(classmark, tag, user)`
//!
//! Each source reads back a per-document aggregation as validated
//! [`TagRow`]s. redb gives concurrent readers with a single writer, so one
//! store handle can serve every in-flight request.

use crate::primitives::{MAX_CLASSMARK_LENGTH, MAX_IMPORT_RECORDS};
use crate::rows::TagRow;
use crate::FolioError;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Third-party tags: (classmark, tag) -> frequency
const THIRD_PARTY_TAGS: TableDefinition<(&str, &str), f64> =
    TableDefinition::new("third_party_tags");

/// Annotations: (classmark, tag, user) -> number of times the user applied the tag
const ANNOTATIONS: TableDefinition<(&str, &str, &str), u64> =
    TableDefinition::new("tag_annotations");

/// Removals: (classmark, tag, user) -> number of removal requests (counted once per user)
const REMOVALS: TableDefinition<(&str, &str, &str), u64> = TableDefinition::new("tag_removals");

fn storage_err(e: impl std::fmt::Display) -> FolioError {
    FolioError::StorageError(e.to_string())
}

// =============================================================================
// RECORDS
// =============================================================================

/// One raw record accepted by [`TagStore::import`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TagRecord {
    /// An externally computed tag frequency. Replaces any previous value.
    ThirdParty {
        classmark: String,
        tag: String,
        frequency: f64,
    },
    /// A user applied a tag to a document.
    Annotation {
        classmark: String,
        tag: String,
        user: String,
    },
    /// A user asked for a tag to be removed from a document.
    Removal {
        classmark: String,
        tag: String,
        user: String,
    },
}

impl TagRecord {
    /// Check every field before the record touches the store.
    pub fn validate(&self) -> Result<(), FolioError> {
        let (classmark, tag, frequency, user) = match self {
            Self::ThirdParty {
                classmark,
                tag,
                frequency,
            } => (classmark, tag, *frequency, None),
            Self::Annotation {
                classmark,
                tag,
                user,
            }
            | Self::Removal {
                classmark,
                tag,
                user,
            } => (classmark, tag, 1.0, Some(user)),
        };

        validate_classmark(classmark)?;
        TagRow::new(tag.as_str(), frequency)?;
        if user.is_some_and(|u| u.is_empty()) {
            return Err(FolioError::InvalidValue(format!(
                "record for tag \"{}\" on {} has an empty user",
                tag, classmark
            )));
        }
        Ok(())
    }
}

/// Reject empty or oversized classmarks.
pub fn validate_classmark(classmark: &str) -> Result<(), FolioError> {
    if classmark.is_empty() {
        return Err(FolioError::InvalidValue("classmark is empty".to_string()));
    }
    if classmark.len() > MAX_CLASSMARK_LENGTH {
        return Err(FolioError::InvalidValue(format!(
            "classmark length {} exceeds maximum {} bytes",
            classmark.len(),
            MAX_CLASSMARK_LENGTH
        )));
    }
    Ok(())
}

/// Record counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreCounts {
    pub third_party: u64,
    pub annotations: u64,
    pub removals: u64,
}

// =============================================================================
// TAG STORE
// =============================================================================

/// A disk-backed tag store using redb.
pub struct TagStore {
    db: Database,
}

impl std::fmt::Debug for TagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagStore").finish_non_exhaustive()
    }
}

impl TagStore {
    /// Open or create a tag store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FolioError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            write_txn.open_table(THIRD_PARTY_TAGS).map_err(storage_err)?;
            write_txn.open_table(ANNOTATIONS).map_err(storage_err)?;
            write_txn.open_table(REMOVALS).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        Ok(Self { db })
    }

    /// Import records in a single transaction.
    ///
    /// All records are validated before the transaction opens; one invalid
    /// record rejects the whole batch.
    pub fn import(&self, records: &[TagRecord]) -> Result<usize, FolioError> {
        if records.len() > MAX_IMPORT_RECORDS {
            return Err(FolioError::InvalidValue(format!(
                "import of {} records exceeds maximum {}",
                records.len(),
                MAX_IMPORT_RECORDS
            )));
        }
        for record in records {
            record.validate()?;
        }

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut third_party = write_txn.open_table(THIRD_PARTY_TAGS).map_err(storage_err)?;
            let mut annotations = write_txn.open_table(ANNOTATIONS).map_err(storage_err)?;
            let mut removals = write_txn.open_table(REMOVALS).map_err(storage_err)?;

            for record in records {
                match record {
                    TagRecord::ThirdParty {
                        classmark,
                        tag,
                        frequency,
                    } => {
                        third_party
                            .insert((classmark.as_str(), tag.as_str()), *frequency)
                            .map_err(storage_err)?;
                    }
                    TagRecord::Annotation {
                        classmark,
                        tag,
                        user,
                    } => {
                        let key = (classmark.as_str(), tag.as_str(), user.as_str());
                        let current = annotations
                            .get(key)
                            .map_err(storage_err)?
                            .map(|v| v.value())
                            .unwrap_or(0);
                        annotations
                            .insert(key, current.saturating_add(1))
                            .map_err(storage_err)?;
                    }
                    TagRecord::Removal {
                        classmark,
                        tag,
                        user,
                    } => {
                        let key = (classmark.as_str(), tag.as_str(), user.as_str());
                        let current = removals
                            .get(key)
                            .map_err(storage_err)?
                            .map(|v| v.value())
                            .unwrap_or(0);
                        removals
                            .insert(key, current.saturating_add(1))
                            .map_err(storage_err)?;
                    }
                }
            }
        }
        write_txn.commit().map_err(storage_err)?;

        Ok(records.len())
    }

    /// Third-party `(tag, frequency)` rows for a document.
    pub fn third_party_rows(&self, classmark: &str) -> Result<Vec<TagRow>, FolioError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(THIRD_PARTY_TAGS).map_err(storage_err)?;

        let mut rows = Vec::new();
        for entry in table.range((classmark, "")..).map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let (doc, tag) = key.value();
            if doc != classmark {
                break;
            }
            rows.push(TagRow::new(tag, value.value())?);
        }
        Ok(rows)
    }

    /// Annotation rows: per tag, the total number of annotations.
    pub fn annotation_rows(&self, classmark: &str) -> Result<Vec<TagRow>, FolioError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(ANNOTATIONS).map_err(storage_err)?;

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for entry in table.range((classmark, "", "")..).map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let (doc, tag, _user) = key.value();
            if doc != classmark {
                break;
            }
            *totals.entry(tag.to_string()).or_insert(0.0) += value.value() as f64;
        }

        totals
            .into_iter()
            .map(|(tag, frequency)| TagRow::new(tag, frequency))
            .collect()
    }

    /// Removal rows: per tag, minus the number of users who removed it.
    pub fn removal_rows(&self, classmark: &str) -> Result<Vec<TagRow>, FolioError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(REMOVALS).map_err(storage_err)?;

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for entry in table.range((classmark, "", "")..).map_err(storage_err)? {
            let (key, _) = entry.map_err(storage_err)?;
            let (doc, tag, _user) = key.value();
            if doc != classmark {
                break;
            }
            *totals.entry(tag.to_string()).or_insert(0.0) -= 1.0;
        }

        totals
            .into_iter()
            .map(|(tag, frequency)| TagRow::new(tag, frequency))
            .collect()
    }

    /// Number of records in each table.
    pub fn counts(&self) -> Result<StoreCounts, FolioError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let third_party = read_txn.open_table(THIRD_PARTY_TAGS).map_err(storage_err)?;
        let annotations = read_txn.open_table(ANNOTATIONS).map_err(storage_err)?;
        let removals = read_txn.open_table(REMOVALS).map_err(storage_err)?;

        Ok(StoreCounts {
            third_party: third_party.len().map_err(storage_err)?,
            annotations: annotations.len().map_err(storage_err)?,
            removals: removals.len().map_err(storage_err)?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
