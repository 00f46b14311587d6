//! # Primitives
//!
//! Fixed constants for the Folio tag subsystem.
//!
//! These are compiled into the binary. Source weights can be overridden by
//! configuration; the source names and limits cannot.

/// Name of the third-party tag source (externally computed frequencies).
pub const THIRD_PARTY_SOURCE: &str = "third-party";

/// Name of the user annotation tag source.
pub const ANNOTATIONS_SOURCE: &str = "annotations";

/// Name of the user tag-removal source.
pub const USER_REMOVES_SOURCE: &str = "user-removes";

/// Default weight of the third-party source.
pub const THIRD_PARTY_WEIGHT: f64 = 1.0;

/// Default weight of the annotations source (1/5).
pub const ANNOTATIONS_WEIGHT: f64 = 1.0 / 5.0;

/// Default weight of the user-removes source (1/5).
///
/// Removal rows carry negative frequencies, so a positive weight still
/// subtracts from the merged score.
pub const USER_REMOVES_WEIGHT: f64 = 1.0 / 5.0;

/// Separator of the `sources` request parameter.
pub const SOURCE_LIST_SEPARATOR: char = ',';

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for tag names, in bytes.
///
/// Rows with longer names are rejected at the data-source boundary.
pub const MAX_TAG_LENGTH: usize = 256;

/// Maximum length for classmarks, in bytes.
pub const MAX_CLASSMARK_LENGTH: usize = 256;

/// Maximum number of records in a single import file.
pub const MAX_IMPORT_RECORDS: usize = 100_000;
