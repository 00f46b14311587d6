//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::FolioConfig;
use crate::sources::{
    RequestedSources, TagSourceRegistry, load_tags, select_tag_sources, store_registry,
};
use folio_core::{FolioError, Format, TagRecord, TagSet, TagStore, render};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of an import file (100 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), FolioError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| FolioError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(FolioError::InvalidValue(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to a canonical regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, FolioError> {
    let canonical = path.canonicalize().map_err(|e| {
        FolioError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(FolioError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// SHARED SETUP
// =============================================================================

/// Open (or create) the tag store.
pub fn open_store(db_path: &Path) -> Result<Arc<TagStore>, FolioError> {
    tracing::debug!("Opening tag store at {:?}", db_path);
    TagStore::open(db_path).map(Arc::new)
}

/// The default store-backed registry with configured weight overrides.
pub fn build_registry(
    config: &FolioConfig,
    store: Arc<TagStore>,
) -> Result<TagSourceRegistry, FolioError> {
    let weights = config.source_weights()?;
    let registry = store_registry(store).reweighted(&weights)?;
    for (name, weight) in &weights {
        tracing::info!(source = %name, weight, "Source weight overridden");
    }
    Ok(registry)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &FolioConfig,
    db_path: &Path,
    host: &str,
    port: u16,
) -> Result<(), FolioError> {
    let registry = build_registry(config, open_store(db_path)?)?;

    println!("Folio Tag Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Database: {:?}", db_path);
    println!("  Sources:  {}", registry.names().join(", "));
    println!();
    println!("Endpoints:");
    println!("  GET /tags/{{classmark}}[.json|.xml|.csv|.txt] - Aggregated tags");
    println!("      (tag endpoint /{{classmark}} mounted under /tags)");
    println!("  GET /health                                 - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, registry).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty tag store.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), FolioError> {
    if db_path.exists() {
        if !force {
            return Err(FolioError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| FolioError::IoError(format!("Cannot remove {:?}: {}", db_path, e)))?;
    }

    open_store(db_path)?;
    println!("Initialized new tag store at {:?}", db_path);
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import tag records from a JSON array.
pub fn cmd_import(db_path: &Path, json_mode: bool, file: &Path) -> Result<(), FolioError> {
    tracing::info!("Importing from {:?}", file);

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| FolioError::IoError(format!("Read file: {}", e)))?;
    let records: Vec<TagRecord> = serde_json::from_slice(&contents)
        .map_err(|e| FolioError::InvalidValue(format!("Invalid import file: {}", e)))?;

    let store = open_store(db_path)?;
    let count = store.import(&records)?;
    let counts = store.counts()?;

    if json_mode {
        let output = serde_json::json!({
            "imported": count,
            "third_party": counts.third_party,
            "annotations": counts.annotations,
            "removals": counts.removals,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Imported {} records", count);
    println!(
        "Store now has {} third-party, {} annotation, {} removal records",
        counts.third_party, counts.annotations, counts.removals
    );
    Ok(())
}

// =============================================================================
// TAGS COMMAND
// =============================================================================

/// Render the aggregated tags of one document.
pub async fn aggregate_document(
    registry: &TagSourceRegistry,
    classmark: &str,
    sources: Option<&str>,
    format: Format,
) -> Result<Vec<u8>, FolioError> {
    folio_core::storage::validate_classmark(classmark)?;
    let selected = select_tag_sources(registry, RequestedSources::from(sources))?;
    let item = load_tags(&selected, classmark).await?;
    tracing::debug!(classmark, tags = item.tags.len(), "Rendering tags");
    render(&item, format)
}

/// Print the aggregated tags of one document.
pub async fn cmd_tags(
    config: &FolioConfig,
    db_path: &Path,
    classmark: &str,
    sources: Option<&str>,
    format: Format,
) -> Result<(), FolioError> {
    let registry = build_registry(config, open_store(db_path)?)?;
    let body = aggregate_document(&registry, classmark, sources, format).await?;

    write_output(&body).map_err(|e| FolioError::IoError(format!("Write output: {}", e)))
}

/// Write a rendered body to stdout, ending with a newline.
fn write_output(body: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(body)?;
    if !body.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record counts per table.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), FolioError> {
    let counts = open_store(db_path)?.counts()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "third_party": counts.third_party,
            "annotations": counts.annotations,
            "removals": counts.removals,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Folio Tag Store Status");
    println!("======================");
    println!("Database: {:?}", db_path);
    println!();
    println!("Third-party tags: {}", counts.third_party);
    println!("Annotations:      {}", counts.annotations);
    println!("Removals:         {}", counts.removals);

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
