//! # Folio CLI Module
//!
//! This module implements the CLI interface for Folio.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Create an empty tag store
//! - `import` - Load tag records from a JSON file
//! - `tags` - Aggregate and print one document's tags
//! - `status` - Show record counts

mod commands;

use crate::config::FolioConfig;
use clap::{Parser, Subcommand};
use folio_core::{FolioError, Format};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Folio - tag aggregation service
///
/// Combines weighted tag sources into one scored tag list per document
/// and serves it as JSON, XML, CSV or plain text.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the tag database (overrides the configuration file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the configuration file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the configuration file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty tag store
    Init {
        /// Remove an existing database first
        #[arg(short, long)]
        force: bool,
    },

    /// Import tag records from a JSON file
    Import {
        /// Path to a JSON array of records
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Aggregate and print the tags of one document
    Tags {
        /// Document classmark
        classmark: String,

        /// Comma-separated source names (default: all)
        #[arg(short, long)]
        sources: Option<String>,

        /// Output format (json, xml, csv, txt)
        #[arg(short = 't', long, default_value = "txt")]
        format: Format,
    },

    /// Show record counts
    Status,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), FolioError> {
    let config = FolioConfig::load_or_default(cli.config.as_deref())?;
    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            cmd_server(&config, &db_path, &host, port).await
        }
        Some(Commands::Init { force }) => cmd_init(&db_path, force),
        Some(Commands::Import { file }) => cmd_import(&db_path, json_mode, &file),
        Some(Commands::Tags {
            classmark,
            sources,
            format,
        }) => cmd_tags(&config, &db_path, &classmark, sources.as_deref(), format).await,
        Some(Commands::Status) | None => cmd_status(&db_path, json_mode),
    }
}
