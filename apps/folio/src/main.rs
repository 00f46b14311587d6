//! # Folio - Tag Aggregation Server
//!
//! The main binary for the Folio tag service.
//!
//! This application provides:
//! - HTTP API server (axum-based) with content-negotiated tag responses
//! - CLI interface for store management and one-off aggregation
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 apps/folio (THE BINARY)                   │
//! │                                                           │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │ Tag Sources  │   │
//! │  │  (clap)     │    │   (axum)    │    │ (async load) │   │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬───────┘   │
//! │         │                  │                  │           │
//! │         └──────────────────┼──────────────────┘           │
//! │                            ▼                              │
//! │                    ┌───────────────┐                      │
//! │                    │  folio-core   │                      │
//! │                    │ (THE LOGIC)   │                      │
//! │                    └───────────────┘                      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! folio --config folio.toml server --port 8080
//!
//! # CLI operations
//! folio init
//! folio import -f records.json
//! folio tags MS-ADD-01234 --format json
//! folio status
//! ```

use clap::Parser;
use folio::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // FOLIO_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("FOLIO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "folio=debug,folio_core=debug,tower_http=debug"
    } else {
        "folio=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode && is_server(&cli) {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn is_server(cli: &cli::Cli) -> bool {
    matches!(cli.command, Some(cli::Commands::Server { .. }))
}

/// Print the Folio startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗ ██████╗ ██╗     ██╗ ██████╗
  ██╔════╝██╔═══██╗██║     ██║██╔═══██╗
  █████╗  ██║   ██║██║     ██║██║   ██║
  ██╔══╝  ██║   ██║██║     ██║██║   ██║
  ██║     ╚██████╔╝███████╗██║╚██████╔╝
  ╚═╝      ╚═════╝ ╚══════╝╚═╝ ╚═════╝

  Tag Aggregation Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
