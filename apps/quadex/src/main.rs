//! # Quadex
//!
//! Command-line client for a quad store kept in a remote search index.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │             apps/quadex (THE BINARY)         │
//! │                                              │
//! │   CLI (clap) ──▶ QuadStore<HttpIndexClient>  │
//! │                         │                    │
//! │                         ▼                    │
//! │                   quadex-core                │
//! └─────────────────────────┬────────────────────┘
//!                           ▼
//!                remote index (REST, scroll)
//! ```
//!
//! ## Usage
//!
//! ```bash
//! quadex --endpoint http://localhost:9200 init
//! quadex load -f facts.tsv
//! quadex lookup --direction subject --value alice
//! quadex --json-mode nodes --limit 0
//! ```

use clap::Parser;
use quadex::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // QUADEX_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("QUADEX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quadex=info".into());

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

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner to stderr, keeping stdout for results.
fn print_banner() {
    eprintln!("quadex v{}  quads over a search index", env!("CARGO_PKG_VERSION"));
}
