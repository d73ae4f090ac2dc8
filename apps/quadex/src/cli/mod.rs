//! # Quadex CLI Module
//!
//! ## Available Commands
//!
//! - `init` - Create the quad and node collections
//! - `load` - Add quads from a tab-separated file
//! - `remove` - Remove quads listed in a tab-separated file
//! - `size` - Count stored quads
//! - `nodes` - List node names
//! - `quads` - List stored quads
//! - `lookup` - List quads with a given value in one direction
//! - `resolve` - Show the quad stored under an id
//! - `id` - Compute the content address of a quad

mod commands;

use clap::{Parser, Subcommand};
use quadex_core::{HttpIndexClient, QuadStore, QuadexError, StoreConfig};
use std::path::{Path, PathBuf};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Quadex - a quad store over a remote search index
#[derive(Parser, Debug)]
#[command(name = "quadex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Index endpoint, overriding the file and QUADEX_ENDPOINT
    #[arg(short = 'E', long, global = true)]
    pub endpoint: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the quad and node collections
    Init,

    /// Add quads from a tab-separated file (s, p, o and optional label)
    Load {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,

        /// Quads written per batch
        #[arg(long, default_value = "1000")]
        chunk: usize,
    },

    /// Remove quads listed in a tab-separated file
    Remove {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Count stored quads
    Size,

    /// List node names
    Nodes {
        /// Maximum number of results (0 for all)
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// List stored quads
    Quads {
        /// Maximum number of results (0 for all)
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// List quads whose field in one direction equals a value
    Lookup {
        /// Direction (subject, predicate, object, label)
        #[arg(short, long)]
        direction: String,

        /// Value to match exactly
        #[arg(short, long)]
        value: String,

        /// Maximum number of results (0 for all)
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// Show the quad stored under an id
    Resolve {
        /// Quad identifier
        id: String,
    },

    /// Compute the content address of a quad
    Id {
        subject: String,
        predicate: String,
        object: String,
        /// Optional label
        label: Option<String>,
    },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Resolve configuration: file (or defaults), then environment, then flags.
pub fn resolve_config(
    path: Option<&Path>,
    endpoint: Option<&str>,
) -> Result<StoreConfig, QuadexError> {
    let mut config = match path {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    }
    .with_env_overrides();

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint.to_string();
    }
    config.validate()?;
    Ok(config)
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), QuadexError> {
    let json_mode = cli.json_mode;

    if let Commands::Id {
        subject,
        predicate,
        object,
        label,
    } = &cli.command
    {
        return cmd_id(subject, predicate, object, label.as_deref(), json_mode);
    }

    let config = resolve_config(cli.config.as_deref(), cli.endpoint.as_deref())?;
    tracing::debug!(endpoint = %config.endpoint, "using index");
    let client = HttpIndexClient::new(&config)?;
    let store = QuadStore::new(client, config)?;

    let result = match cli.command {
        Commands::Init => cmd_init(&store, json_mode).await,
        Commands::Load { file, chunk } => cmd_load(&store, &file, chunk, json_mode).await,
        Commands::Remove { file } => cmd_remove(&store, &file, json_mode).await,
        Commands::Size => cmd_size(&store, json_mode).await,
        Commands::Nodes { limit } => cmd_nodes(&store, limit, json_mode).await,
        Commands::Quads { limit } => cmd_quads(&store, limit, json_mode).await,
        Commands::Lookup {
            direction,
            value,
            limit,
        } => cmd_lookup(&store, &direction, &value, limit, json_mode).await,
        Commands::Resolve { id } => cmd_resolve(&store, &id, json_mode).await,
        Commands::Id { .. } => Ok(()),
    };

    store.close();
    result
}
