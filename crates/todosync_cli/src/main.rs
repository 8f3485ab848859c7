//! todosync CLI
//!
//! Command-line front end for the todosync sync endpoint.
//!
//! # Commands
//!
//! - `compact` - Rewrite the store log with one line per todo
//! - `handle` - Dispatch one resolver event and print the response
//! - `inspect` - Display store statistics and the current checkpoint
//! - `seed` - Push the demo todos
//!
//! Logs go to stderr; stdout carries only command output.

mod commands;

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use todosync_server::ServerConfig;
use tracing_subscriber::EnvFilter;

/// todosync command-line tools.
#[derive(Parser)]
#[command(name = "todosync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file (overrides TODOSYNC_STORE_PATH)
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the store log keeping only the latest record per todo
    Compact {
        /// Only report what would be reclaimed
        #[arg(long)]
        dry_run: bool,
    },

    /// Dispatch a resolver event read from a file or stdin
    Handle {
        /// Event file (reads stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },

    /// Display store statistics and the current checkpoint
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Push the demo todos
    Seed,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut config = ServerConfig::from_env()?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    match cli.command {
        Commands::Compact { dry_run } => {
            commands::compact::run(&config, dry_run)?;
        }
        Commands::Handle { event } => {
            commands::handle::run(config, event.as_deref())?;
        }
        Commands::Inspect { format } => {
            commands::inspect::run(&config, &format)?;
        }
        Commands::Seed => {
            commands::seed::run(config)?;
        }
        Commands::Version => {
            println!("todosync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
