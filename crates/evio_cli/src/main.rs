//! evio CLI
//!
//! Command-line tools for evio event files.
//!
//! # Commands
//!
//! - `inspect` - Display the metadata footer of event files
//! - `verify` - Check that event files are complete and consistent
//! - `dump` - List the record frames of an event file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// evio event file tools.
#[derive(Parser)]
#[command(name = "evio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the metadata footer of event files
    Inspect {
        /// Event files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that event files are complete and consistent
    Verify {
        /// Event files to verify
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the record frames of an event file
    Dump {
        /// Event file to dump
        file: PathBuf,

        /// Maximum number of records to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { files, format } => {
            commands::inspect::run(&files, &format)?;
        }
        Commands::Verify { files } => {
            commands::verify::run(&files)?;
        }
        Commands::Dump {
            file,
            limit,
            format,
        } => {
            commands::dump::run(&file, limit, &format)?;
        }
        Commands::Version => {
            println!("evio CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
