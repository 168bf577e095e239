//! CLI command definitions for formflow-sync
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod import;

use crate::format::OutputFormat;
use clap::{Parser, Subcommand};
use import::CredentialArgs;

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_str(s).ok_or_else(|| format!("unknown format '{}' (json, markdown)", s))
}

/// Mirror FormFlow templates and aggregated results into SQLite
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import all templates with questions and aggregated results
    Import(CredentialArgs),

    /// Check that the API is reachable with the given credentials
    TestConnection(CredentialArgs),

    /// Re-fetch aggregated results for one template using its stored token
    Refresh {
        /// FormFlow template id
        template_id: String,
    },

    /// List imported templates
    List {
        #[arg(long, default_value = "markdown", value_parser = parse_format)]
        format: OutputFormat,
    },

    /// Show one template with questions and aggregated results
    Show {
        /// FormFlow template id
        template_id: String,

        #[arg(long, default_value = "markdown", value_parser = parse_format)]
        format: OutputFormat,
    },

    /// Delete a local template and all of its children
    Delete {
        /// FormFlow template id
        template_id: String,
    },

    /// Print the local database schema as JSON
    Schema,
}
