//! Evitrack CLI Library
//!
//! Compliance evidence tracking from the terminal.
//!
//! # Overview
//!
//! Evitrack keeps two kinds of evidence:
//!
//! - **Attachments** on the nodes of a compliance catalog (clauses or
//!   controls). Preloaded evidence comes with the catalog; files uploaded in a
//!   session are appended after it (`evitrack shell`)
//! - **The ledger**, a flat list of evidence entries persisted in the data
//!   directory (`evitrack ledger`)
//!
//! Plus catalog browsing (`evitrack tree`), the identity evidence is shared
//! as (`evitrack identity`) and configuration (`evitrack config`).

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod attachments;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod expansion;
pub mod ledger;
pub mod notify;
pub mod render;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use catalog::{CatalogVariant, ComplianceNode, ComplianceTree};
pub use error::{Result, TrackerError};
pub use ledger::{EvidenceEntry, EvidenceLedger};
pub use session::{Session, SessionIdentity};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Evitrack - Compliance Evidence Tracker
#[derive(Parser, Debug)]
#[command(name = "evitrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory (holds the evidence database)
    #[arg(long, env = "EVITRACK_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print the full command reference as markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the compliance catalog and its preloaded evidence
    Tree {
        /// Built-in catalog to show (defaults to EVITRACK_CATALOG, then clauses)
        #[arg(long, value_enum)]
        variant: Option<CatalogVariant>,

        /// Expand every node
        #[arg(short, long)]
        expand_all: bool,
    },

    /// Manage the evidence ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },

    /// Show or change who evidence is shared as
    Identity {
        #[command(subcommand)]
        command: IdentityCommand,
    },

    /// Interactive session for attaching and deleting evidence
    Shell {
        /// Built-in catalog to work on (defaults to EVITRACK_CATALOG, then clauses)
        #[arg(long, value_enum)]
        variant: Option<CatalogVariant>,

        /// Answer yes to every confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Ledger subcommands
#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// List ledger entries, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add an entry
    Add {
        /// Evidence name (e.g., "Access-Review-Q3.xlsx")
        name: String,
    },

    /// Remove an entry
    Remove {
        /// Entry id
        id: u64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Save a placeholder file for an entry
    Download {
        /// Evidence name
        name: String,
    },
}

/// Identity subcommands
#[derive(Subcommand, Debug)]
pub enum IdentityCommand {
    /// Show the current identity
    Show,

    /// Set the identity
    Set {
        /// Name to share evidence as
        name: String,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Get configuration value
    Get {
        /// Configuration key (data_dir, download_dir, catalog, db_path)
        key: String,
    },

    /// Show all configuration
    Show,
}
