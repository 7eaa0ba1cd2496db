//! CLI argument definitions using clap
//!
//! Commands:
//! - adocflow init --config <path>
//! - adocflow serve --config <path> [--port <port>]
//! - adocflow list --config <path>
//! - adocflow show <name> --config <path>
//! - adocflow variants <name> --config <path>
//! - adocflow revise <name> <instruction> --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// adocflow - versioned AsciiDoc documents revised by instruction
#[derive(Parser, Debug)]
#[command(name = "adocflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the document and revision directories
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./adocflow.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./adocflow.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// List base documents
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./adocflow.json")]
        config: PathBuf,
    },

    /// Print the current content of a document
    Show {
        /// Document name, without extension
        name: String,

        /// Path to configuration file
        #[arg(long, default_value = "./adocflow.json")]
        config: PathBuf,
    },

    /// List the revisions of a document, oldest first
    Variants {
        /// Document name, without extension
        name: String,

        /// Path to configuration file
        #[arg(long, default_value = "./adocflow.json")]
        config: PathBuf,
    },

    /// Revise a document by a natural-language instruction
    Revise {
        /// Document name, without extension
        name: String,

        /// What to change
        instruction: String,

        /// Path to configuration file
        #[arg(long, default_value = "./adocflow.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
