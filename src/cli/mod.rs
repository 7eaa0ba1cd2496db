//! CLI module for adocflow
//!
//! Provides command-line interface for:
//! - init: Create the document directories
//! - serve: Run the HTTP server
//! - list / show / variants: Inspect documents and their revisions
//! - revise: One-shot revision by instruction

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, list, revise, run, run_command, serve, show, variants};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
