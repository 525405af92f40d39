//! # Inkform CLI
//!
//! Command-line front end for the Inkform pipelines: batch photo compression
//! and offline signature rendering from recorded input.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod args;
pub mod compress;
pub mod sign;

pub use args::{Cli, Command, CompressArgs, SignArgs};

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns the subcommand's error.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Compress(args) => compress::run(&args).await.map(|_| ()),
        Command::Sign(args) => sign::run(&args).await,
    }
}
