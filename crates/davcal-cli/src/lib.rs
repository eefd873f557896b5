//! Command-line front end for the davcal CalDAV client.
//!
//! This crate provides the `davcal` binary: configuration loading, secret
//! resolution and one subcommand per session operation.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{CliError, CliResult};
