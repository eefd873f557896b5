//! Subcommand implementations.
//!
//! Each command prints its result to stdout. Rendering is split out into
//! `render_*` functions so output can be tested without a server.

pub mod calendars;
pub mod check;
pub mod config;
pub mod edit;
pub mod events;

use serde::Serialize;

use crate::error::{CliError, CliResult};

/// Prints a value as pretty JSON.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CliError::Io(e.into()))?;
    println!("{}", json);
    Ok(())
}
