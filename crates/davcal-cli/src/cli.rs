//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use davcal_core::TracingConfig;
use tracing::Level;

use crate::config::ConnectionOverrides;

/// davcal - talk to CalDAV servers from the shell
#[derive(Debug, Parser)]
#[command(name = "davcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "DAVCAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Output lists as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Format of the diagnostic log written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl Cli {
    /// Picks the tracing setup from `--log-format` and the debug switches.
    pub fn tracing_config(&self, config_debug: bool) -> TracingConfig {
        let debug = self.debug || config_debug;
        match (self.log_format, debug) {
            (LogFormat::Json, true) => TracingConfig::json().with_level(Level::DEBUG),
            (LogFormat::Json, false) => TracingConfig::json().with_level(Level::WARN),
            (LogFormat::Text, true) => TracingConfig::cli_debug(),
            (LogFormat::Text, false) => TracingConfig::cli(),
        }
    }
}

/// Connection flags; each one overrides the matching config file value.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// CalDAV server URL
    #[arg(long, env = "DAVCAL_URL", global = true)]
    pub url: Option<String>,

    /// Account name
    #[arg(long, short, env = "DAVCAL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password (supports pass:: and env:: references)
    #[arg(long, env = "DAVCAL_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

impl ConnectionArgs {
    /// Converts the flags into config overrides.
    pub fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: self.timeout,
            insecure_tls: self.insecure,
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Test the connection and run endpoint discovery
    Check,

    /// List calendars in the calendar home
    Calendars,

    /// List events of a calendar
    Events {
        /// Calendar URL or path
        calendar_url: String,

        /// Range start (RFC 3339 or yyyyMMddTHHmmssZ)
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,

        /// Range end (RFC 3339 or yyyyMMddTHHmmssZ)
        #[arg(long, value_parser = parse_datetime)]
        end: Option<DateTime<Utc>>,
    },

    /// Create an event
    Create(CreateArgs),

    /// Replace an event with the contents of an ICS file
    Update {
        /// Event URL or path
        event_url: String,

        /// ICS file with the new event data
        #[arg(long)]
        file: PathBuf,

        /// Only update if the server ETag still matches
        #[arg(long)]
        etag: Option<String>,
    },

    /// Delete an event
    Delete {
        /// Event URL or path
        event_url: String,

        /// Only delete if the server ETag still matches
        #[arg(long)]
        etag: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `davcal create`.
///
/// Either `--file` or the `--summary`/`--start`/`--end` trio is required.
#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Calendar URL or path
    pub calendar_url: String,

    /// Upload this ICS file instead of building an event
    #[arg(long, conflicts_with_all = ["summary", "start", "end", "description", "location", "organizer", "attendee"])]
    pub file: Option<PathBuf>,

    /// Event title
    #[arg(long, required_unless_present = "file")]
    pub summary: Option<String>,

    /// Start time (RFC 3339 or yyyyMMddTHHmmssZ)
    #[arg(long, value_parser = parse_datetime, required_unless_present = "file")]
    pub start: Option<DateTime<Utc>>,

    /// End time (RFC 3339 or yyyyMMddTHHmmssZ)
    #[arg(long, value_parser = parse_datetime, required_unless_present = "file")]
    pub end: Option<DateTime<Utc>>,

    /// Event description
    #[arg(long)]
    pub description: Option<String>,

    /// Event location
    #[arg(long)]
    pub location: Option<String>,

    /// Organizer, e.g. mailto:jane@example.com
    #[arg(long)]
    pub organizer: Option<String>,

    /// Attendee, e.g. mailto:bob@example.com (can be repeated)
    #[arg(long, action = clap::ArgAction::Append)]
    pub attendee: Vec<String>,

    /// Resource name and UID (generated if absent)
    #[arg(long)]
    pub uid: Option<String>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

/// Parses a date-time argument as RFC 3339 or compact iCalendar UTC.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(naive) = value.strip_suffix('Z')
        && let Ok(dt) = NaiveDateTime::parse_from_str(naive, davcal_core::time::ICALENDAR_NAIVE_FORMAT)
    {
        return Ok(dt.and_utc());
    }
    Err(format!(
        "invalid date-time `{}`: expected RFC 3339 (2024-06-15T14:00:00Z) or 20240615T140000Z",
        value
    ))
}
