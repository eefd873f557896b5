//! davcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use davcal_caldav::CalDavSession;
use davcal_cli::cli::{Cli, Command, ConfigAction};
use davcal_cli::commands;
use davcal_cli::config::ClientConfig;
use davcal_cli::error::{CliError, CliResult};
use davcal_core::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(CliError::Config)?
    } else {
        ClientConfig::load().unwrap_or_default()
    };

    // A subscriber may already be installed; logging is best effort.
    let _ = init_tracing(cli.tracing_config(config.debug));

    let overrides = cli.connection.overrides();

    if let Command::Config { action } = cli.command {
        return match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config, &overrides),
            ConfigAction::Path => commands::config::path(),
        };
    }

    let caldav_config = config.caldav_config(&overrides).map_err(CliError::Config)?;
    let mut session = CalDavSession::connect(caldav_config)?;
    tracing::debug!(server = %session.credentials().server_url(), "Session ready");

    match cli.command {
        Command::Check => commands::check::run(&mut session).await,
        Command::Calendars => commands::calendars::run(&mut session, cli.json).await,
        Command::Events {
            calendar_url,
            start,
            end,
        } => commands::events::run(&session, &calendar_url, start, end, cli.json).await,
        Command::Create(args) => commands::edit::create(&session, args).await,
        Command::Update {
            event_url,
            file,
            etag,
        } => commands::edit::update(&session, &event_url, &file, etag.as_deref()).await,
        Command::Delete { event_url, etag } => {
            commands::edit::delete(&session, &event_url, etag.as_deref()).await
        }
        Command::Config { .. } => Ok(()),
    }
}
