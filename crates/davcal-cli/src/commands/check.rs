//! `davcal check`: connection test and discovery report.

use davcal_caldav::caldav::NOT_INITIALIZED_MESSAGE;
use davcal_caldav::{CalDavError, CalDavSession, Transport};

use crate::error::CliResult;

/// Tests the connection, runs discovery and prints what was found.
///
/// Fails if the calendar home could not be discovered.
pub async fn run<T: Transport>(session: &mut CalDavSession<T>) -> CliResult<()> {
    let server = session.credentials().server_url().to_string();
    let reachable = session.test_connection().await;
    println!(
        "server:    {} ({})",
        server,
        if reachable { "reachable" } else { "OPTIONS failed" }
    );

    let ready = session.initialize().await;
    println!("principal: {}", session.principal_url().unwrap_or("not found"));
    println!("home:      {}", session.calendar_home_url().unwrap_or("not found"));

    if !ready {
        return Err(CalDavError::not_initialized(NOT_INITIALIZED_MESSAGE).into());
    }
    Ok(())
}
