//! `davcal create`, `davcal update` and `davcal delete`.

use std::path::Path;

use davcal_caldav::caldav::ics;
use davcal_caldav::{CalDavSession, Transport};
use davcal_core::CalendarEvent;

use crate::cli::CreateArgs;
use crate::error::{CliError, CliResult};

/// Creates an event from flags or an ICS file and prints its URL.
pub async fn create<T: Transport>(session: &CalDavSession<T>, args: CreateArgs) -> CliResult<()> {
    let (uid, icalendar) = build_event(&args)?;
    let url = session
        .create_event(&args.calendar_url, &icalendar, Some(&uid))
        .await?;
    println!("{}", url);
    Ok(())
}

/// Replaces an event with the contents of an ICS file.
pub async fn update<T: Transport>(
    session: &CalDavSession<T>,
    event_url: &str,
    file: &Path,
    etag: Option<&str>,
) -> CliResult<()> {
    let icalendar = std::fs::read_to_string(file)?;
    session.update_event(event_url, &icalendar, etag).await?;
    println!("updated {}", event_url);
    Ok(())
}

/// Deletes an event.
pub async fn delete<T: Transport>(
    session: &CalDavSession<T>,
    event_url: &str,
    etag: Option<&str>,
) -> CliResult<()> {
    session.delete_event(event_url, etag).await?;
    println!("deleted {}", event_url);
    Ok(())
}

/// Returns the resource UID and the iCalendar text to upload.
///
/// For files the UID comes from `--uid`, then from the file's own UID, and
/// is generated as a last resort. Built events carry the same UID in their
/// body and their resource name.
pub fn build_event(args: &CreateArgs) -> CliResult<(String, String)> {
    if let Some(ref file) = args.file {
        let icalendar = std::fs::read_to_string(file)?;
        let uid = match args.uid.as_deref() {
            Some(uid) if !uid.is_empty() => uid.to_string(),
            _ => {
                let decoded = ics::decode(&icalendar);
                if decoded.uid.is_empty() {
                    ics::generate_uid()
                } else {
                    decoded.uid
                }
            }
        };
        return Ok((uid, icalendar));
    }

    let (Some(summary), Some(start), Some(end)) = (&args.summary, args.start, args.end) else {
        return Err(CliError::Usage(
            "create needs --summary, --start and --end, or --file".to_string(),
        ));
    };
    if end < start {
        return Err(CliError::Usage("--end is before --start".to_string()));
    }

    let uid = args
        .uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .unwrap_or_else(ics::generate_uid);

    let mut event = CalendarEvent::new(summary.as_str(), start, end).with_uid(uid.as_str());
    if let Some(ref description) = args.description {
        event = event.with_description(description.as_str());
    }
    if let Some(ref location) = args.location {
        event = event.with_location(location.as_str());
    }
    if let Some(ref organizer) = args.organizer {
        event = event.with_organizer(organizer.as_str());
    }
    for attendee in &args.attendee {
        event = event.with_attendee(attendee.as_str());
    }

    Ok((uid, ics::encode(&event)))
}
