//! `davcal events`: list the events of a calendar.

use chrono::{DateTime, Utc};

use davcal_caldav::{CalDavSession, Transport};
use davcal_core::{CalendarEvent, TimeRange};

use crate::error::CliResult;

/// Fetches and prints the events of a calendar in a time range.
pub async fn run<T: Transport>(
    session: &CalDavSession<T>,
    calendar_url: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    json: bool,
) -> CliResult<()> {
    let range = TimeRange { start, end };
    let mut events = session.get_events(calendar_url, &range).await?;
    events.sort_by(|a, b| a.start.cmp(&b.start));

    if json {
        return super::print_json(&events);
    }
    print!("{}", render(&events));
    Ok(())
}

fn format_time(event_time: Option<DateTime<Utc>>) -> String {
    event_time
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Renders one line per event: time span, title, then href and etag.
pub fn render(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "No events found.\n".to_string();
    }

    let mut out = String::new();
    for event in events {
        let title = if event.summary.is_empty() {
            "(untitled)"
        } else {
            event.summary.as_str()
        };
        out.push_str(&format!(
            "{} - {}\t{}\t{}",
            format_time(event.start_utc()),
            format_time(event.end_utc()),
            title,
            event.href
        ));
        if !event.etag.is_empty() {
            out.push_str(&format!("\tetag={}", event.etag));
        }
        out.push('\n');
    }
    out
}
