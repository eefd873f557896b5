//! `davcal calendars`: list calendar collections.

use davcal_caldav::{CalDavSession, Transport};
use davcal_core::Calendar;

use crate::error::CliResult;

/// Lists the calendars in the calendar home.
pub async fn run<T: Transport>(session: &mut CalDavSession<T>, json: bool) -> CliResult<()> {
    let calendars = session.get_calendars().await?;
    if json {
        return super::print_json(&calendars);
    }
    print!("{}", render(&calendars));
    Ok(())
}

/// Renders one line per calendar: label, URL, then color and ctag if known.
pub fn render(calendars: &[Calendar]) -> String {
    if calendars.is_empty() {
        return "No calendars found.\n".to_string();
    }

    let mut out = String::new();
    for calendar in calendars {
        out.push_str(calendar.label());
        out.push('\t');
        out.push_str(&calendar.url);
        if !calendar.color.is_empty() {
            out.push_str(&format!("\tcolor={}", calendar.color));
        }
        if !calendar.ctag.is_empty() {
            out.push_str(&format!("\tctag={}", calendar.ctag));
        }
        out.push('\n');
    }
    out
}
