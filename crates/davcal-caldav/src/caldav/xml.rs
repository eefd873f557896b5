//! XML bodies and multistatus parsing for CalDAV WebDAV operations.
//!
//! Request bodies are fixed documents; the only variable input is the
//! REPORT time range, which is format-constrained and needs no escaping.
//! Responses are read through the namespace-aware [`tree`](super::tree)
//! module so that servers may use any prefixes they like.

use tracing::debug;

use davcal_core::{Calendar, CalendarEvent, TimeRange};

use super::ics;
use super::tree::{Document, NodePath};
use crate::error::CalDavResult;

/// Path used by [`first_href`]: the first `href` anywhere in the document.
pub const DEFAULT_HREF_PATH: &str = "//d:href";

/// Path to the principal href in a current-user-principal response.
pub const CURRENT_USER_PRINCIPAL_HREF: &str = "//d:current-user-principal/d:href";

/// Path to the home href in a calendar-home-set response.
pub const CALENDAR_HOME_SET_HREF: &str = "//c:calendar-home-set/d:href";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Generates a PROPFIND request body for calendar discovery.
///
/// This requests the properties needed to identify calendars:
/// - displayname
/// - resourcetype
/// - getctag (Apple extension)
/// - calendar-description
/// - calendar-color
/// - supported-calendar-component-set
pub fn propfind_calendars_body() -> String {
    format!(
        r#"{XML_DECLARATION}
<d:propfind xmlns:d="DAV:" xmlns:cs="http://calendarserver.org/ns/" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:displayname />
    <d:resourcetype />
    <cs:getctag />
    <c:calendar-description />
    <c:calendar-color />
    <c:supported-calendar-component-set />
  </d:prop>
</d:propfind>"#
    )
}

/// Generates a calendar-query REPORT body for fetching events.
///
/// Missing bounds fall back to the defaults of [`TimeRange`].
pub fn calendar_query_body(range: &TimeRange) -> String {
    let start = range.start_or_default();
    let end = range.end_or_default();
    format!(
        r#"{XML_DECLARATION}
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:getetag />
    <c:calendar-data />
  </d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VEVENT">
        <c:time-range start="{start}" end="{end}" />
      </c:comp-filter>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#
    )
}

/// Generates a PROPFIND body asking for the current user principal.
pub fn current_user_principal_body() -> String {
    format!(
        r#"{XML_DECLARATION}
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:current-user-principal />
  </d:prop>
</d:propfind>"#
    )
}

/// Generates a PROPFIND body asking for the calendar home set.
pub fn calendar_home_body() -> String {
    format!(
        r#"{XML_DECLARATION}
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <c:calendar-home-set />
  </d:prop>
</d:propfind>"#
    )
}

/// Parses a PROPFIND multistatus into calendars.
///
/// Responses whose `resourcetype` lacks a `calendar` marker (address books,
/// plain folders, the home collection itself) are skipped.
pub fn parse_calendar_list(xml: &str) -> CalDavResult<Vec<Calendar>> {
    let doc = Document::parse(xml)?;

    let response = NodePath::parse("//d:response")?;
    let calendar_marker = NodePath::parse(".//d:resourcetype/c:calendar")?;
    let href = NodePath::parse("d:href")?;
    let display_name = NodePath::parse(".//d:displayname")?;
    let description = NodePath::parse(".//c:calendar-description")?;
    let ctag = NodePath::parse(".//cs:getctag")?;
    let color = NodePath::parse(".//c:calendar-color")?;

    let mut calendars = Vec::new();
    for resp in doc.select(&response) {
        if resp.select_first(&calendar_marker).is_none() {
            continue;
        }

        let mut calendar = Calendar::default();
        if let Some(el) = resp.select_first(&href) {
            calendar.url = el.text().trim().to_string();
            calendar.name = collection_name(&calendar.url);
        }
        if let Some(el) = resp.select_first(&display_name) {
            calendar.display_name = el.text();
        }
        if let Some(el) = resp.select_first(&description) {
            calendar.description = el.text();
        }
        if let Some(el) = resp.select_first(&ctag) {
            calendar.ctag = trim_quotes(&el.text());
        }
        if let Some(el) = resp.select_first(&color) {
            calendar.color = el.text().trim().to_string();
        }
        calendars.push(calendar);
    }

    debug!(count = calendars.len(), "Parsed calendar list");
    Ok(calendars)
}

/// Parses a calendar-query REPORT multistatus into events.
///
/// Responses without `calendar-data` are skipped. Unreadable iCalendar data
/// never drops an entry: it is kept with its raw text and default fields.
pub fn parse_calendar_events(xml: &str) -> CalDavResult<Vec<CalendarEvent>> {
    let doc = Document::parse(xml)?;

    let response = NodePath::parse("//d:response")?;
    let calendar_data = NodePath::parse(".//c:calendar-data")?;
    let href = NodePath::parse("d:href")?;
    let etag = NodePath::parse(".//d:getetag")?;

    let mut events = Vec::new();
    for resp in doc.select(&response) {
        let Some(data) = resp.select_first(&calendar_data) else {
            continue;
        };

        let mut event = ics::decode(&data.text());
        if let Some(el) = resp.select_first(&href) {
            event.href = el.text().trim().to_string();
        }
        if let Some(el) = resp.select_first(&etag) {
            event.etag = trim_quotes(&el.text());
        }
        events.push(event);
    }

    debug!(count = events.len(), "Parsed calendar events");
    Ok(events)
}

/// Returns the text of the first element matching `path`.
///
/// Returns an empty string when nothing matches.
pub fn extract_href(xml: &str, path: &str) -> CalDavResult<String> {
    let doc = Document::parse(xml)?;
    let path = NodePath::parse(path)?;
    Ok(doc
        .select_first(&path)
        .map(|el| el.text().trim().to_string())
        .unwrap_or_default())
}

/// Returns the text of the first `href` in the document.
pub fn first_href(xml: &str) -> CalDavResult<String> {
    extract_href(xml, DEFAULT_HREF_PATH)
}

/// Strips surrounding double quotes from an ETag or CTag.
fn trim_quotes(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}

/// Last non-empty path segment of a collection href.
fn collection_name(href: &str) -> String {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
