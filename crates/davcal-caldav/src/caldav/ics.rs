//! ICS/iCalendar encoding and decoding.
//!
//! This module turns a [`CalendarEvent`] into a single-VEVENT RFC 5545
//! document and back. Decoding is a best-effort line scanner: it never
//! fails, leaves fields it cannot read at their defaults, and always keeps
//! the input text in [`CalendarEvent::icalendar_data`].

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use davcal_core::{CalendarEvent, format_icalendar_utc, parse_icalendar_datetime};

/// PRODID written into every generated document.
pub const PRODUCT_ID: &str = "-//davcal//davcal CalDAV client 1.0//EN";

/// Line terminator mandated by RFC 5545.
const CRLF: &str = "\r\n";

/// Encodes an event as an iCalendar document, stamped with the current time.
///
/// If the event has no UID a fresh UUID is generated; the event itself is
/// not modified.
pub fn encode(event: &CalendarEvent) -> String {
    encode_at(event, Utc::now())
}

/// Encodes an event with an explicit `DTSTAMP`.
pub fn encode_at(event: &CalendarEvent, stamp: DateTime<Utc>) -> String {
    let uid = if event.uid.is_empty() {
        generate_uid()
    } else {
        event.uid.clone()
    };

    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODUCT_ID),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", uid),
        format!("DTSTAMP:{}", format_icalendar_utc(stamp)),
    ];

    if let Some(start) = event.start {
        lines.push(format!("DTSTART:{}", start.to_icalendar()));
    }
    if let Some(end) = event.end {
        lines.push(format!("DTEND:{}", end.to_icalendar()));
    }

    push_text(&mut lines, "SUMMARY", &event.summary);
    push_text(&mut lines, "DESCRIPTION", &event.description);
    push_text(&mut lines, "LOCATION", &event.location);

    // URIs, not free text: written verbatim
    if !event.organizer.is_empty() {
        lines.push(format!("ORGANIZER:{}", event.organizer));
    }
    for attendee in &event.attendees {
        lines.push(format!("ATTENDEE:{}", attendee));
    }

    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join(CRLF);
    out.push_str(CRLF);
    out
}

/// Builds and encodes an event from its basic fields with a fresh UID.
pub fn simple_event(
    summary: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    description: Option<&str>,
    location: Option<&str>,
) -> String {
    let event = CalendarEvent::new(summary, start, end)
        .with_uid(generate_uid())
        .with_description(description.unwrap_or_default())
        .with_location(location.unwrap_or_default());
    encode(&event)
}

/// Generates a new random UID.
pub fn generate_uid() -> String {
    Uuid::new_v4().to_string()
}

/// Decodes iCalendar text into an event.
///
/// Only the first VEVENT is read. Properties nested in other components
/// (VTIMEZONE, VALARM, ...) are skipped. Unreadable date-times become
/// `None`.
pub fn decode(text: &str) -> CalendarEvent {
    let mut event = CalendarEvent {
        icalendar_data: text.to_string(),
        ..Default::default()
    };

    // Components entered via BEGIN, innermost last
    let mut components: Vec<String> = Vec::new();

    for line in unfold(text) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((name, value)) = split_property(line) else {
            continue;
        };

        match name.as_str() {
            "BEGIN" => {
                components.push(value.to_ascii_uppercase());
                continue;
            }
            "END" => {
                let ended = components.pop();
                if ended.as_deref() == Some("VEVENT") {
                    break;
                }
                continue;
            }
            _ => {}
        }

        if components
            .iter()
            .any(|c| c != "VCALENDAR" && c != "VEVENT")
        {
            continue;
        }

        match name.as_str() {
            "UID" => event.uid = value.to_string(),
            "SUMMARY" => event.summary = unescape_text(value),
            "DESCRIPTION" => event.description = unescape_text(value),
            "LOCATION" => event.location = unescape_text(value),
            "ORGANIZER" => event.organizer = value.to_string(),
            "ATTENDEE" => event.attendees.push(value.to_string()),
            "DTSTART" => {
                event.start = parse_icalendar_datetime(value);
                if event.start.is_none() {
                    warn!(value = %value, "Unreadable DTSTART, leaving unset");
                }
            }
            "DTEND" => {
                event.end = parse_icalendar_datetime(value);
                if event.end.is_none() {
                    warn!(value = %value, "Unreadable DTEND, leaving unset");
                }
            }
            _ => {}
        }
    }

    event
}

/// Escapes free text for SUMMARY, DESCRIPTION and LOCATION values.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Reverses [`escape_text`]. Unknown escape sequences are kept as-is.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn push_text(lines: &mut Vec<String>, name: &str, value: &str) {
    if !value.is_empty() {
        lines.push(format!("{}:{}", name, escape_text(value)));
    }
}

/// Joins folded continuation lines and strips indentation.
///
/// A line starting with a space or tab continues the previous one, unless
/// its trimmed form is itself a content line. Indented documents (as found
/// in pretty-printed `calendar-data`) are read line by line.
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = raw.strip_prefix([' ', '\t'])
            && !is_content_line(rest.trim_start())
            && let Some(last) = lines.last_mut()
        {
            last.push_str(rest);
            continue;
        }
        lines.push(raw.trim_start().to_string());
    }
    lines
}

/// Returns true for `NAME:value` and `NAME;PARAM=...:value` lines.
///
/// Names are matched in upper case only, so folded text such as
/// ` mailto:bob@example.com` or ` Agenda: ...` stays a continuation.
fn is_content_line(line: &str) -> bool {
    let Some(end) = line.find([':', ';']) else {
        return false;
    };
    let name = &line[..end];
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

/// Splits a content line into its uppercased property name and value.
///
/// Parameters (`ATTENDEE;CN=Jane:mailto:jane@example.com`) are dropped.
/// Colons inside quoted parameter values do not end the name part.
fn split_property(line: &str) -> Option<(String, &str)> {
    let mut in_quotes = false;
    let mut colon = None;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }

    let colon = colon?;
    let head = &line[..colon];
    let name = head.split(';').next().unwrap_or(head).trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_uppercase(), &line[colon + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use davcal_core::EventTime;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn sample_event() -> CalendarEvent {
        CalendarEvent::new("Test Meeting", utc(2024, 6, 15, 14, 0), utc(2024, 6, 15, 15, 0))
            .with_uid("test-uid-123")
            .with_description("Test Description")
            .with_location("Conference Room A")
            .with_organizer("mailto:organizer@example.com")
    }

    fn uid_line(ics: &str) -> String {
        ics.lines()
            .find(|l| l.starts_with("UID:"))
            .map(|l| l[4..].trim().to_string())
            .unwrap()
    }

    mod encoding {
        use super::*;

        #[test]
        fn basic_event() {
            let ics = encode(&sample_event());

            assert!(ics.starts_with("BEGIN:VCALENDAR"));
            assert!(ics.contains("VERSION:2.0"));
            assert!(ics.contains(&format!("PRODID:{}", PRODUCT_ID)));
            assert!(ics.contains("CALSCALE:GREGORIAN"));
            assert!(ics.contains("METHOD:PUBLISH"));
            assert!(ics.contains("BEGIN:VEVENT"));
            assert!(ics.contains("UID:test-uid-123"));
            assert!(ics.contains("SUMMARY:Test Meeting"));
            assert!(ics.contains("DESCRIPTION:Test Description"));
            assert!(ics.contains("DTSTART:20240615T140000Z"));
            assert!(ics.contains("DTEND:20240615T150000Z"));
            assert!(ics.contains("LOCATION:Conference Room A"));
            assert!(ics.contains("ORGANIZER:mailto:organizer@example.com"));
            assert!(ics.contains("END:VEVENT"));
            assert!(ics.trim_end().ends_with("END:VCALENDAR"));
        }

        #[test]
        fn exact_layout() {
            let event = sample_event().with_attendee("mailto:a@example.com");
            let ics = encode_at(&event, utc(2024, 6, 1, 8, 30));

            let expected = [
                "BEGIN:VCALENDAR",
                "VERSION:2.0",
                "PRODID:-//davcal//davcal CalDAV client 1.0//EN",
                "CALSCALE:GREGORIAN",
                "METHOD:PUBLISH",
                "BEGIN:VEVENT",
                "UID:test-uid-123",
                "DTSTAMP:20240601T083000Z",
                "DTSTART:20240615T140000Z",
                "DTEND:20240615T150000Z",
                "SUMMARY:Test Meeting",
                "DESCRIPTION:Test Description",
                "LOCATION:Conference Room A",
                "ORGANIZER:mailto:organizer@example.com",
                "ATTENDEE:mailto:a@example.com",
                "END:VEVENT",
                "END:VCALENDAR",
                "",
            ]
            .join("\r\n");

            assert_eq!(ics, expected);
        }

        #[test]
        fn empty_uid_generates_uuid() {
            let event = CalendarEvent::new("Test Event", utc(2024, 6, 15, 14, 0), utc(2024, 6, 15, 15, 0));

            let first = uid_line(&encode(&event));
            let second = uid_line(&encode(&event));

            assert!(Uuid::parse_str(&first).is_ok());
            assert!(Uuid::parse_str(&second).is_ok());
            assert_ne!(first, second);
            assert!(event.uid.is_empty());
        }

        #[test]
        fn includes_all_attendees() {
            let event = CalendarEvent::new("Sync", utc(2024, 6, 15, 14, 0), utc(2024, 6, 15, 15, 0))
                .with_uid("test-uid")
                .with_attendee("mailto:attendee1@example.com")
                .with_attendee("mailto:attendee2@example.com")
                .with_attendee("mailto:attendee3@example.com");

            let ics = encode(&event);

            assert!(ics.contains("ATTENDEE:mailto:attendee1@example.com"));
            assert!(ics.contains("ATTENDEE:mailto:attendee2@example.com"));
            assert!(ics.contains("ATTENDEE:mailto:attendee3@example.com"));
        }

        #[test]
        fn omits_empty_optional_lines() {
            let event = CalendarEvent::new("Only a title", utc(2024, 6, 15, 14, 0), utc(2024, 6, 15, 15, 0));
            let ics = encode(&event);

            assert!(ics.contains("SUMMARY:Only a title"));
            assert!(!ics.contains("DESCRIPTION:"));
            assert!(!ics.contains("LOCATION:"));
            assert!(!ics.contains("ORGANIZER:"));
            assert!(!ics.contains("ATTENDEE:"));
        }

        #[test]
        fn unset_times_are_omitted() {
            let event = CalendarEvent {
                uid: "no-times".to_string(),
                summary: "Floating idea".to_string(),
                ..Default::default()
            };
            let ics = encode(&event);

            assert!(!ics.contains("DTSTART:"));
            assert!(!ics.contains("DTEND:"));
            assert!(ics.contains("DTSTAMP:"));
        }

        #[test]
        fn dtstamp_has_wire_format() {
            let ics = encode(&sample_event());
            let stamp = regex::Regex::new(r"(?m)^DTSTAMP:\d{8}T\d{6}Z\r?$").unwrap();
            assert!(stamp.is_match(&ics));
        }

        #[test]
        fn escapes_free_text_only() {
            let event = CalendarEvent::new("a,b;c\\d\ne\r", utc(2024, 6, 15, 14, 0), utc(2024, 6, 15, 15, 0))
                .with_uid("esc")
                .with_organizer("mailto:x,y@example.com");
            let ics = encode(&event);

            assert!(ics.contains("SUMMARY:a\\,b\\;c\\\\d\\ne\r\n"));
            assert!(ics.contains("ORGANIZER:mailto:x,y@example.com"));
        }

        #[test]
        fn simple_event_fields() {
            let ics = simple_event(
                "Simple Test Event",
                utc(2024, 7, 1, 10, 0),
                utc(2024, 7, 1, 11, 0),
                Some("This is a description"),
                Some("Meeting Room B"),
            );

            assert!(ics.starts_with("BEGIN:VCALENDAR"));
            assert!(ics.contains("SUMMARY:Simple Test Event"));
            assert!(ics.contains("DTSTART:20240701T100000Z"));
            assert!(ics.contains("DTEND:20240701T110000Z"));
            assert!(ics.contains("DESCRIPTION:This is a description"));
            assert!(ics.contains("LOCATION:Meeting Room B"));
            assert!(Uuid::parse_str(&uid_line(&ics)).is_ok());
        }

        #[test]
        fn simple_event_without_optionals() {
            let ics = simple_event("Test Event", utc(2024, 7, 1, 10, 0), utc(2024, 7, 1, 11, 0), None, None);

            assert!(ics.contains("SUMMARY:Test Event"));
            assert!(!ics.contains("DESCRIPTION:"));
            assert!(!ics.contains("LOCATION:"));
        }
    }

    mod decoding {
        use super::*;

        #[test]
        fn basic_fields() {
            let text = "BEGIN:VCALENDAR\r\n\
                        VERSION:2.0\r\n\
                        BEGIN:VEVENT\r\n\
                        UID:meeting-001\r\n\
                        DTSTART:20240615T140000Z\r\n\
                        DTEND:20240615T150000Z\r\n\
                        SUMMARY:Team Standup\r\n\
                        DESCRIPTION:Daily team standup meeting\r\n\
                        LOCATION:Conference Room A\r\n\
                        ORGANIZER:mailto:manager@company.com\r\n\
                        ATTENDEE:mailto:dev1@company.com\r\n\
                        ATTENDEE:mailto:dev2@company.com\r\n\
                        END:VEVENT\r\n\
                        END:VCALENDAR\r\n";

            let event = decode(text);

            assert_eq!(event.uid, "meeting-001");
            assert_eq!(event.summary, "Team Standup");
            assert_eq!(event.description, "Daily team standup meeting");
            assert_eq!(event.location, "Conference Room A");
            assert_eq!(event.organizer, "mailto:manager@company.com");
            assert_eq!(
                event.attendees,
                vec!["mailto:dev1@company.com", "mailto:dev2@company.com"]
            );
            assert_eq!(event.start, Some(EventTime::Utc(utc(2024, 6, 15, 14, 0))));
            assert_eq!(event.end, Some(EventTime::Utc(utc(2024, 6, 15, 15, 0))));
            assert_eq!(event.icalendar_data, text);
            assert!(event.etag.is_empty());
            assert!(event.href.is_empty());
        }

        #[test]
        fn invalid_data_degrades() {
            let event = decode("INVALID ICALENDAR DATA");

            assert!(event.uid.is_empty());
            assert!(event.summary.is_empty());
            assert!(event.start.is_none());
            assert!(event.end.is_none());
            assert!(event.attendees.is_empty());
            assert_eq!(event.icalendar_data, "INVALID ICALENDAR DATA");
        }

        #[test]
        fn bad_date_leaves_field_unset() {
            let event = decode("BEGIN:VEVENT\nUID:x\nDTSTART:tomorrow-ish\nDTEND:20240615T150000Z\nEND:VEVENT");

            assert_eq!(event.uid, "x");
            assert!(event.start.is_none());
            assert!(event.end.is_some());
        }

        #[test]
        fn floating_time() {
            let event = decode("BEGIN:VEVENT\nDTSTART:20240615T140000\nEND:VEVENT");
            let start = event.start.unwrap();
            assert!(!start.is_utc());
        }

        #[test]
        fn duplicate_attendees_are_kept() {
            let event = decode("ATTENDEE:mailto:a@x.com\nATTENDEE:mailto:a@x.com\n");
            assert_eq!(event.attendees.len(), 2);
        }

        #[test]
        fn parameters_are_dropped() {
            let event = decode(
                "BEGIN:VEVENT\n\
                 ORGANIZER;CN=\"Boss: The Big One\":mailto:boss@example.com\n\
                 ATTENDEE;CN=Jane;PARTSTAT=ACCEPTED:mailto:jane@example.com\n\
                 SUMMARY;LANGUAGE=en:Planning\n\
                 END:VEVENT",
            );

            assert_eq!(event.organizer, "mailto:boss@example.com");
            assert_eq!(event.attendees, vec!["mailto:jane@example.com"]);
            assert_eq!(event.summary, "Planning");
        }

        #[test]
        fn indented_lines_are_trimmed() {
            let event = decode(
                "BEGIN:VCALENDAR\n\
                 \x20 BEGIN:VEVENT\n\
                 \x20   UID:abc\n\
                 \x20   SUMMARY:Hello  \n\
                 \t  DTSTART:20240615T140000Z\n\
                 \x20   ATTENDEE;CN=Jane:mailto:jane@example.com\n\
                 \x20 END:VEVENT\n\
                 END:VCALENDAR",
            );

            assert_eq!(event.uid, "abc");
            assert_eq!(event.summary, "Hello");
            assert_eq!(event.start, Some(EventTime::Utc(utc(2024, 6, 15, 14, 0))));
            assert_eq!(event.attendees, vec!["mailto:jane@example.com"]);
        }

        #[test]
        fn folded_values_that_look_like_text_stay_joined() {
            let event = decode(
                "BEGIN:VEVENT\r\n\
                 DESCRIPTION:Notes\r\n\
                 \x20Agenda: review\r\n\
                 ATTENDEE;CN=Bob:\r\n\
                 \x20mailto:bob@example.com\r\n\
                 END:VEVENT\r\n",
            );

            assert_eq!(event.description, "NotesAgenda: review");
            assert_eq!(event.attendees, vec!["mailto:bob@example.com"]);
        }

        #[test]
        fn folded_lines_are_joined() {
            let event = decode("BEGIN:VEVENT\r\nDESCRIPTION:This is a long\r\n  description\r\nEND:VEVENT\r\n");
            assert_eq!(event.description, "This is a long description");
        }

        #[test]
        fn nested_components_are_ignored() {
            let text = "BEGIN:VCALENDAR\n\
                        BEGIN:VTIMEZONE\n\
                        TZID:Europe/Paris\n\
                        BEGIN:STANDARD\n\
                        DTSTART:19701025T030000\n\
                        END:STANDARD\n\
                        END:VTIMEZONE\n\
                        BEGIN:VEVENT\n\
                        UID:with-alarm\n\
                        DTSTART:20240615T140000Z\n\
                        BEGIN:VALARM\n\
                        DESCRIPTION:Reminder\n\
                        END:VALARM\n\
                        SUMMARY:Dentist\n\
                        END:VEVENT\n\
                        END:VCALENDAR";

            let event = decode(text);

            assert_eq!(event.uid, "with-alarm");
            assert_eq!(event.start, Some(EventTime::Utc(utc(2024, 6, 15, 14, 0))));
            assert!(event.description.is_empty());
            assert_eq!(event.summary, "Dentist");
        }

        #[test]
        fn only_first_vevent_is_read() {
            let event = decode("BEGIN:VEVENT\nUID:first\nEND:VEVENT\nBEGIN:VEVENT\nUID:second\nEND:VEVENT");
            assert_eq!(event.uid, "first");
        }
    }

    mod round_trip {
        use super::*;

        #[test]
        fn preserves_uid_and_times() {
            let original = sample_event();
            let decoded = decode(&encode(&original));

            assert_eq!(decoded.uid, original.uid);
            assert_eq!(decoded.start, original.start);
            assert_eq!(decoded.end, original.end);
            assert_eq!(decoded.organizer, original.organizer);
        }

        #[test]
        fn special_characters_survive() {
            for input in [
                "Test, Event",
                "Test; Event",
                "Test\nEvent",
                "Test\\Event",
                "a\\,b",
                "trailing\\",
                "\\n is not a newline",
            ] {
                let event = CalendarEvent::new(input, utc(2024, 6, 15, 14, 0), utc(2024, 6, 15, 15, 0))
                    .with_description(input)
                    .with_location(input);
                let decoded = decode(&encode(&event));

                assert_eq!(decoded.summary, input);
                assert_eq!(decoded.description, input);
                assert_eq!(decoded.location, input);
            }
        }

        #[test]
        fn escape_unescape_pair() {
            assert_eq!(escape_text("a,b"), "a\\,b");
            assert_eq!(escape_text("line1\r\nline2"), "line1\\nline2");
            assert_eq!(unescape_text("a\\,b\\;c\\\\d\\Ne"), "a,b;c\\d\ne");
            assert_eq!(unescape_text("keep \\x"), "keep \\x");
        }
    }
}
