//! Calendar event records.
//!
//! A [`CalendarEvent`] is either built by a caller (to be encoded and
//! uploaded) or produced by the response parser from a REPORT result. Only
//! the parser fills in [`CalendarEvent::etag`] and [`CalendarEvent::href`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// A single VEVENT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// RFC 5545 unique identifier, stable across updates.
    ///
    /// May be empty on a fresh record; the encoder then generates one.
    pub uid: String,
    /// Event title.
    pub summary: String,
    /// Event description.
    pub description: String,
    /// Start time; `None` when absent or unparseable.
    pub start: Option<EventTime>,
    /// End time; `None` when absent or unparseable.
    pub end: Option<EventTime>,
    /// Event location.
    pub location: String,
    /// Organizer as a `mailto:` URI.
    pub organizer: String,
    /// Attendee `mailto:` URIs in document order. Duplicates are kept.
    pub attendees: Vec<String>,
    /// The raw iCalendar text this record was decoded from.
    pub icalendar_data: String,
    /// Per-resource validator from the server.
    pub etag: String,
    /// Resource path on the server.
    pub href: String,
}

impl CalendarEvent {
    /// Creates a new event with the given title and UTC time span.
    ///
    /// The UID is left empty so that one is generated at encode time.
    pub fn new(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            summary: summary.into(),
            start: Some(EventTime::Utc(start)),
            end: Some(EventTime::Utc(end)),
            ..Default::default()
        }
    }

    /// Builder method to set the UID.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    /// Builder method to set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the organizer.
    #[must_use]
    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = organizer.into();
        self
    }

    /// Builder method to append an attendee.
    #[must_use]
    pub fn with_attendee(mut self, attendee: impl Into<String>) -> Self {
        self.attendees.push(attendee.into());
        self
    }

    /// Returns the start as a UTC instant, if set.
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        self.start.as_ref().map(EventTime::to_utc)
    }

    /// Returns the end as a UTC instant, if set.
    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        self.end.as_ref().map(EventTime::to_utc)
    }
}
