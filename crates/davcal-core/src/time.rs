//! Time types for calendar events.
//!
//! This module provides [`EventTime`] for representing event start/end times
//! as they appear on the wire (either UTC or floating), [`TimeRange`] for
//! defining REPORT query ranges, and the helpers that convert between chrono
//! values and the compact iCalendar `yyyyMMddTHHmmssZ` form.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// chrono format string for UTC date-times on the wire.
pub const ICALENDAR_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// chrono format string for the date-time part without the `Z` suffix.
pub const ICALENDAR_NAIVE_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Lower bound used for calendar queries without an explicit start.
pub const DEFAULT_RANGE_START: &str = "19700101T000000Z";

/// Upper bound used for calendar queries without an explicit end.
///
/// This is the last second representable as a signed 32-bit Unix time.
pub const DEFAULT_RANGE_END: &str = "20380119T031407Z";

/// Represents the time of a calendar event.
///
/// iCalendar date-times come in two flavours:
/// - **Utc**: the value carried a `Z` suffix and is an absolute instant
/// - **Floating**: no zone information; interpreted in the local timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A UTC instant.
    Utc(DateTime<Utc>),
    /// A date-time without timezone context.
    Floating(NaiveDateTime),
}

impl EventTime {
    /// Creates a new `EventTime::Utc` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::Utc(dt)
    }

    /// Creates a new `EventTime::Utc` from a datetime in any timezone.
    pub fn from_local<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self::Utc(dt.with_timezone(&Utc))
    }

    /// Creates a new `EventTime::Floating` from a naive datetime.
    pub fn floating(dt: NaiveDateTime) -> Self {
        Self::Floating(dt)
    }

    /// Returns `true` if this time was tagged as UTC.
    pub fn is_utc(&self) -> bool {
        matches!(self, Self::Utc(_))
    }

    /// Returns the datetime if this is a `Utc` variant.
    pub fn as_utc(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Utc(dt) => Some(dt),
            Self::Floating(_) => None,
        }
    }

    /// Converts to a UTC instant.
    ///
    /// Floating values are interpreted in the process-local timezone. When
    /// the local time falls into a DST gap the wall-clock value is taken as
    /// UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Utc(dt) => *dt,
            Self::Floating(naive) => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| naive.and_utc()),
        }
    }

    /// Formats this time as an iCalendar UTC value (`yyyyMMddTHHmmssZ`).
    pub fn to_icalendar(&self) -> String {
        format_icalendar_utc(self.to_utc())
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Utc(dt)
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc().cmp(&other.to_utc())
    }
}

/// Formats a UTC datetime in the compact iCalendar form.
pub fn format_icalendar_utc(dt: DateTime<Utc>) -> String {
    dt.format(ICALENDAR_UTC_FORMAT).to_string()
}

/// Parses an iCalendar date-time value.
///
/// Handles:
/// - `20240615T140000Z` (UTC, tagged as [`EventTime::Utc`])
/// - `20240615T140000` (unzoned, tagged as [`EventTime::Floating`])
///
/// Returns `None` for anything else, including date-only values.
pub fn parse_icalendar_datetime(value: &str) -> Option<EventTime> {
    let value = value.trim();

    if let Some(naive) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(naive, ICALENDAR_NAIVE_FORMAT)
            .ok()
            .map(|dt| EventTime::Utc(dt.and_utc()));
    }

    NaiveDateTime::parse_from_str(value, ICALENDAR_NAIVE_FORMAT)
        .ok()
        .map(EventTime::Floating)
}

/// A time range for calendar-query REPORT requests.
///
/// Both bounds are optional and default independently: a missing start
/// means [`DEFAULT_RANGE_START`], a missing end means [`DEFAULT_RANGE_END`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range (inclusive).
    pub start: Option<DateTime<Utc>>,
    /// End of the range (exclusive).
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates an unbounded range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a range with both bounds set.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Builder method to set the start bound.
    #[must_use]
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the end bound.
    #[must_use]
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Returns the start bound in wire format, falling back to the epoch.
    pub fn start_or_default(&self) -> String {
        self.start
            .map(format_icalendar_utc)
            .unwrap_or_else(|| DEFAULT_RANGE_START.to_string())
    }

    /// Returns the end bound in wire format, falling back to 2038-01-19.
    pub fn end_or_default(&self) -> String {
        self.end
            .map(format_icalendar_utc)
            .unwrap_or_else(|| DEFAULT_RANGE_END.to_string())
    }

    /// Returns `true` if neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}
