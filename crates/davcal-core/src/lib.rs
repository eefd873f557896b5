//! Core types: credentials, calendars, events, iCalendar time, tracing

pub mod calendar;
pub mod credentials;
pub mod event;
pub mod time;
pub mod tracing;

pub use calendar::Calendar;
pub use credentials::Credentials;
pub use event::CalendarEvent;
pub use time::{
    EventTime, TimeRange, format_icalendar_utc, parse_icalendar_datetime, DEFAULT_RANGE_END,
    DEFAULT_RANGE_START,
};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
