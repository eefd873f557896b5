//! CalDAV client library: discovery, event CRUD, iCalendar codec

pub mod caldav;
pub mod error;

pub use caldav::{CalDavConfig, CalDavSession, DiscoveryState, HttpTransport, Transport};
pub use error::{CalDavError, CalDavErrorCode, CalDavResult};
