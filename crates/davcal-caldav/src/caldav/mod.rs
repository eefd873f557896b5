//! CalDAV protocol client.
//!
//! This module provides a [`CalDavSession`] that discovers a user's calendar
//! home and reads and writes events on CalDAV-compatible servers.
//!
//! # Features
//!
//! - HTTP Basic authentication
//! - Two-step discovery (current-user-principal, calendar-home-set)
//! - PROPFIND for calendar listing, REPORT calendar-query for events
//! - Conditional PUT/DELETE with `If-None-Match`/`If-Match`
//! - ICS/iCalendar encoding and best-effort decoding
//!
//! # Example
//!
//! ```ignore
//! use davcal_caldav::caldav::{CalDavConfig, CalDavSession};
//!
//! let config = CalDavConfig::from_parts("https://caldav.example.com/", "user", "password")?;
//! let mut session = CalDavSession::connect(config)?;
//!
//! if session.initialize().await {
//!     for calendar in session.get_calendars().await? {
//!         println!("{}", calendar.label());
//!     }
//! }
//! ```

mod auth;
mod config;
pub mod ics;
mod session;
mod transport;
pub mod tree;
pub mod xml;

pub use auth::basic_auth;
pub use config::CalDavConfig;
pub use session::{CalDavSession, DiscoveryState, NOT_INITIALIZED_MESSAGE};
pub use transport::{
    BoxFuture, DavMethod, DavRequest, DavResponse, HttpTransport, ICALENDAR_CONTENT_TYPE,
    Transport, XML_CONTENT_TYPE,
};
