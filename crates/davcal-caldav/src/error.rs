//! Error types for CalDAV operations.
//!
//! Only some failures surface as errors. Connectivity problems during
//! `test_connection`/`initialize` are folded into `false`, and malformed
//! iCalendar text never fails a listing. What remains is classified by
//! [`CalDavErrorCode`].

use std::fmt;
use thiserror::Error;

/// The category of a CalDAV error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalDavErrorCode {
    /// Calendar home discovery has not succeeded yet.
    NotInitialized,
    /// The server answered with a non-success status.
    HttpStatus,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    Network,
    /// A response body was not well-formed XML, or a path query was invalid.
    InvalidXml,
    /// A URL could not be built or resolved.
    InvalidUrl,
    /// The HTTP client could not be configured.
    Configuration,
}

impl CalDavErrorCode {
    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::HttpStatus => "http_status",
            Self::Network => "network_error",
            Self::InvalidXml => "invalid_xml",
            Self::InvalidUrl => "invalid_url",
            Self::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for CalDavErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a CalDAV server.
#[derive(Debug, Error)]
pub struct CalDavError {
    /// The error code categorizing this error.
    code: CalDavErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The HTTP status, for [`CalDavErrorCode::HttpStatus`].
    status: Option<u16>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CalDavError {
    /// Creates a new error with the given code and message.
    pub fn new(code: CalDavErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates the error raised when calendars are requested before discovery.
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::NotInitialized, message)
    }

    /// Creates an error for a non-success HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        let mut err = Self::new(CalDavErrorCode::HttpStatus, message);
        err.status = Some(status);
        err
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Network, message)
    }

    /// Creates an invalid XML error.
    pub fn invalid_xml(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::InvalidXml, message)
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::InvalidUrl, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Configuration, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> CalDavErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns true if discovery has to run before retrying.
    pub fn is_not_initialized(&self) -> bool {
        self.code == CalDavErrorCode::NotInitialized
    }
}

impl fmt::Display for CalDavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<quick_xml::Error> for CalDavError {
    fn from(err: quick_xml::Error) -> Self {
        Self::invalid_xml(format!("malformed XML: {}", err)).with_source(err)
    }
}

impl From<url::ParseError> for CalDavError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_url(err.to_string()).with_source(err)
    }
}

/// A specialized Result type for CalDAV operations.
pub type CalDavResult<T> = Result<T, CalDavError>;
