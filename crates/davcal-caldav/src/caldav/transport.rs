//! The HTTP collaborator used by [`CalDavSession`](super::CalDavSession).
//!
//! The session builds [`DavRequest`] values and hands them to a
//! [`Transport`]. Non-success statuses are returned as ordinary
//! [`DavResponse`]s; only failures to get any response at all are errors.

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, Method};
use tracing::{debug, trace};

use super::auth::authorization_for;
use super::config::CalDavConfig;
use crate::error::{CalDavError, CalDavResult};

/// Content type for XML request bodies.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Content type for iCalendar request bodies.
pub const ICALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// HTTP methods used by the CalDAV session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    Options,
    Propfind,
    Report,
    Put,
    Delete,
}

impl DavMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Propfind => "PROPFIND",
            Self::Report => "REPORT",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for DavMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single WebDAV request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavRequest {
    /// Request method.
    pub method: DavMethod,
    /// Absolute target URL.
    pub url: String,
    /// Extra headers such as `Depth` or `If-Match`.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<String>,
    /// Content type of the body.
    pub content_type: Option<&'static str>,
}

impl DavRequest {
    fn new(method: DavMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            content_type: None,
        }
    }

    /// Creates a PROPFIND request with an XML body.
    pub fn propfind(url: impl Into<String>, depth: u8, body: impl Into<String>) -> Self {
        Self::new(DavMethod::Propfind, url)
            .header("Depth", depth.to_string())
            .xml_body(body)
    }

    /// Creates a REPORT request with an XML body.
    pub fn report(url: impl Into<String>, depth: u8, body: impl Into<String>) -> Self {
        Self::new(DavMethod::Report, url)
            .header("Depth", depth.to_string())
            .xml_body(body)
    }

    /// Creates a PUT request carrying iCalendar text.
    pub fn put(url: impl Into<String>, icalendar: impl Into<String>) -> Self {
        let mut request = Self::new(DavMethod::Put, url);
        request.body = Some(icalendar.into());
        request.content_type = Some(ICALENDAR_CONTENT_TYPE);
        request
    }

    /// Creates a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(DavMethod::Delete, url)
    }

    /// Creates an OPTIONS request.
    pub fn options(url: impl Into<String>) -> Self {
        Self::new(DavMethod::Options, url)
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first value of a header, matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn xml_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(XML_CONTENT_TYPE);
        self
    }
}

/// The status and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl DavResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses (207 Multi-Status included).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends WebDAV requests.
///
/// Implementations attach authentication and client identification to every
/// request and own timeouts and TLS policy.
pub trait Transport: Send + Sync {
    /// Sends a request and returns whatever status the server answered with.
    ///
    /// Errors are reserved for failures to obtain a response (connection,
    /// TLS, timeout, body read).
    fn send(&self, request: DavRequest) -> BoxFuture<'_, CalDavResult<DavResponse>>;
}

/// [`Transport`] backed by a `reqwest` client with Basic authentication.
pub struct HttpTransport {
    /// The underlying HTTP client.
    client: Client,
    /// Precomputed `Authorization` header value.
    authorization: String,
}

impl HttpTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: &CalDavConfig) -> CalDavResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                CalDavError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            client,
            authorization: authorization_for(&config.credentials),
        })
    }

    async fn execute(&self, request: DavRequest) -> CalDavResult<DavResponse> {
        let method = Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
            CalDavError::configuration(format!("Invalid HTTP method: {}", request.method))
                .with_source(e)
        })?;

        debug!(
            method = %request.method,
            url = %request.url,
            depth = request.header_value("Depth").unwrap_or("-"),
            "Sending request"
        );

        let mut builder = self
            .client
            .request(method, &request.url)
            .header("Authorization", &self.authorization);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            if let Some(content_type) = request.content_type {
                builder = builder.header("Content-Type", content_type);
            }
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            CalDavError::network(format!("{} {} failed: {}", request.method, request.url, e))
                .with_source(e)
        })?;

        let status = response.status().as_u16();
        trace!(status, url = %request.url, "Received response");

        let body = response.text().await.map_err(|e| {
            CalDavError::network(format!("Failed to read response: {}", e)).with_source(e)
        })?;

        Ok(DavResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: DavRequest) -> BoxFuture<'_, CalDavResult<DavResponse>> {
        Box::pin(self.execute(request))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn propfind_request() {
        let request = DavRequest::propfind("https://dav.example.com/", 0, "<x/>");

        assert_eq!(request.method, DavMethod::Propfind);
        assert_eq!(request.header_value("depth"), Some("0"));
        assert_eq!(request.body.as_deref(), Some("<x/>"));
        assert_eq!(request.content_type, Some(XML_CONTENT_TYPE));
    }

    #[test]
    fn put_request_is_icalendar() {
        let request = DavRequest::put("https://dav.example.com/cal/a.ics", "BEGIN:VCALENDAR")
            .header("If-None-Match", "*");

        assert_eq!(request.method.as_str(), "PUT");
        assert_eq!(request.content_type, Some(ICALENDAR_CONTENT_TYPE));
        assert_eq!(request.header_value("If-None-Match"), Some("*"));
        assert!(request.header_value("Depth").is_none());
    }

    #[test]
    fn bodiless_requests() {
        for request in [
            DavRequest::delete("https://dav.example.com/cal/a.ics"),
            DavRequest::options("https://dav.example.com/"),
        ] {
            assert!(request.body.is_none());
            assert!(request.content_type.is_none());
        }
    }

    #[test]
    fn response_success_range() {
        assert!(DavResponse::new(200, "").is_success());
        assert!(DavResponse::new(201, "").is_success());
        assert!(DavResponse::new(204, "").is_success());
        assert!(DavResponse::new(207, "").is_success());
        assert!(!DavResponse::new(304, "").is_success());
        assert!(!DavResponse::new(412, "").is_success());
        assert!(!DavResponse::new(500, "").is_success());
    }

    #[test]
    fn transport_creation() {
        let config = CalDavConfig::from_parts("https://caldav.example.com/", "user", "pass")
            .unwrap()
            .with_timeout(Duration::from_secs(10));

        let transport = HttpTransport::new(&config);
        assert!(transport.is_ok());
    }
}
