//! CalDAV session configuration.

use std::time::Duration;

use url::Url;

use davcal_core::Credentials;

/// Configuration for a CalDAV session and its HTTP transport.
///
/// Timeout and TLS settings only affect [`HttpTransport`](super::HttpTransport);
/// the session itself never times out or retries.
#[derive(Debug, Clone)]
pub struct CalDavConfig {
    /// Server URL and account.
    pub credentials: Credentials,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl CalDavConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the given account with default settings.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("davcal/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Creates a configuration from a server URL and account.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn from_parts(
        url: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(Credentials::new(url, username, password)?))
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &Url {
        self.credentials.server_url()
    }
}
