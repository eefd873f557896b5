//! Server credentials.

use std::fmt;

use url::Url;

/// Everything needed to talk to one CalDAV account.
///
/// Credentials are immutable once built. The server URL is the root against
/// which relative hrefs from discovery responses are resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    server_url: Url,
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials for the given server.
    ///
    /// # Errors
    ///
    /// Returns an error if `server_url` is not an absolute URL.
    pub fn new(
        server_url: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            server_url: Url::parse(server_url.as_ref())?,
            username: username.into(),
            password: password.into(),
        })
    }

    /// Returns the server base URL.
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url.as_str())
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_creation() {
        let creds = Credentials::new("https://cal.example.com/caldav/", "user", "secret").unwrap();
        assert_eq!(creds.server_url().as_str(), "https://cal.example.com/caldav/");
        assert_eq!(creds.username(), "user");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn various_servers() {
        for url in [
            "https://caldav.example.com/",
            "http://localhost:5232/",
            "https://caldav.icloud.com/",
        ] {
            assert!(Credentials::new(url, "u", "p").is_ok());
        }
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(Credentials::new("", "user", "pass").is_err());
        assert!(Credentials::new("not a url", "user", "pass").is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("https://cal.example.com/", "user", "hunter2").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }
}
