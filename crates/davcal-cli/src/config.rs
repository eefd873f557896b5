//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/davcal/config.toml` by default:
//!
//! ```toml
//! [server]
//! url = "https://caldav.example.com/dav/"
//! username = "jane"
//! password = "pass::caldav/example"
//! timeout = 30
//! insecure_tls = false
//! ```
//!
//! The password supports secret references (see [`crate::secret`]).
//! Command-line flags and `DAVCAL_*` environment variables take precedence
//! over file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use davcal_caldav::CalDavConfig;

/// Configuration for the davcal client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// CalDAV server settings.
    pub server: ServerSettings,
}

/// CalDAV server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server root URL.
    pub url: Option<String>,

    /// Account name.
    pub username: Option<String>,

    /// Account password (supports `pass::` and `env::` prefixes).
    pub password: Option<String>,

    /// Request timeout in seconds.
    pub timeout: u64,

    /// Skip TLS certificate verification.
    pub insecure_tls: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            timeout: CalDavConfig::DEFAULT_TIMEOUT_SECS,
            insecure_tls: false,
        }
    }
}

/// Connection values given on the command line or through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Option<u64>,
    pub insecure_tls: bool,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("davcal")
    }

    /// Returns a copy with inline passwords masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.server.password = config.server.password.as_deref().map(crate::secret::redact);
        config
    }

    /// Builds the session configuration, resolving secrets.
    ///
    /// Overrides win over file values. URL, username and password are all
    /// required.
    pub fn caldav_config(&self, overrides: &ConnectionOverrides) -> Result<CalDavConfig, String> {
        let server = &self.server;

        let url = overrides
            .url
            .as_deref()
            .or(server.url.as_deref())
            .ok_or_else(|| {
                format!(
                    "no server URL configured. Pass --url, set DAVCAL_URL or add to {}:\n  \
                     [server]\n  \
                     url = \"https://caldav.example.com/\"",
                    Self::default_path().display()
                )
            })?;

        let username = overrides
            .username
            .as_deref()
            .or(server.username.as_deref())
            .ok_or_else(|| {
                "no username configured. Pass --username, set DAVCAL_USERNAME or set [server].username"
                    .to_string()
            })?;

        let raw_password = overrides
            .password
            .as_deref()
            .or(server.password.as_deref())
            .ok_or_else(|| {
                "no password configured. Set DAVCAL_PASSWORD or [server].password".to_string()
            })?;
        let password = crate::secret::resolve(raw_password)
            .map_err(|e| format!("failed to resolve password: {}", e))?;

        let timeout = overrides.timeout.unwrap_or(server.timeout);

        let mut config = CalDavConfig::from_parts(url, username, password)
            .map_err(|e| format!("invalid server URL `{}`: {}", url, e))?
            .with_timeout(Duration::from_secs(timeout));

        if overrides.insecure_tls || server.insecure_tls {
            config = config.with_insecure_tls();
        }

        Ok(config)
    }
}
