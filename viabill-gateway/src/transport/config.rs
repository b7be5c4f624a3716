//! HTTP transport configuration.
//!
//! Deserialized from the `[transport]` table of the gateway settings.
//!
//! ```toml
//! [transport]
//! base_url = "https://secure.viabill.com"
//! test_base_url = "https://sandbox.viabill.example"
//! timeout_secs = 30
//! http_version = "http1"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GatewayError, Result};

/// Production gateway base URL.
pub const DEFAULT_BASE_URL: &str = "https://secure.viabill.com";

/// HTTP transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Gateway base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL used instead of `base_url` for test-mode requests.
    #[serde(default)]
    pub test_base_url: Option<String>,

    /// Maximum idle connections per host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// HTTP version preference.
    #[serde(default)]
    pub http_version: HttpVersion,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            test_base_url: None,
            pool_max_idle_per_host: default_pool_max_idle(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            http_version: HttpVersion::default(),
        }
    }
}

impl HttpConfig {
    /// Validates base URLs and timeout bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if:
    /// - a base URL is not HTTPS or points at a loopback host
    /// - `timeout_secs` is outside 1-300
    /// - `connect_timeout_secs` is outside 1-60
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.base_url)?;
        if let Some(ref test_base_url) = self.test_base_url {
            validate_base_url(test_base_url)?;
        }

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(GatewayError::Config("timeout_secs must be between 1 and 300".to_owned()));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(GatewayError::Config(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        Ok(())
    }

    /// Base URL for a request in the given mode.
    #[must_use]
    pub fn base_url_for(&self, test_mode: bool) -> &str {
        match self.test_base_url {
            Some(ref test_base_url) if test_mode => test_base_url,
            _ => &self.base_url,
        }
    }

    /// Returns timeout as Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns connect timeout as Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// HTTP version preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 only (requires prior knowledge or ALPN negotiation).
    Http2,
    /// Auto-negotiate (prefer HTTP/2, fall back to HTTP/1.1).
    #[default]
    Auto,
}

/// Checks that a base URL is HTTPS and not a loopback host.
pub(crate) fn validate_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| GatewayError::Config(format!("invalid base URL '{base_url}': {e}")))?;

    if url.scheme() != "https" {
        return Err(GatewayError::Config(format!("base URL must use HTTPS, got: {}", url.scheme())));
    }

    if let Some(host) = url.host_str() {
        let host = host.to_lowercase();
        if host == "localhost" || host == "::1" || host == "[::1]" || host.starts_with("127.") {
            return Err(GatewayError::Config(format!(
                "base URL must not be localhost or loopback: {host}"
            )));
        }
    }

    Ok(url)
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_pool_max_idle() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}
