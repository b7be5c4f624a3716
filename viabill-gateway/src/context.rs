//! Per-client request context.

use std::fmt;

use crate::{
    config::ConfigProvider,
    error::{GatewayError, Result},
};

/// Gateway protocol version stamped into every request that declares a
/// `protocol` field.
pub const PROTOCOL_VERSION: &str = "3.0";

/// Credentials and mode shared by every call of one client.
///
/// Built once from a [`ConfigProvider`] and never mutated afterwards. Empty
/// credential strings count as unset.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestContext {
    api_key: Option<String>,
    api_secret: Option<String>,
    test_mode: bool,
}

impl RequestContext {
    /// Creates a context from explicit values.
    ///
    /// # Examples
    ///
    /// ```
    /// use viabill_gateway::RequestContext;
    ///
    /// let ctx = RequestContext::new("key-123", "", true);
    /// assert_eq!(ctx.api_key().unwrap(), "key-123");
    /// assert!(ctx.api_secret().is_err());
    /// ```
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>, test_mode: bool) -> Self {
        Self { api_key: non_empty(api_key.into()), api_secret: non_empty(api_secret.into()), test_mode }
    }

    /// Queries the provider once and captures its answers.
    #[must_use]
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Self {
        Self::new(provider.api_key(), provider.secret_key(), provider.test_mode())
    }

    /// Returns the API key.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingApiKey`] if no key is configured.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)
    }

    /// Returns the API secret.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingSecret`] if no secret is configured.
    pub fn api_secret(&self) -> Result<&str> {
        self.api_secret.as_deref().ok_or(GatewayError::MissingSecret)
    }

    /// Returns true if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns true if an API secret is configured.
    #[must_use]
    pub const fn has_api_secret(&self) -> bool {
        self.api_secret.is_some()
    }

    /// Sandbox flag.
    #[must_use]
    pub const fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Wire form of the sandbox flag.
    #[must_use]
    pub const fn test_mode_str(&self) -> &'static str {
        if self.test_mode { "true" } else { "false" }
    }

    /// Protocol version constant.
    #[must_use]
    pub const fn protocol_version(&self) -> &'static str {
        PROTOCOL_VERSION
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("test_mode", &self.test_mode)
            .finish()
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_are_unset() {
        let ctx = RequestContext::new("", "  ", false);
        assert!(matches!(ctx.api_key(), Err(GatewayError::MissingApiKey)));
        assert!(matches!(ctx.api_secret(), Err(GatewayError::MissingSecret)));
        assert!(!ctx.has_api_key());
        assert!(!ctx.has_api_secret());
    }

    #[test]
    fn test_test_mode_str() {
        assert_eq!(RequestContext::new("k", "s", true).test_mode_str(), "true");
        assert_eq!(RequestContext::new("k", "s", false).test_mode_str(), "false");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let ctx = RequestContext::new("key-1", "super-secret", true);
        let debug_str = format!("{ctx:?}");
        assert!(debug_str.contains("key-1"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret"));
    }

    #[test]
    fn test_protocol_version() {
        assert_eq!(RequestContext::new("k", "s", false).protocol_version(), "3.0");
    }
}
