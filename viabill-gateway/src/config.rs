//! Gateway settings.
//!
//! The host application supplies credentials and mode through the
//! [`ConfigProvider`] trait. [`GatewaySettings`] is the bundled
//! implementation, loadable from TOML or from the environment:
//!
//! ```toml
//! api_key = "merchant-key"
//! api_secret = "merchant-secret"
//! test_mode = true
//! transaction_type = "authorize_capture"
//!
//! [endpoints]
//! checkout = "/api/checkout-authorize/addon/custom"
//!
//! [transport]
//! timeout_secs = 20
//! ```

use std::{collections::HashMap, fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{GatewayError, Result},
    helpers::parse_test_mode,
    registry::{EndpointRegistry, validate_endpoint_path},
    transport::HttpConfig,
};

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "VIABILL_API_KEY";
/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "VIABILL_API_SECRET";
/// Environment variable holding the test-mode flag.
pub const ENV_TEST_MODE: &str = "VIABILL_TEST_MODE";
/// Environment variable holding the transaction type.
pub const ENV_TRANSACTION_TYPE: &str = "VIABILL_TRANSACTION_TYPE";

/// Source of the host application's gateway configuration.
///
/// Queried once when a client is constructed.
pub trait ConfigProvider {
    /// Merchant API key, empty if unset.
    fn api_key(&self) -> String;

    /// Merchant API secret, empty if unset.
    fn secret_key(&self) -> String;

    /// Whether calls target the sandbox.
    fn test_mode(&self) -> bool;

    /// Configured transaction type, e.g. `authorize`.
    fn transaction_type(&self) -> String;
}

/// Whether an order is only authorized at checkout or captured immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Authorize at checkout, capture later.
    #[default]
    Authorize,
    /// Authorize and capture in one step.
    AuthorizeCapture,
}

impl TransactionType {
    /// Configuration token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authorize => "authorize",
            Self::AuthorizeCapture => "authorize_capture",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authorize" => Ok(Self::Authorize),
            "authorize_capture" => Ok(Self::AuthorizeCapture),
            other => Err(GatewayError::Config(format!("unknown transaction type: {other}"))),
        }
    }
}

/// Bundled [`ConfigProvider`] implementation.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Merchant API key.
    #[serde(default)]
    pub api_key: String,

    /// Merchant API secret.
    #[serde(default)]
    pub api_secret: String,

    /// Sandbox flag.
    #[serde(default)]
    pub test_mode: bool,

    /// Transaction type.
    #[serde(default)]
    pub transaction_type: TransactionType,

    /// Endpoint name to replacement path.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,

    /// HTTP transport settings.
    #[serde(default)]
    pub transport: HttpConfig,
}

impl GatewaySettings {
    /// Parses settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the TOML is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use viabill_gateway::config::{GatewaySettings, TransactionType};
    ///
    /// let settings = GatewaySettings::from_toml(r#"
    ///     api_key = "key"
    ///     api_secret = "secret"
    ///     transaction_type = "authorize_capture"
    /// "#).unwrap();
    ///
    /// assert_eq!(settings.transaction_type, TransactionType::AuthorizeCapture);
    /// assert!(settings.validate().is_ok());
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| GatewayError::Config(format!("invalid settings: {e}")))
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("cannot read settings file {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Reads settings from `VIABILL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for an unknown transaction type.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for an unknown transaction type.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(api_key) = lookup(ENV_API_KEY) {
            settings.api_key = api_key;
        }
        if let Some(api_secret) = lookup(ENV_API_SECRET) {
            settings.api_secret = api_secret;
        }
        if let Some(test_mode) = lookup(ENV_TEST_MODE) {
            settings.test_mode = parse_test_mode(&test_mode);
        }
        if let Some(transaction_type) = lookup(ENV_TRANSACTION_TYPE) {
            settings.transaction_type = transaction_type.parse()?;
        }
        Ok(settings)
    }

    /// Validates endpoint overrides and transport settings.
    ///
    /// Missing credentials are not a validation failure; calls that need them
    /// fail with [`GatewayError::MissingApiKey`] or
    /// [`GatewayError::MissingSecret`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for unsafe paths or transport
    /// settings and [`GatewayError::UnknownEndpoint`] for overrides naming an
    /// unknown endpoint.
    pub fn validate(&self) -> Result<()> {
        let registry = EndpointRegistry::builtin();
        for (name, path) in &self.endpoints {
            registry.lookup(name)?;
            validate_endpoint_path(name, path)?;
        }
        self.transport.validate()
    }

    /// Bundled registry with the configured path overrides applied.
    ///
    /// # Errors
    ///
    /// See [`EndpointRegistry::with_path_overrides`].
    pub fn registry(&self) -> Result<EndpointRegistry> {
        EndpointRegistry::builtin().with_path_overrides(&self.endpoints)
    }
}

impl ConfigProvider for GatewaySettings {
    fn api_key(&self) -> String {
        self.api_key.clone()
    }

    fn secret_key(&self) -> String {
        self.api_secret.clone()
    }

    fn test_mode(&self) -> bool {
        self.test_mode
    }

    fn transaction_type(&self) -> String {
        self.transaction_type.as_str().to_owned()
    }
}

impl fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("test_mode", &self.test_mode)
            .field("transaction_type", &self.transaction_type)
            .field("endpoints", &self.endpoints)
            .field("transport", &self.transport)
            .finish()
    }
}
