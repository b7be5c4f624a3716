//! Endpoint registry.
//!
//! Declarative metadata for every gateway operation: path, HTTP method, the
//! ordered required and optional fields, signature templates and the
//! status-code message table. The bundled ViaBill table lives in
//! `endpoints.toml` and is parsed once per process.

pub mod iso;

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
    sync::LazyLock,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{GatewayError, Result},
    signature::SignatureTemplate,
};

const BUNDLED_ENDPOINTS: &str = include_str!("endpoints.toml");

static BUILTIN_REGISTRY: LazyLock<EndpointRegistry> = LazyLock::new(|| {
    EndpointRegistry::from_toml(BUNDLED_ENDPOINTS).expect("bundled endpoint table is valid")
});

/// HTTP method of a gateway endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`, payload travels as query parameters.
    Get,
    /// `POST`, payload travels as a JSON body.
    Post,
}

impl HttpMethod {
    /// Returns the method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway operations known to the bundled registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Merchant account login.
    Login,
    /// Merchant account registration.
    Registration,
    /// Link to the merchant's "My ViaBill" page.
    MyViabill,
    /// Merchant notifications.
    Notifications,
    /// Checkout session creation.
    Checkout,
    /// Capture an authorized transaction.
    CaptureTransaction,
    /// Refund a captured transaction.
    RefundTransaction,
    /// Cancel an authorized transaction.
    CancelTransaction,
}

impl Endpoint {
    /// Every bundled endpoint.
    pub const ALL: [Self; 8] = [
        Self::Login,
        Self::Registration,
        Self::MyViabill,
        Self::Notifications,
        Self::Checkout,
        Self::CaptureTransaction,
        Self::RefundTransaction,
        Self::CancelTransaction,
    ];

    /// Registry key of this endpoint.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Registration => "registration",
            Self::MyViabill => "myviabill",
            Self::Notifications => "notifications",
            Self::Checkout => "checkout",
            Self::CaptureTransaction => "capture_transaction",
            Self::RefundTransaction => "refund_transaction",
            Self::CancelTransaction => "cancel_transaction",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == s)
            .ok_or_else(|| GatewayError::UnknownEndpoint(s.to_owned()))
    }
}

/// Metadata describing one gateway operation's request shape and status
/// semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDefinition {
    /// Registry key.
    pub name: String,
    /// Request path relative to the gateway base URL.
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Fields that must resolve, in wire order.
    pub required_fields: Vec<String>,
    /// Fields copied through when the caller supplies them.
    pub optional_fields: Vec<String>,
    /// Field name to signature template.
    pub signature_templates: BTreeMap<String, String>,
    /// Status code to human-readable message.
    pub status_messages: BTreeMap<u16, String>,
}

impl EndpointDefinition {
    /// Returns the signature template for `field`, if the field is signed.
    #[must_use]
    pub fn signature_template(&self, field: &str) -> Option<&str> {
        self.signature_templates.get(field).map(String::as_str)
    }

    /// Returns the message for `status`, or an empty string when the code is
    /// not listed.
    #[must_use]
    pub fn status_message(&self, status: u16) -> &str {
        self.status_messages.get(&status).map_or("", String::as_str)
    }

    /// Returns true when `field` is required by this endpoint.
    #[must_use]
    pub fn requires(&self, field: &str) -> bool {
        self.required_fields.iter().any(|f| f == field)
    }

    fn validate(&self) -> Result<()> {
        validate_endpoint_path(&self.name, &self.path)?;

        for (field, template) in &self.signature_templates {
            if !self.requires(field) {
                return Err(GatewayError::Config(format!(
                    "endpoint '{}' signs field '{field}' which is not a required field",
                    self.name
                )));
            }
            SignatureTemplate::parse(template)?;
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct RawEndpoint {
    path: String,
    method: HttpMethod,
    required_fields: Vec<String>,
    #[serde(default)]
    optional_fields: Vec<String>,
    #[serde(default)]
    signature_templates: BTreeMap<String, String>,
    #[serde(default)]
    status_messages: BTreeMap<String, String>,
}

impl RawEndpoint {
    fn into_definition(self, name: String) -> Result<EndpointDefinition> {
        let status_messages = self
            .status_messages
            .into_iter()
            .map(|(code, message)| {
                code.parse::<u16>().map(|code| (code, message)).map_err(|_| {
                    GatewayError::Config(format!(
                        "endpoint '{name}' has a non-numeric status code: {code}"
                    ))
                })
            })
            .collect::<Result<_>>()?;

        Ok(EndpointDefinition {
            name,
            path: self.path,
            method: self.method,
            required_fields: self.required_fields,
            optional_fields: self.optional_fields,
            signature_templates: self.signature_templates,
            status_messages,
        })
    }
}

/// Read-only lookup table of endpoint definitions.
///
/// # Examples
///
/// ```
/// use viabill_gateway::registry::{EndpointRegistry, HttpMethod};
///
/// let registry = EndpointRegistry::builtin();
/// let checkout = registry.lookup("checkout").unwrap();
/// assert_eq!(checkout.method, HttpMethod::Post);
/// assert!(checkout.signature_template("md5check").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, EndpointDefinition>,
}

impl EndpointRegistry {
    /// Returns the bundled ViaBill registry.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN_REGISTRY
    }

    /// Parses and validates a registry from TOML, one table per endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the TOML is malformed, a path is
    /// unsafe, a status code is not numeric, or a signed field is not
    /// required. Template parse errors are returned as is.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawEndpoint> = toml::from_str(toml_str)
            .map_err(|e| GatewayError::Config(format!("invalid endpoint table: {e}")))?;

        let endpoints = raw
            .into_iter()
            .map(|(name, raw)| {
                let definition = raw.into_definition(name.clone())?;
                definition.validate()?;
                Ok((name, definition))
            })
            .collect::<Result<_>>()?;

        Ok(Self { endpoints })
    }

    /// Looks up an endpoint by name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownEndpoint`] if no such endpoint exists.
    pub fn lookup(&self, name: &str) -> Result<&EndpointDefinition> {
        self.endpoints.get(name).ok_or_else(|| GatewayError::UnknownEndpoint(name.to_owned()))
    }

    /// Looks up a bundled endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownEndpoint`] if a custom registry lacks it.
    pub fn get(&self, endpoint: Endpoint) -> Result<&EndpointDefinition> {
        self.lookup(endpoint.name())
    }

    /// Returns the status message for `status` on `endpoint`, or an empty
    /// string if either is unknown.
    #[must_use]
    pub fn status_message(&self, endpoint: &str, status: u16) -> &str {
        self.endpoints.get(endpoint).map_or("", |definition| definition.status_message(status))
    }

    /// Endpoint names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Returns a copy of this registry with some endpoint paths replaced.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownEndpoint`] for overrides naming a
    /// missing endpoint and [`GatewayError::Config`] for unsafe paths.
    pub fn with_path_overrides(&self, overrides: &HashMap<String, String>) -> Result<Self> {
        let mut registry = self.clone();
        for (name, path) in overrides {
            validate_endpoint_path(name, path)?;
            let definition = registry
                .endpoints
                .get_mut(name)
                .ok_or_else(|| GatewayError::UnknownEndpoint(name.clone()))?;
            definition.path.clone_from(path);
        }
        Ok(registry)
    }
}

/// Validates an endpoint path.
///
/// Paths must start with `/` and must not contain `..` or `//`.
pub(crate) fn validate_endpoint_path(name: &str, path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(GatewayError::Config(format!(
            "endpoint '{name}' contains path traversal sequence '..': {path}"
        )));
    }

    if path.contains("//") {
        return Err(GatewayError::Config(format!(
            "endpoint '{name}' contains double slash '//': {path}"
        )));
    }

    if !path.starts_with('/') {
        return Err(GatewayError::Config(format!("endpoint '{name}' must start with '/': {path}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_every_endpoint() {
        let registry = EndpointRegistry::builtin();
        for endpoint in Endpoint::ALL {
            assert!(registry.get(endpoint).is_ok(), "missing {endpoint}");
        }
        assert_eq!(registry.names().count(), Endpoint::ALL.len());
    }

    #[test]
    fn test_lookup_unknown_endpoint() {
        let result = EndpointRegistry::builtin().lookup("authorize");
        assert!(matches!(result, Err(GatewayError::UnknownEndpoint(name)) if name == "authorize"));
    }

    #[test]
    fn test_checkout_definition() {
        let checkout = EndpointRegistry::builtin().get(Endpoint::Checkout).unwrap();
        assert_eq!(checkout.path, "/api/checkout-authorize/addon/drupal");
        assert_eq!(checkout.method, HttpMethod::Post);
        assert_eq!(checkout.required_fields.first().map(String::as_str), Some("protocol"));
        assert_eq!(checkout.required_fields.last().map(String::as_str), Some("md5check"));
        assert!(checkout.requires("test"));
        assert_eq!(
            checkout.signature_template("md5check"),
            Some(
                "{apikey}#{amount}#{currency}#{transaction}#{order_number}#{success_url}#{cancel_url}#{secret}"
            )
        );
    }

    #[test]
    fn test_transaction_definitions_share_shape() {
        let registry = EndpointRegistry::builtin();
        let capture = registry.get(Endpoint::CaptureTransaction).unwrap();
        let refund = registry.get(Endpoint::RefundTransaction).unwrap();
        let cancel = registry.get(Endpoint::CancelTransaction).unwrap();

        assert_eq!(capture.required_fields, refund.required_fields);
        assert_eq!(capture.signature_templates, refund.signature_templates);
        assert_eq!(cancel.signature_template("signature"), Some("{id}#{apikey}#{secret}"));
    }

    #[test]
    fn test_get_endpoints_use_get() {
        let registry = EndpointRegistry::builtin();
        assert_eq!(registry.get(Endpoint::MyViabill).unwrap().method, HttpMethod::Get);
        assert_eq!(registry.get(Endpoint::Notifications).unwrap().method, HttpMethod::Get);
    }

    #[test]
    fn test_status_message_lookup() {
        let registry = EndpointRegistry::builtin();
        assert_eq!(
            registry.status_message("checkout", 302),
            "Redirect to the ViaBill payment window"
        );
        assert_eq!(registry.status_message("checkout", 418), "");
        assert_eq!(registry.status_message("nope", 200), "");
    }

    #[test]
    fn test_endpoint_from_str() {
        assert_eq!("capture_transaction".parse::<Endpoint>().unwrap(), Endpoint::CaptureTransaction);
        assert!("capture".parse::<Endpoint>().is_err());
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.to_string().parse::<Endpoint>().unwrap(), endpoint);
        }
    }

    #[test]
    fn test_from_toml_custom_registry() {
        let toml = r#"
            [ping]
            path = "/api/ping"
            method = "GET"
            required_fields = ["key", "signature"]

            [ping.signature_templates]
            signature = "{key}#{secret}"

            [ping.status_messages]
            200 = "pong"
        "#;

        let registry = EndpointRegistry::from_toml(toml).unwrap();
        let ping = registry.lookup("ping").unwrap();
        assert!(ping.optional_fields.is_empty());
        assert_eq!(ping.status_message(200), "pong");
    }

    #[test]
    fn test_from_toml_rejects_unrequired_signed_field() {
        let toml = r#"
            [ping]
            path = "/api/ping"
            method = "GET"
            required_fields = ["key"]

            [ping.signature_templates]
            signature = "{key}#{secret}"
        "#;

        let result = EndpointRegistry::from_toml(toml);
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_from_toml_rejects_template_without_placeholders() {
        let toml = r#"
            [ping]
            path = "/api/ping"
            method = "GET"
            required_fields = ["signature"]

            [ping.signature_templates]
            signature = "static"
        "#;

        let result = EndpointRegistry::from_toml(toml);
        assert!(matches!(result, Err(GatewayError::EmptyFormat(_))));
    }

    #[test]
    fn test_from_toml_rejects_bad_status_code() {
        let toml = r#"
            [ping]
            path = "/api/ping"
            method = "GET"
            required_fields = []

            [ping.status_messages]
            ok = "pong"
        "#;

        assert!(matches!(EndpointRegistry::from_toml(toml), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_from_toml_rejects_unknown_method() {
        let toml = r#"
            [ping]
            path = "/api/ping"
            method = "PATCH"
            required_fields = []
        "#;

        assert!(matches!(EndpointRegistry::from_toml(toml), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_path_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("checkout".to_owned(), "/api/checkout-authorize/addon/custom".to_owned());

        let registry = EndpointRegistry::builtin().with_path_overrides(&overrides).unwrap();
        assert_eq!(registry.lookup("checkout").unwrap().path, "/api/checkout-authorize/addon/custom");
        assert_eq!(registry.lookup("login").unwrap().path, "/api/addon/drupal/login");
        // builtin stays untouched
        assert_eq!(
            EndpointRegistry::builtin().lookup("checkout").unwrap().path,
            "/api/checkout-authorize/addon/drupal"
        );
    }

    #[test]
    fn test_path_override_unknown_endpoint() {
        let mut overrides = HashMap::new();
        overrides.insert("authorize".to_owned(), "/api/authorize".to_owned());

        let result = EndpointRegistry::builtin().with_path_overrides(&overrides);
        assert!(matches!(result, Err(GatewayError::UnknownEndpoint(_))));
    }

    #[test]
    fn test_validate_endpoint_path() {
        assert!(validate_endpoint_path("login", "/api/login").is_ok());
        assert!(validate_endpoint_path("login", "/api/../admin").is_err());
        assert!(validate_endpoint_path("login", "/api//login").is_err());
        assert!(validate_endpoint_path("login", "api/login").is_err());
    }
}
