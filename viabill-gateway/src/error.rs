//! Error types for the ViaBill gateway bridge.
//!
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Build Errors** ([`GatewayError::MissingRequiredField`],
//!   [`GatewayError::UnresolvedField`], [`GatewayError::EmptyFormat`]): the call data does
//!   not satisfy the endpoint definition. Nothing was sent.
//! - **Configuration Errors** ([`GatewayError::MissingApiKey`],
//!   [`GatewayError::MissingSecret`], [`GatewayError::Config`]): the host application did
//!   not finish its setup.
//! - **Verification Errors** ([`GatewayError::MissingSignature`],
//!   [`GatewayError::SignatureMismatch`]): callback payload authentication failures
//! - **Gateway Errors** ([`GatewayError::EmptyResponse`], [`GatewayError::Gateway`],
//!   [`GatewayError::InvalidResponse`]): the gateway answered, but not with a usable result
//! - **Transport Errors** ([`GatewayError::Transport`], [`GatewayError::Http`]): the request
//!   never completed
//!
//! # Examples
//!
//! ```
//! use viabill_gateway::error::{GatewayError, Result};
//!
//! fn require_order(data: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
//!     if !data.contains_key("order_number") {
//!         return Err(GatewayError::MissingRequiredField("order_number".to_owned()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while building, signing, dispatching or interpreting
/// a gateway request.
///
/// # Error Recovery
///
/// - **Build errors**: fix the call data and call again
/// - **Configuration errors** ([`is_configuration_error`](Self::is_configuration_error)):
///   complete the gateway settings (API key and secret) before issuing calls
/// - **Gateway errors**: surface the message to the merchant; the gateway has
///   already seen the request
/// - **Transport errors**: the caller decides whether to retry; the bridge never does
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No endpoint with this name exists in the registry.
    #[error("unknown gateway endpoint: {0}")]
    UnknownEndpoint(String),

    /// A required field of the endpoint definition could not be resolved.
    ///
    /// The build aborts as a whole; no partial envelope is produced and no
    /// request is sent.
    #[error("data is missing required field: {0}")]
    MissingRequiredField(String),

    /// A signature template references a field that is neither in the call
    /// data nor one of the reserved names.
    #[error("data is missing a required signature field: {0}")]
    UnresolvedField(String),

    /// A signature template contains no `{placeholder}` at all.
    #[error("invalid format string, format does not contain any fields: {0:?}")]
    EmptyFormat(String),

    /// A template needs the API key but none is configured.
    ///
    /// # Recovery
    ///
    /// Set `api_key` in the gateway settings (or `VIABILL_API_KEY`).
    #[error("the API key must be configured before signing requests")]
    MissingApiKey,

    /// A template needs the API secret but none is configured.
    ///
    /// # Recovery
    ///
    /// Set `api_secret` in the gateway settings (or `VIABILL_API_SECRET`).
    #[error("the API secret must be configured before signing requests")]
    MissingSecret,

    /// Callback payload has no `signature` field.
    #[error("callback data is missing a \"signature\" key")]
    MissingSignature,

    /// Callback signature does not match the locally computed one.
    #[error("expected signature [{expected}] but got signature [{actual}]")]
    SignatureMismatch {
        /// Signature carried by the payload.
        expected: String,
        /// Signature computed from the payload fields.
        actual: String,
    },

    /// Value is not an ISO 3166-1 alpha-2 country code.
    ///
    /// Only produced by the strict
    /// [`validate_country`](crate::registry::iso::validate_country); request
    /// building passes unknown codes through unchanged.
    #[error("value {0} is not a valid ISO 3166-1 alpha 2 country code")]
    InvalidCountryCode(String),

    /// The gateway returned an empty body.
    #[error("{operation} returned an empty response!")]
    EmptyResponse {
        /// Operation name as the gateway integration reports it.
        operation: &'static str,
    },

    /// The gateway reported an error in its `errors` array.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// The gateway body could not be interpreted.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    /// The transport could not complete the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`] from [`HttpTransport`](crate::transport::HttpTransport):
    /// timeouts, refused connections, DNS and TLS failures.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway settings are invalid.
    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Returns true when the error means the host application has not
    /// completed its setup (credentials missing).
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::MissingSecret | Self::Config(_))
    }

    /// Returns true for errors raised before anything was sent.
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEndpoint(_)
                | Self::MissingRequiredField(_)
                | Self::UnresolvedField(_)
                | Self::EmptyFormat(_)
                | Self::MissingApiKey
                | Self::MissingSecret
        )
    }
}
