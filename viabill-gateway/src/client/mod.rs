//! Gateway client.
//!
//! One method per gateway capability. Every call follows the same path:
//! registry lookup, request build, one transport round trip, then
//! interpretation of the response into a typed outcome.
//!
//! # Examples
//!
//! ```rust,no_run
//! use serde_json::json;
//! use viabill_gateway::{GatewayClient, config::GatewaySettings, transport::HttpTransport};
//!
//! # async fn example() -> viabill_gateway::Result<()> {
//! let settings = GatewaySettings::from_env()?;
//! let client = GatewayClient::from_settings(HttpTransport::with_config(&settings.transport)?, &settings)?;
//!
//! let data = json!({
//!     "transaction": "vb-1001-a1b2c3d4e5",
//!     "order_number": "1001",
//!     "amount": "249.00",
//!     "currency": "DKK",
//!     "success_url": "https://shop.example/checkout/complete",
//!     "cancel_url": "https://shop.example/checkout/cancel",
//!     "callback_url": "https://shop.example/viabill/callback",
//! });
//!
//! let outcome = client.checkout(data.as_object().unwrap()).await?;
//! if let Some(url) = outcome.redirect_url() {
//!     println!("redirect customer to {url}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod outcome;

use std::borrow::Cow;

use serde_json::Value;
use tracing::{Span, debug, info, instrument, warn};

pub use outcome::{
    ALREADY_MADE_MESSAGE, CheckoutOutcome, MyViabillLink, Notifications, TransactionOutcome,
    UNANSWERED_MESSAGE, UNANSWERED_STATUS,
};

use crate::{
    builder::{CallData, RequestBuilder},
    config::{ConfigProvider, GatewaySettings, TransactionType},
    context::RequestContext,
    error::{GatewayError, Result},
    registry::{Endpoint, EndpointRegistry},
    signature::SignatureEngine,
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Orchestrates gateway operations over a [`Transport`].
///
/// Holds only immutable data plus the transport, so a shared reference can
/// be used from many tasks at once.
#[derive(Debug)]
pub struct GatewayClient<T: Transport> {
    transport: T,
    registry: Cow<'static, EndpointRegistry>,
    context: RequestContext,
    transaction_type: TransactionType,
    headers: Vec<(String, String)>,
}

impl<T: Transport> GatewayClient<T> {
    /// Creates a client over the bundled endpoint registry.
    ///
    /// The provider is queried once, here.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the provider reports an unknown
    /// transaction type. An empty transaction type means
    /// [`TransactionType::Authorize`].
    pub fn new<P: ConfigProvider + ?Sized>(transport: T, provider: &P) -> Result<Self> {
        let transaction_type = match provider.transaction_type().trim() {
            "" => TransactionType::default(),
            configured => configured.parse()?,
        };

        let context = RequestContext::from_provider(provider);
        if !context.has_api_key() || !context.has_api_secret() {
            warn!(
                api_key = context.has_api_key(),
                api_secret = context.has_api_secret(),
                "gateway credentials are incomplete, signed calls will fail"
            );
        }

        Ok(Self {
            transport,
            registry: Cow::Borrowed(EndpointRegistry::builtin()),
            context,
            transaction_type,
            headers: Vec::new(),
        })
    }

    /// Creates a client from settings, applying their endpoint overrides.
    ///
    /// # Errors
    ///
    /// Returns error if the settings fail validation.
    pub fn from_settings(transport: T, settings: &GatewaySettings) -> Result<Self> {
        settings.validate()?;
        let registry = settings.registry()?;
        Ok(Self::new(transport, settings)?.with_registry(registry))
    }

    /// Replaces the endpoint registry.
    #[must_use]
    pub fn with_registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = Cow::Owned(registry);
        self
    }

    /// Adds a header sent with every call.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Request context built from the provider.
    #[must_use]
    pub const fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Endpoint registry in use.
    #[must_use]
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Configured transaction type.
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Status table message for `endpoint`, empty if the code is not listed.
    #[must_use]
    pub fn status_message(&self, endpoint: Endpoint, status: u16) -> &str {
        self.registry.status_message(endpoint.name(), status)
    }

    /// Signature engine bound to this client's credentials.
    #[must_use]
    pub const fn signature_engine(&self) -> SignatureEngine<'_> {
        SignatureEngine::new(&self.context)
    }

    /// Logs a merchant in.
    ///
    /// Returns every field of the gateway's JSON answer.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::EmptyResponse`] for an empty body
    /// - [`GatewayError::Gateway`] carrying the first reported error
    /// - [`GatewayError::InvalidResponse`] if the body is not a JSON object
    /// - build and transport errors
    #[instrument(skip(self, data), fields(endpoint = %Endpoint::Login))]
    pub async fn login(&self, data: &CallData) -> Result<CallData> {
        let response = self.dispatch(Endpoint::Login, data, true).await?;
        parse_account_response(&response.body, "login")
    }

    /// Registers a merchant account.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    #[instrument(skip(self, data), fields(endpoint = %Endpoint::Registration))]
    pub async fn register(&self, data: &CallData) -> Result<CallData> {
        let response = self.dispatch(Endpoint::Registration, data, true).await?;
        parse_account_response(&response.body, "registration")
    }

    /// Creates a checkout session.
    ///
    /// The protocol version is stamped into the call data and redirects are
    /// not followed, so the payment window URL can be read from `Location`.
    ///
    /// # Errors
    ///
    /// Build and transport errors. Gateway-level results are
    /// [`CheckoutOutcome`] values.
    #[instrument(skip(self, data), fields(endpoint = %Endpoint::Checkout))]
    pub async fn checkout(&self, data: &CallData) -> Result<CheckoutOutcome> {
        let mut input_data = data.clone();
        input_data.insert(
            "protocol".to_owned(),
            Value::String(self.context.protocol_version().to_owned()),
        );

        let response = self.dispatch(Endpoint::Checkout, &input_data, false).await?;

        if response.is_empty() {
            warn!("checkout produced no response");
            return Ok(CheckoutOutcome::Unanswered {
                status: UNANSWERED_STATUS,
                message: UNANSWERED_MESSAGE.to_owned(),
                input_data,
            });
        }

        let redirect_url = match response.status {
            301 | 302 => response.header("Location").filter(|url| !url.is_empty()),
            _ => None,
        };

        let Some(redirect_url) = redirect_url else {
            info!(status = response.status, "checkout answered without redirect");
            return Ok(CheckoutOutcome::AlreadyMade);
        };

        info!(status = response.status, "checkout session created");
        Ok(CheckoutOutcome::Redirect {
            redirect_url: redirect_url.to_owned(),
            status: response.status,
            message: self.status_message(Endpoint::Checkout, response.status).to_owned(),
            input_data,
        })
    }

    /// Captures an authorized transaction.
    ///
    /// # Errors
    ///
    /// Build and transport errors.
    pub async fn capture(&self, data: &CallData, verbose: bool) -> Result<TransactionOutcome> {
        self.transaction(Endpoint::CaptureTransaction, data, verbose).await
    }

    /// Refunds a captured transaction.
    ///
    /// # Errors
    ///
    /// Build and transport errors.
    pub async fn refund(&self, data: &CallData, verbose: bool) -> Result<TransactionOutcome> {
        self.transaction(Endpoint::RefundTransaction, data, verbose).await
    }

    /// Cancels an authorized transaction.
    ///
    /// # Errors
    ///
    /// Build and transport errors.
    pub async fn cancel(&self, data: &CallData, verbose: bool) -> Result<TransactionOutcome> {
        self.transaction(Endpoint::CancelTransaction, data, verbose).await
    }

    /// Fetches the link to the merchant's "My ViaBill" page.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::EmptyResponse`] for an empty body
    /// - [`GatewayError::Gateway`] carrying the first reported error
    /// - [`GatewayError::InvalidResponse`] if the body is not JSON
    /// - build and transport errors
    #[instrument(skip(self, data), fields(endpoint = %Endpoint::MyViabill))]
    pub async fn my_viabill(&self, data: &CallData) -> Result<MyViabillLink> {
        let response = self.dispatch(Endpoint::MyViabill, data, true).await?;
        let body = parse_json_body(&response.body, "myViabill")?;
        let url = body.get("url").and_then(Value::as_str).map(str::to_owned);
        Ok(MyViabillLink { url })
    }

    /// Fetches merchant notifications.
    ///
    /// # Errors
    ///
    /// Same as [`my_viabill`](Self::my_viabill).
    #[instrument(skip(self, data), fields(endpoint = %Endpoint::Notifications))]
    pub async fn notifications(&self, data: &CallData) -> Result<Notifications> {
        let response = self.dispatch(Endpoint::Notifications, data, true).await?;
        let body = parse_json_body(&response.body, "notifications")?;
        let messages = body.get("messages").filter(|messages| !messages.is_null()).cloned();
        Ok(Notifications { messages })
    }

    /// Lenient callback verification with this client's secret.
    ///
    /// A blank `template` selects the default callback template.
    ///
    /// # Errors
    ///
    /// See [`SignatureEngine::verify`].
    pub fn verify_callback(&self, payload: &CallData, template: &str) -> Result<bool> {
        self.signature_engine().verify(payload, template)
    }

    /// Strict callback verification with this client's secret.
    ///
    /// # Errors
    ///
    /// See [`SignatureEngine::verify_strict`].
    pub fn verify_callback_strict(&self, payload: &CallData, template: &str) -> Result<()> {
        self.signature_engine().verify_strict(payload, template)
    }

    #[instrument(skip_all, fields(endpoint = %endpoint, forced, verbose))]
    async fn transaction(
        &self,
        endpoint: Endpoint,
        data: &CallData,
        verbose: bool,
    ) -> Result<TransactionOutcome> {
        let forced = !data.contains_key("apikey");
        Span::current().record("forced", forced);

        let response = self.dispatch(endpoint, data, true).await?;

        if verbose {
            return Ok(TransactionOutcome::Verbose(response));
        }
        if response.is_success() {
            info!(status = response.status, "transaction approved");
            return Ok(TransactionOutcome::Approved);
        }

        warn!(status = response.status, "transaction rejected");
        Ok(TransactionOutcome::Rejected { status: response.status, body: response.body })
    }

    async fn dispatch(
        &self,
        endpoint: Endpoint,
        data: &CallData,
        follow_redirects: bool,
    ) -> Result<TransportResponse> {
        let definition = self.registry.get(endpoint)?;
        let engine = self.signature_engine();
        let envelope = RequestBuilder::build(definition, data, &engine)?;

        let mut request = TransportRequest::from_envelope(&envelope, self.context.test_mode());
        if !follow_redirects {
            request = request.without_redirects();
        }
        request.headers = self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        debug!(
            method = %envelope.method,
            path = %envelope.path,
            protocol = self.transport.protocol_name(),
            "dispatching gateway request"
        );

        match self.transport.send(request).await {
            Ok(response) => {
                debug!(status = response.status, "gateway request completed");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "gateway request failed");
                Err(e)
            }
        }
    }
}

/// Parses a JSON body, mapping emptiness and reported errors.
fn parse_json_body(body: &str, operation: &'static str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(GatewayError::EmptyResponse { operation });
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("{operation}: {e}")))?;

    if let Some(errors) = value.get("errors") {
        return Err(GatewayError::Gateway(first_error(errors)));
    }

    Ok(value)
}

fn parse_account_response(body: &str, operation: &'static str) -> Result<CallData> {
    match parse_json_body(body, operation)? {
        Value::Object(fields) => Ok(fields),
        other => Err(GatewayError::InvalidResponse(format!(
            "{operation}: expected a JSON object, got {other}"
        ))),
    }
}

fn first_error(errors: &Value) -> String {
    errors
        .get(0)
        .and_then(|first| first.get("error"))
        .and_then(Value::as_str)
        .map_or_else(|| errors.to_string(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_json_body_empty() {
        let result = parse_json_body("  \n", "myViabill");
        assert!(matches!(result, Err(GatewayError::EmptyResponse { operation: "myViabill" })));
    }

    #[test]
    fn test_parse_json_body_reported_error() {
        let body = r#"{"errors":[{"field":"email","error":"Email already registered"},{"error":"second"}]}"#;
        let result = parse_json_body(body, "registration");
        assert!(matches!(result, Err(GatewayError::Gateway(message)) if message == "Email already registered"));
    }

    #[test]
    fn test_parse_json_body_unusual_errors_shape() {
        let result = parse_json_body(r#"{"errors":"denied"}"#, "login");
        assert!(matches!(result, Err(GatewayError::Gateway(message)) if message == "\"denied\""));
    }

    #[test]
    fn test_parse_json_body_invalid_json() {
        let result = parse_json_body("<html>", "login");
        assert!(matches!(result, Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_account_response_object() {
        let fields = parse_account_response(r#"{"key":"k","secret":"s","pricetagScript":"<script/>"}"#, "login")
            .unwrap();
        assert_eq!(fields.get("key"), Some(&json!("k")));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_parse_account_response_non_object() {
        let result = parse_account_response("[1,2]", "login");
        assert!(matches!(result, Err(GatewayError::InvalidResponse(_))));
    }
}
