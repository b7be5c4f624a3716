//! Template rendering, request signing and callback verification.
//!
//! The gateway authenticates requests and callbacks with a digest over a
//! `#`-joined list of field values ending in the shared secret. Which fields,
//! in which order, is declared per endpoint as a template such as
//! `{id}#{apikey}#{amount}#{currency}#{secret}`.
//!
//! # Placeholder resolution
//!
//! For each placeholder, in order of appearance:
//!
//! 1. a field of the same name in the call data (`country` is normalized first)
//! 2. `secret` resolves to the configured API secret
//! 3. `key`, `apikey` and `apiKey` resolve to the configured API key
//! 4. `protocol` resolves to [`PROTOCOL_VERSION`](crate::context::PROTOCOL_VERSION)
//! 5. `test` resolves to the configured test-mode flag
//!
//! Anything else is [`GatewayError::UnresolvedField`].
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use viabill_gateway::{RequestContext, signature::{DEFAULT_CALLBACK_TEMPLATE, SignatureEngine}};
//!
//! # fn example() -> viabill_gateway::Result<()> {
//! let ctx = RequestContext::new("key-123", "shh", false);
//! let engine = SignatureEngine::new(&ctx);
//!
//! let data = json!({
//!     "transaction": "123",
//!     "orderNumber": "A1",
//!     "amount": "10.00",
//!     "currency": "USD",
//!     "status": "approved",
//!     "time": "2020-01-01",
//! });
//! let data = data.as_object().unwrap();
//!
//! let rendered = engine.render(DEFAULT_CALLBACK_TEMPLATE, data)?;
//! assert_eq!(rendered, "123#A1#10.00#USD#approved#2020-01-01#shh");
//! assert_eq!(engine.sign(DEFAULT_CALLBACK_TEMPLATE, data)?, "5c0ff1f562c6b0c7c1f32cf666e65a98");
//! # Ok(())
//! # }
//! ```

pub mod digest;
pub mod template;

#[cfg(test)]
#[path = "tests/proptest_signatures.rs"]
mod proptest_signatures;

use std::borrow::Cow;

use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

pub use digest::{Md5Digest, Sha256Digest, SignatureDigest};
pub use template::{Segment, SignatureTemplate};

use crate::{
    builder::CallData,
    context::RequestContext,
    error::{GatewayError, Result},
    registry::iso::normalize_country,
};

/// Template used to verify checkout callbacks when none is given.
pub const DEFAULT_CALLBACK_TEMPLATE: &str =
    "{transaction}#{orderNumber}#{amount}#{currency}#{status}#{time}#{secret}";

/// Field of a callback payload that carries its signature.
pub const SIGNATURE_FIELD: &str = "signature";

/// Placeholder names that resolve to the API key.
pub const API_KEY_NAMES: [&str; 3] = ["key", "apikey", "apiKey"];

/// Renders and signs templates against one request context.
#[derive(Debug, Clone)]
pub struct SignatureEngine<'a, D: SignatureDigest = Md5Digest> {
    context: &'a RequestContext,
    digest: D,
}

impl<'a> SignatureEngine<'a, Md5Digest> {
    /// Creates an engine using the gateway's MD5 wire format.
    #[must_use]
    pub const fn new(context: &'a RequestContext) -> Self {
        Self { context, digest: Md5Digest }
    }
}

impl<'a, D: SignatureDigest> SignatureEngine<'a, D> {
    /// Creates an engine with a different digest step.
    #[must_use]
    pub const fn with_digest(context: &'a RequestContext, digest: D) -> Self {
        Self { context, digest }
    }

    /// Request context the engine resolves reserved names from.
    #[must_use]
    pub const fn context(&self) -> &'a RequestContext {
        self.context
    }

    /// Digest step in use.
    #[must_use]
    pub const fn digest(&self) -> &D {
        &self.digest
    }

    /// Substitutes every placeholder of `template` and trims the result.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::EmptyFormat`] if the template has no placeholder
    /// - [`GatewayError::MissingSecret`] / [`GatewayError::MissingApiKey`] if a
    ///   reserved credential is referenced but not configured
    /// - [`GatewayError::UnresolvedField`] for any other unknown name
    pub fn render(&self, template: &str, data: &CallData) -> Result<String> {
        let template = SignatureTemplate::parse(template)?;
        self.render_template(&template, data)
    }

    /// Renders an already parsed template.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render).
    pub fn render_template(&self, template: &SignatureTemplate, data: &CallData) -> Result<String> {
        let mut rendered = String::new();
        for segment in template.segments() {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => rendered.push_str(&self.resolve(name, data)?),
            }
        }
        Ok(rendered.trim().to_owned())
    }

    /// Hex digest of the rendered template.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render).
    pub fn sign(&self, template: &str, data: &CallData) -> Result<String> {
        let rendered = self.render(template, data)?;
        Ok(self.digest.hex_digest(rendered.as_bytes()))
    }

    /// Lenient callback verification.
    ///
    /// Detaches the `signature` field, signs the remaining fields with
    /// `template` (the default callback template when `template` is blank)
    /// and compares in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingSignature`] if the payload has no
    /// signature, or any render error. A mismatch is `Ok(false)`.
    pub fn verify(&self, payload: &CallData, template: &str) -> Result<bool> {
        let (expected, actual) = self.expected_and_actual(payload, template)?;
        let matches: bool = expected.as_bytes().ct_eq(actual.as_bytes()).into();
        if !matches {
            debug!(algorithm = self.digest.algorithm(), "callback signature mismatch");
        }
        Ok(matches)
    }

    /// Strict callback verification.
    ///
    /// # Errors
    ///
    /// Same as [`verify`](Self::verify), plus
    /// [`GatewayError::SignatureMismatch`] when the signatures differ.
    pub fn verify_strict(&self, payload: &CallData, template: &str) -> Result<()> {
        let (expected, actual) = self.expected_and_actual(payload, template)?;
        if bool::from(expected.as_bytes().ct_eq(actual.as_bytes())) {
            Ok(())
        } else {
            warn!(algorithm = self.digest.algorithm(), "callback signature mismatch");
            Err(GatewayError::SignatureMismatch { expected, actual })
        }
    }

    fn expected_and_actual(&self, payload: &CallData, template: &str) -> Result<(String, String)> {
        let template = match template.trim() {
            "" => DEFAULT_CALLBACK_TEMPLATE,
            custom => custom,
        };

        let expected = payload
            .get(SIGNATURE_FIELD)
            .map(|value| render_value(value).into_owned())
            .ok_or(GatewayError::MissingSignature)?;

        let remaining: CallData = payload
            .iter()
            .filter(|(field, _)| field.as_str() != SIGNATURE_FIELD)
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        let actual = self.sign(template, &remaining)?;
        Ok((expected, actual))
    }

    fn resolve<'d>(&self, name: &str, data: &'d CallData) -> Result<Cow<'d, str>> {
        if let Some(value) = data.get(name) {
            let rendered = render_value(value);
            if name == "country" {
                return Ok(Cow::Owned(normalize_country(&rendered).into_owned()));
            }
            return Ok(rendered);
        }

        match name {
            "secret" => Ok(Cow::Owned(self.context.api_secret()?.to_owned())),
            _ if API_KEY_NAMES.contains(&name) => Ok(Cow::Owned(self.context.api_key()?.to_owned())),
            "protocol" => Ok(Cow::Borrowed(self.context.protocol_version())),
            "test" => Ok(Cow::Borrowed(self.context.test_mode_str())),
            _ => Err(GatewayError::UnresolvedField(name.to_owned())),
        }
    }
}

/// Textual form of a call-data value inside a rendered template.
///
/// Strings verbatim, booleans as `true`/`false`, null as empty, numbers and
/// nested values as compact JSON.
pub(crate) fn render_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Null => Cow::Borrowed(""),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> CallData {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test data must be an object"),
        }
    }

    fn callback_fields() -> CallData {
        data(json!({
            "transaction": "123",
            "orderNumber": "A1",
            "amount": "10.00",
            "currency": "USD",
            "status": "approved",
            "time": "2020-01-01",
        }))
    }

    #[test]
    fn test_render_default_template() {
        let ctx = RequestContext::new("key", "shh", false);
        let engine = SignatureEngine::new(&ctx);
        let rendered = engine.render(DEFAULT_CALLBACK_TEMPLATE, &callback_fields()).unwrap();
        assert_eq!(rendered, "123#A1#10.00#USD#approved#2020-01-01#shh");
    }

    #[test]
    fn test_sign_default_template_pinned_digest() {
        let ctx = RequestContext::new("key", "shh", false);
        let engine = SignatureEngine::new(&ctx);
        let digest = engine.sign(DEFAULT_CALLBACK_TEMPLATE, &callback_fields()).unwrap();
        assert_eq!(digest, "5c0ff1f562c6b0c7c1f32cf666e65a98");
        // deterministic
        assert_eq!(engine.sign(DEFAULT_CALLBACK_TEMPLATE, &callback_fields()).unwrap(), digest);
    }

    #[test]
    fn test_render_reserved_names() {
        let ctx = RequestContext::new("key-1", "s3cr3t", true);
        let engine = SignatureEngine::new(&ctx);
        let rendered = engine
            .render("{key}#{apikey}#{apiKey}#{protocol}#{test}#{secret}", &CallData::new())
            .unwrap();
        assert_eq!(rendered, "key-1#key-1#key-1#3.0#true#s3cr3t");
    }

    #[test]
    fn test_data_takes_precedence_over_reserved_names() {
        let ctx = RequestContext::new("configured-key", "s", false);
        let engine = SignatureEngine::new(&ctx);
        let rendered =
            engine.render("{apikey}#{test}", &data(json!({"apikey": "caller-key", "test": true}))).unwrap();
        assert_eq!(rendered, "caller-key#true");
    }

    #[test]
    fn test_render_normalizes_country() {
        let ctx = RequestContext::new("k", "s", false);
        let engine = SignatureEngine::new(&ctx);
        assert_eq!(engine.render("{country}", &data(json!({"country": "dk"}))).unwrap(), "DK");
        assert_eq!(
            engine.render("{country}", &data(json!({"country": "United"}))).unwrap(),
            "United"
        );
    }

    #[test]
    fn test_render_value_types() {
        let ctx = RequestContext::new("k", "s", false);
        let engine = SignatureEngine::new(&ctx);
        let fields = data(json!({"n": 12.5, "i": 7, "b": false, "z": null, "o": {"a": 1}}));
        assert_eq!(engine.render("{n}#{i}#{b}#{z}#{o}", &fields).unwrap(), "12.5#7#false##{\"a\":1}");
    }

    #[test]
    fn test_render_trims_result() {
        let ctx = RequestContext::new("k", "s", false);
        let engine = SignatureEngine::new(&ctx);
        assert_eq!(engine.render("  {a} ", &data(json!({"a": "x"}))).unwrap(), "x");
    }

    #[test]
    fn test_render_missing_secret() {
        let ctx = RequestContext::new("k", "", false);
        let engine = SignatureEngine::new(&ctx);
        let result = engine.render(DEFAULT_CALLBACK_TEMPLATE, &callback_fields());
        assert!(matches!(result, Err(GatewayError::MissingSecret)));
    }

    #[test]
    fn test_render_missing_api_key() {
        let ctx = RequestContext::new("", "s", false);
        let engine = SignatureEngine::new(&ctx);
        assert!(matches!(engine.render("{apikey}", &CallData::new()), Err(GatewayError::MissingApiKey)));
    }

    #[test]
    fn test_render_unresolved_field() {
        let ctx = RequestContext::new("k", "s", false);
        let engine = SignatureEngine::new(&ctx);
        let result = engine.render("{id}#{secret}", &CallData::new());
        assert!(matches!(result, Err(GatewayError::UnresolvedField(name)) if name == "id"));
    }

    #[test]
    fn test_render_empty_format() {
        let ctx = RequestContext::new("k", "s", false);
        let engine = SignatureEngine::new(&ctx);
        assert!(matches!(engine.render("no fields", &CallData::new()), Err(GatewayError::EmptyFormat(_))));
    }

    #[test]
    fn test_verify_roundtrip() {
        let ctx = RequestContext::new("k", "shh", false);
        let engine = SignatureEngine::new(&ctx);
        let mut payload = callback_fields();
        payload.insert(SIGNATURE_FIELD.to_owned(), json!("5c0ff1f562c6b0c7c1f32cf666e65a98"));

        assert!(engine.verify(&payload, "").unwrap());
        assert!(engine.verify(&payload, DEFAULT_CALLBACK_TEMPLATE).unwrap());
        assert!(engine.verify_strict(&payload, "   ").is_ok());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let ctx = RequestContext::new("k", "shh", false);
        let engine = SignatureEngine::new(&ctx);
        let mut payload = callback_fields();
        payload.insert(SIGNATURE_FIELD.to_owned(), json!("5c0ff1f562c6b0c7c1f32cf666e65a98"));
        payload.insert("amount".to_owned(), json!("1000.00"));

        assert!(!engine.verify(&payload, "").unwrap());
        let err = engine.verify_strict(&payload, "").unwrap_err();
        assert!(matches!(
            err,
            GatewayError::SignatureMismatch { ref expected, .. } if expected == "5c0ff1f562c6b0c7c1f32cf666e65a98"
        ));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let ctx = RequestContext::new("k", "other", false);
        let engine = SignatureEngine::new(&ctx);
        let mut payload = callback_fields();
        payload.insert(SIGNATURE_FIELD.to_owned(), json!("5c0ff1f562c6b0c7c1f32cf666e65a98"));
        assert!(!engine.verify(&payload, "").unwrap());
    }

    #[test]
    fn test_verify_missing_signature() {
        let ctx = RequestContext::new("k", "shh", false);
        let engine = SignatureEngine::new(&ctx);
        assert!(matches!(engine.verify(&callback_fields(), ""), Err(GatewayError::MissingSignature)));
        assert!(matches!(
            engine.verify_strict(&callback_fields(), ""),
            Err(GatewayError::MissingSignature)
        ));
    }

    #[test]
    fn test_verify_custom_template() {
        let ctx = RequestContext::new("k", "shh", false);
        let engine = SignatureEngine::new(&ctx);
        let mut payload = data(json!({"id": "tx-1"}));
        let signature = engine.sign("{id}#{secret}", &payload).unwrap();
        payload.insert(SIGNATURE_FIELD.to_owned(), Value::String(signature));
        assert!(engine.verify(&payload, "{id}#{secret}").unwrap());
    }

    #[test]
    fn test_sha256_digest_step() {
        let ctx = RequestContext::new("k", "shh", false);
        let md5 = SignatureEngine::new(&ctx);
        let sha = SignatureEngine::with_digest(&ctx, Sha256Digest);

        let md5_sig = md5.sign(DEFAULT_CALLBACK_TEMPLATE, &callback_fields()).unwrap();
        let sha_sig = sha.sign(DEFAULT_CALLBACK_TEMPLATE, &callback_fields()).unwrap();
        assert_eq!(md5_sig.len(), 32);
        assert_eq!(sha_sig.len(), 64);
        assert_eq!(sha.digest().algorithm(), "sha256");
    }
}
