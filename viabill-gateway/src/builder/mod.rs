//! Request construction.
//!
//! Turns an [`EndpointDefinition`] plus caller data into a transport-ready
//! [`RequestEnvelope`]. Building is all-or-nothing: the first field that
//! cannot be resolved aborts the build and nothing is sent.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::{
    error::{GatewayError, Result},
    registry::{EndpointDefinition, HttpMethod, iso::normalize_country},
    signature::{API_KEY_NAMES, SignatureDigest, SignatureEngine},
};

/// Caller-supplied field values for one call.
pub type CallData = Map<String, Value>;

/// Fully built request, ready for a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestEnvelope {
    /// Path relative to the gateway base URL.
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Wire payload, booleans already stringified.
    pub payload: CallData,
}

/// Builds request envelopes from endpoint definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder;

impl RequestBuilder {
    /// Builds the envelope for one call.
    ///
    /// Unsigned required fields are resolved first, in declared order: caller
    /// data (`country` normalized, `test` taken from the context), then the
    /// defaults for `protocol`, `test` and the API key names. Signed fields
    /// then get the digest of their template.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MissingRequiredField`] naming the first unsigned
    ///   field that cannot be resolved
    /// - [`GatewayError::MissingApiKey`] if an API key field must be
    ///   defaulted but no key is configured
    /// - any signing error
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use viabill_gateway::{
    ///     RequestContext,
    ///     builder::RequestBuilder,
    ///     registry::{Endpoint, EndpointRegistry},
    ///     signature::SignatureEngine,
    /// };
    ///
    /// let ctx = RequestContext::new("key-1", "shh", false);
    /// let engine = SignatureEngine::new(&ctx);
    /// let cancel = EndpointRegistry::builtin().get(Endpoint::CancelTransaction).unwrap();
    ///
    /// let data = json!({"id": "tx-1"});
    /// let envelope = RequestBuilder::build(cancel, data.as_object().unwrap(), &engine).unwrap();
    /// assert_eq!(envelope.payload["apikey"], "key-1");
    /// assert_eq!(envelope.payload["signature"].as_str().unwrap().len(), 32);
    /// ```
    pub fn build<D: SignatureDigest>(
        definition: &EndpointDefinition,
        data: &CallData,
        engine: &SignatureEngine<'_, D>,
    ) -> Result<RequestEnvelope> {
        match Self::build_payload(definition, data, engine) {
            Ok(payload) => {
                debug!(
                    endpoint = %definition.name,
                    method = %definition.method,
                    fields = payload.len(),
                    "request envelope built"
                );
                Ok(RequestEnvelope {
                    path: definition.path.clone(),
                    method: definition.method,
                    payload,
                })
            }
            Err(e) => {
                if e.is_configuration_error() {
                    error!(endpoint = %definition.name, error = %e, "gateway setup is incomplete");
                } else {
                    error!(endpoint = %definition.name, error = %e, "failed to build request");
                }
                Err(e)
            }
        }
    }

    fn build_payload<D: SignatureDigest>(
        definition: &EndpointDefinition,
        data: &CallData,
        engine: &SignatureEngine<'_, D>,
    ) -> Result<CallData> {
        let context = engine.context();
        let mut payload = CallData::new();

        // plain fields first so a missing one is named before any signing
        for field in &definition.required_fields {
            if definition.signature_template(field).is_some() {
                continue;
            }
            let value = if let Some(value) = data.get(field) {
                match field.as_str() {
                    "country" => normalize_country_value(value),
                    "test" => Value::String(context.test_mode_str().to_owned()),
                    _ => value.clone(),
                }
            } else {
                match field.as_str() {
                    "protocol" => Value::String(context.protocol_version().to_owned()),
                    "test" => Value::String(context.test_mode_str().to_owned()),
                    name if API_KEY_NAMES.contains(&name) => {
                        Value::String(context.api_key()?.to_owned())
                    }
                    _ => return Err(GatewayError::MissingRequiredField(field.clone())),
                }
            };
            payload.insert(field.clone(), value);
        }

        for field in &definition.required_fields {
            if let Some(template) = definition.signature_template(field) {
                payload.insert(field.clone(), Value::String(engine.sign(template, data)?));
            }
        }

        for field in &definition.optional_fields {
            if let Some(value) = data.get(field) {
                payload.insert(field.clone(), value.clone());
            }
        }

        coerce_booleans(&mut payload);
        Ok(payload)
    }
}

fn normalize_country_value(value: &Value) -> Value {
    match value {
        Value::String(country) => Value::String(normalize_country(country).into_owned()),
        other => other.clone(),
    }
}

/// Replaces every boolean in `payload`, at any depth, with `"true"` or
/// `"false"`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use viabill_gateway::builder::coerce_booleans;
///
/// let mut payload = json!({"a": true, "b": {"c": false}}).as_object().unwrap().clone();
/// coerce_booleans(&mut payload);
/// assert_eq!(payload["a"], "true");
/// assert_eq!(payload["b"]["c"], "false");
/// ```
pub fn coerce_booleans(payload: &mut CallData) {
    payload.values_mut().for_each(coerce_value);
}

fn coerce_value(value: &mut Value) {
    match value {
        Value::Bool(flag) => *value = Value::String(flag.to_string()),
        Value::Object(map) => map.values_mut().for_each(coerce_value),
        Value::Array(items) => items.iter_mut().for_each(coerce_value),
        Value::Null | Value::Number(_) | Value::String(_) => {}
    }
}
