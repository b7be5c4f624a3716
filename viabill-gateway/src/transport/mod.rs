//! Transport abstraction.
//!
//! The client never talks to the network directly. Every built
//! [`RequestEnvelope`](crate::builder::RequestEnvelope) is handed to a
//! [`Transport`], which performs exactly one round trip and returns the raw
//! status, headers and body. Interpreting the response is the client's job.
//!
//! # Examples
//!
//! ```rust,no_run
//! use serde_json::json;
//! use viabill_gateway::{
//!     registry::HttpMethod,
//!     transport::{HttpTransport, Transport, TransportRequest},
//! };
//!
//! # async fn example() -> viabill_gateway::Result<()> {
//! let transport = HttpTransport::new()?;
//! let payload = json!({"email": "shop@example.com", "password": "hunter2"});
//!
//! let request = TransportRequest {
//!     path: "/api/addon/drupal/login",
//!     method: HttpMethod::Post,
//!     payload: payload.as_object().unwrap(),
//!     test_mode: false,
//!     headers: vec![],
//!     follow_redirects: true,
//! };
//!
//! let response = transport.send(request).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use serde::Serialize;

use crate::{
    builder::{CallData, RequestEnvelope},
    error::Result,
    registry::HttpMethod,
};

pub mod config;
pub mod http;

pub use config::{DEFAULT_BASE_URL, HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// One outbound gateway call.
#[derive(Debug, Clone)]
pub struct TransportRequest<'a> {
    /// Path relative to the gateway base URL.
    pub path: &'a str,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request fields: query parameters for `GET`, JSON body for `POST`.
    pub payload: &'a CallData,
    /// Selects the test base URL when one is configured.
    pub test_mode: bool,
    /// Additional HTTP headers to include.
    pub headers: Vec<(&'a str, &'a str)>,
    /// Whether HTTP redirects are followed. Checkout disables this to read
    /// the `Location` header.
    pub follow_redirects: bool,
}

impl<'a> TransportRequest<'a> {
    /// Creates a request for a built envelope with default options.
    #[must_use]
    pub fn from_envelope(envelope: &'a RequestEnvelope, test_mode: bool) -> Self {
        Self {
            path: &envelope.path,
            method: envelope.method,
            payload: &envelope.payload,
            test_mode,
            headers: Vec::new(),
            follow_redirects: true,
        }
    }

    /// Disables redirect following.
    #[must_use]
    pub const fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// Raw response of one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransportResponse {
    /// HTTP status code, `0` if the transport produced no answer.
    pub status: u16,
    /// Response headers in received order.
    pub headers: Vec<(String, String)>,
    /// Response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Returns the first value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns true when the transport produced nothing at all: no status,
    /// no headers and no body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status == 0 && self.headers.is_empty() && self.body.is_empty()
    }
}

/// Network collaborator performing one gateway round trip per call.
///
/// Implementations must return non-2xx responses as `Ok`; only failures to
/// complete the exchange are errors.
pub trait Transport: Send + Sync {
    /// Sends one request.
    ///
    /// # Errors
    ///
    /// Returns error if the request is rejected by the transport's own checks
    /// or the exchange cannot be completed.
    fn send<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> TransportResponse {
        TransportResponse {
            status,
            headers: headers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
            body: body.to_owned(),
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = response(302, &[("location", "https://pay.example/abc")], "");
        assert_eq!(response.header("Location"), Some("https://pay.example/abc"));
        assert_eq!(response.header("LOCATION"), Some("https://pay.example/abc"));
        assert_eq!(response.header("Content-Type"), None);
    }

    #[test]
    fn test_is_success_bounds() {
        assert!(response(200, &[], "").is_success());
        assert!(response(204, &[], "").is_success());
        assert!(response(299, &[], "").is_success());
        assert!(!response(199, &[], "").is_success());
        assert!(!response(302, &[], "").is_success());
        assert!(!response(500, &[], "").is_success());
    }

    #[test]
    fn test_is_empty() {
        assert!(TransportResponse::default().is_empty());
        assert!(!response(0, &[], "x").is_empty());
        assert!(!response(0, &[("x", "y")], "").is_empty());
        assert!(!response(204, &[], "").is_empty());
    }

    #[test]
    fn test_request_from_envelope() {
        let envelope = RequestEnvelope {
            path: "/api/transaction/cancel".to_owned(),
            method: HttpMethod::Post,
            payload: json!({"id": "tx-1"}).as_object().cloned().unwrap_or_default(),
        };

        let request = TransportRequest::from_envelope(&envelope, true);
        assert_eq!(request.path, "/api/transaction/cancel");
        assert!(request.test_mode);
        assert!(request.follow_redirects);
        assert!(request.headers.is_empty());
        assert!(!request.without_redirects().follow_redirects);
    }
}
