//! HTTP transport implementation.
//!
//! reqwest-based [`Transport`]. `GET` payloads travel as query parameters,
//! `POST` payloads as JSON bodies. Non-2xx responses are returned, not raised.

use std::{sync::LazyLock, time::Duration};

use reqwest::{Client, header::HeaderMap, redirect};
use tracing::{debug, instrument};
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    builder::CallData,
    error::{GatewayError, Result},
    registry::HttpMethod,
    signature::render_value,
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Shared redirect-following client.
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(100)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create default HTTP client")
});

/// Shared client that returns redirects to the caller.
static DEFAULT_NO_REDIRECT_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(100)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create default HTTP client")
});

/// Validates URL for security constraints.
///
/// Ensures the URL uses HTTPS and does not point to localhost.
fn validate_url(url: &Url) -> Result<()> {
    if url.scheme() != "https" {
        return Err(GatewayError::Transport("Only HTTPS URLs are allowed".to_owned()));
    }

    if let Some(host) = url.host_str()
        && (host == "localhost" || host == "::1" || host == "[::1]" || host.starts_with("127."))
    {
        return Err(GatewayError::Transport("Localhost URLs are not allowed".to_owned()));
    }

    Ok(())
}

/// Rejects paths containing directory traversal sequences.
fn sanitize_path(path: &str) -> Result<&str> {
    if path.contains("..") || path.contains("//") {
        return Err(GatewayError::Transport(
            "Invalid path: traversal sequences not allowed".to_owned(),
        ));
    }
    if !path.starts_with('/') {
        return Err(GatewayError::Transport("Path must start with '/'".to_owned()));
    }
    Ok(path)
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.contains(['\r', '\n', '\0']) {
        return Err(GatewayError::Transport(
            "Invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(GatewayError::Transport(
            "Invalid header value: control characters not allowed".to_owned(),
        ));
    }
    Ok(())
}

/// Flattens response headers. Values that are not visible ASCII are decoded
/// lossily rather than dropped.
fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect()
}

/// Flattens a payload into query pairs, nested values as compact JSON.
fn query_pairs(payload: &CallData) -> Vec<(&str, String)> {
    payload.iter().map(|(key, value)| (key.as_str(), render_value(value).into_owned())).collect()
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Holds two clients sharing the same settings: one follows redirects, the
/// other hands `3xx` responses back so checkout can read `Location`.
///
/// # Examples
///
/// ```
/// use viabill_gateway::transport::{HttpConfig, HttpTransport, HttpVersion, Transport};
///
/// let config = HttpConfig { timeout_secs: 60, http_version: HttpVersion::Http1, ..Default::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// assert_eq!(transport.protocol_name(), "http/1.1");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    no_redirect_client: Client,
    config: HttpConfig,
}

impl HttpTransport {
    /// Creates a transport for the production gateway with default settings.
    ///
    /// Uses shared singleton clients for connection pooling efficiency.
    ///
    /// # Errors
    ///
    /// This method is infallible but returns `Result` for API consistency.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: DEFAULT_HTTP_CLIENT.clone(),
            no_redirect_client: DEFAULT_NO_REDIRECT_CLIENT.clone(),
            config: HttpConfig::default(),
        })
    }

    /// Creates a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the configuration is invalid, or
    /// [`GatewayError::Http`] if a client cannot be built.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let client = Self::client_builder(config).build()?;
        let no_redirect_client =
            Self::client_builder(config).redirect(redirect::Policy::none()).build()?;

        Ok(Self { client, no_redirect_client, config: config.clone() })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn client_builder(config: &HttpConfig) -> reqwest::ClientBuilder {
        let builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        }
    }

    #[instrument(
        skip(self, request),
        fields(
            method = %request.method,
            path = request.path,
            test_mode = request.test_mode,
            follow_redirects = request.follow_redirects
        )
    )]
    async fn execute_request(&self, request: TransportRequest<'_>) -> Result<TransportResponse> {
        let base_url = self.config.base_url_for(request.test_mode);
        let url = Url::parse(base_url)
            .map_err(|e| GatewayError::Transport(format!("invalid base URL: {e}")))?;

        validate_url(&url)?;
        let path = sanitize_path(request.path)?;
        for (key, value) in &request.headers {
            validate_header(key, value)?;
        }

        let full_url = format!("{}{path}", base_url.trim_end_matches('/'));
        let client = if request.follow_redirects { &self.client } else { &self.no_redirect_client };

        let mut builder = match request.method {
            HttpMethod::Get => client.get(&full_url).query(&query_pairs(request.payload)),
            HttpMethod::Post => client.post(&full_url).json(request.payload),
        };

        for (key, value) in request.headers {
            builder = builder.header(key, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let headers = header_pairs(response.headers());

        let body = response.text().await?;
        debug!(status, body_len = body.len(), "gateway responded");

        Ok(TransportResponse { status, headers, body })
    }
}

impl Transport for HttpTransport {
    async fn send<'a>(&'a self, request: TransportRequest<'a>) -> Result<TransportResponse> {
        self.execute_request(request).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.config.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}
