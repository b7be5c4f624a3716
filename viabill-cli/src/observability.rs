//! Logging setup and the `check-config` report.

use std::io;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use viabill_gateway::{GatewaySettings, registry::EndpointRegistry};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for a terminal.
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

impl LogFormat {
    /// Reads the format from `LOG_FORMAT`: `json` selects JSON, anything
    /// else (or unset) selects pretty output.
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") { Self::Json } else { Self::Pretty }
    }
}

/// Installs the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`). Logs go to stderr so that
/// command output on stdout stays machine readable.
pub fn init_observability(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

/// Overall setup status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Every check passed.
    Healthy,
    /// Usable, but at least one check warned.
    Degraded,
    /// At least one check failed.
    Unhealthy,
}

impl HealthStatus {
    /// Lowercase token used in the JSON report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Status of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckStatus {
    /// Check passed.
    Pass,
    /// Check failed.
    Fail,
    /// Degraded but usable.
    Warn,
}

impl HealthCheckStatus {
    /// Lowercase token used in the JSON report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warn => "warn",
        }
    }
}

/// One line of the setup report.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Check name.
    pub name: String,
    /// Check status.
    pub status: HealthCheckStatus,
    /// Details.
    pub message: Option<String>,
}

impl HealthCheck {
    fn new(name: impl Into<String>, status: HealthCheckStatus, message: impl Into<String>) -> Self {
        Self { name: name.into(), status, message: Some(message.into()) }
    }

    /// Passing check.
    #[must_use]
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, HealthCheckStatus::Pass, message)
    }

    /// Warning check.
    #[must_use]
    pub fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, HealthCheckStatus::Warn, message)
    }

    /// Failing check.
    #[must_use]
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, HealthCheckStatus::Fail, message)
    }
}

/// Report printed by `check-config`.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// CLI version.
    pub version: String,
    /// Whether calls target the sandbox.
    pub test_mode: bool,
    /// Individual checks.
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    /// Checks the setup contract of `settings`.
    ///
    /// Missing credentials fail, because no call can be signed without the
    /// secret and most calls need the API key.
    #[must_use]
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        let mut checks = Vec::with_capacity(5);

        checks.push(if settings.api_key.trim().is_empty() {
            HealthCheck::fail("api_key", "API key is not configured")
        } else {
            HealthCheck::pass("api_key", "API key is configured")
        });

        checks.push(if settings.api_secret.trim().is_empty() {
            HealthCheck::fail("api_secret", "API secret is not configured")
        } else {
            HealthCheck::pass("api_secret", "API secret is configured")
        });

        checks.push(HealthCheck::pass(
            "transaction_type",
            format!("transaction type is {}", settings.transaction_type),
        ));

        checks.push(match settings.registry() {
            Ok(_) if settings.endpoints.is_empty() => {
                HealthCheck::pass("endpoints", "built-in endpoint paths")
            }
            Ok(_) => {
                let mut names: Vec<&str> = settings.endpoints.keys().map(String::as_str).collect();
                names.sort_unstable();
                HealthCheck::warn("endpoints", format!("path overrides for {}", names.join(", ")))
            }
            Err(e) => HealthCheck::fail("endpoints", e.to_string()),
        });

        checks.push(match settings.transport.validate() {
            Ok(()) => HealthCheck::pass(
                "transport",
                format!("base URL {}", settings.transport.base_url_for(settings.test_mode)),
            ),
            Err(e) => HealthCheck::fail("transport", e.to_string()),
        });

        Self {
            status: Self::compute_status(&checks),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            test_mode: settings.test_mode,
            checks,
        }
    }

    /// Serializes the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::json!({
            "status": self.status.as_str(),
            "version": self.version,
            "test_mode": self.test_mode,
            "endpoints": EndpointRegistry::builtin().names().count(),
            "checks": self.checks.iter().map(|c| {
                let mut obj = serde_json::json!({
                    "name": c.name,
                    "status": c.status.as_str(),
                });
                if let Some(msg) = &c.message {
                    obj["message"] = serde_json::Value::String(msg.clone());
                }
                obj
            }).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&json)
    }

    /// Worst status among `checks`.
    #[must_use]
    pub fn compute_status(checks: &[HealthCheck]) -> HealthStatus {
        if checks.iter().any(|c| c.status == HealthCheckStatus::Fail) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthCheckStatus::Warn) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
