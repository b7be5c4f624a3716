//! Operator command line for the ViaBill gateway bridge.
//!
//! Checks a gateway setup, signs and verifies payloads offline, and issues
//! single gateway calls from the shell. Command output goes to stdout as
//! JSON; logs go to stderr.

#![allow(clippy::multiple_crate_versions, reason = "transitive dependencies from reqwest")]

mod observability;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use viabill_gateway::{
    CallData, GatewayClient, GatewaySettings, RequestContext, SignatureEngine,
    registry::{Endpoint, iso},
    transport::HttpTransport,
};

use crate::observability::{HealthReport, HealthStatus, LogFormat, init_observability};

#[derive(Debug, Parser)]
#[command(name = "viabill-cli", version)]
#[command(about = "Operator tools for the ViaBill payment gateway bridge")]
struct Cli {
    /// TOML settings file; `VIABILL_*` environment variables are used when
    /// absent.
    #[arg(long, global = true, env = "VIABILL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reports whether the gateway setup is complete.
    CheckConfig,

    /// Renders and signs a template with the configured credentials.
    Sign {
        /// Template such as `{key}#{secret}`.
        #[arg(long)]
        template: String,
        /// JSON object supplying the template fields.
        #[arg(long, default_value = "{}")]
        data: String,
    },

    /// Verifies the signature of a checkout callback.
    VerifyCallback {
        /// Callback payload as a JSON object.
        #[arg(long)]
        data: String,
        /// Template, the default callback template when empty.
        #[arg(long, default_value = "")]
        template: String,
        /// Fail on a missing or mismatched signature instead of reporting
        /// `false`.
        #[arg(long)]
        strict: bool,
    },

    /// Normalizes an ISO 3166-1 alpha-2 country code.
    Country {
        /// Code to check.
        code: String,
        /// Reject unknown codes instead of passing them through.
        #[arg(long)]
        strict: bool,
    },

    /// Issues one gateway operation and prints its outcome.
    Call {
        /// Endpoint name, e.g. `checkout` or `capture_transaction`.
        endpoint: String,
        /// Call data as a JSON object.
        #[arg(long, default_value = "{}")]
        data: String,
        /// Return the full response of capture, refund and cancel calls.
        #[arg(long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_observability(LogFormat::from_env());

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::CheckConfig => {
            let report = HealthReport::from_settings(&settings);
            println!("{}", report.to_json()?);
            if report.status == HealthStatus::Unhealthy {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Sign { template, data } => {
            let context = RequestContext::from_provider(&settings);
            let signature = SignatureEngine::new(&context).sign(&template, &parse_data(&data)?)?;
            println!("{signature}");
        }
        Command::VerifyCallback { data, template, strict } => {
            let verified = verify_callback(&settings, &parse_data(&data)?, &template, strict)?;
            println!("{}", serde_json::json!({ "verified": verified }));
            if !verified {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Country { code, strict } => {
            let normalized = if strict {
                iso::validate_country(&code)?
            } else {
                iso::normalize_country(&code).into_owned()
            };
            println!("{normalized}");
        }
        Command::Call { endpoint, data, verbose } => {
            let endpoint: Endpoint = endpoint.parse()?;
            let transport = HttpTransport::with_config(&settings.transport)?;
            let client = GatewayClient::from_settings(transport, &settings)?;
            let outcome = call(&client, endpoint, &parse_data(&data)?, verbose).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<GatewaySettings> {
    let settings = match path {
        Some(path) => {
            info!(path = %path.display(), "loading settings file");
            GatewaySettings::from_file(path)?
        }
        None => {
            debug!("loading settings from environment");
            GatewaySettings::from_env()?
        }
    };
    Ok(settings)
}

fn parse_data(raw: &str) -> anyhow::Result<CallData> {
    match serde_json::from_str(raw).context("call data is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("call data must be a JSON object, got {other}"),
    }
}

fn verify_callback(
    settings: &GatewaySettings,
    payload: &CallData,
    template: &str,
    strict: bool,
) -> anyhow::Result<bool> {
    let context = RequestContext::from_provider(settings);
    let engine = SignatureEngine::new(&context);
    if strict {
        engine.verify_strict(payload, template)?;
        Ok(true)
    } else {
        Ok(engine.verify(payload, template)?)
    }
}

async fn call<T: viabill_gateway::transport::Transport>(
    client: &GatewayClient<T>,
    endpoint: Endpoint,
    data: &CallData,
    verbose: bool,
) -> anyhow::Result<Value> {
    let outcome = match endpoint {
        Endpoint::Login => serde_json::to_value(client.login(data).await?)?,
        Endpoint::Registration => serde_json::to_value(client.register(data).await?)?,
        Endpoint::MyViabill => serde_json::to_value(client.my_viabill(data).await?)?,
        Endpoint::Notifications => serde_json::to_value(client.notifications(data).await?)?,
        Endpoint::Checkout => serde_json::to_value(client.checkout(data).await?)?,
        Endpoint::CaptureTransaction => {
            serde_json::to_value(client.capture(data, verbose).await?)?
        }
        Endpoint::RefundTransaction => serde_json::to_value(client.refund(data, verbose).await?)?,
        Endpoint::CancelTransaction => serde_json::to_value(client.cancel(data, verbose).await?)?,
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use viabill_gateway::{
        GatewayError,
        transport::{Transport, TransportRequest, TransportResponse},
    };

    use super::*;

    #[derive(Debug)]
    struct FixedTransport(TransportResponse);

    impl Transport for FixedTransport {
        async fn send<'a>(
            &'a self,
            _request: TransportRequest<'a>,
        ) -> viabill_gateway::Result<TransportResponse> {
            Ok(self.0.clone())
        }

        fn protocol_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn settings() -> GatewaySettings {
        GatewaySettings {
            api_key: "key-1".to_owned(),
            api_secret: "shh".to_owned(),
            ..GatewaySettings::default()
        }
    }

    #[test]
    fn test_cli_parses_call() {
        let cli = Cli::try_parse_from([
            "viabill-cli",
            "call",
            "capture_transaction",
            "--data",
            r#"{"id":"tx-1"}"#,
            "--verbose",
        ])
        .unwrap();

        let Command::Call { endpoint, data, verbose } = cli.command else {
            panic!("expected call command");
        };
        assert_eq!(endpoint, "capture_transaction");
        assert_eq!(data, r#"{"id":"tx-1"}"#);
        assert!(verbose);
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli =
            Cli::try_parse_from(["viabill-cli", "check-config", "--config", "viabill.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("viabill.toml")));
        assert!(matches!(cli.command, Command::CheckConfig));
    }

    #[test]
    fn test_parse_data_requires_object() {
        assert_eq!(parse_data(r#"{"a":1}"#).unwrap()["a"], json!(1));
        assert!(parse_data("[1,2]").is_err());
        assert!(parse_data("not json").is_err());
    }

    #[test]
    fn test_verify_callback_modes() {
        let payload = parse_data(
            r#"{"transaction":"123","orderNumber":"A1","amount":"10.00","currency":"USD",
                "status":"approved","time":"2020-01-01",
                "signature":"5c0ff1f562c6b0c7c1f32cf666e65a98"}"#,
        )
        .unwrap();
        assert!(verify_callback(&settings(), &payload, "", false).unwrap());
        assert!(verify_callback(&settings(), &payload, "", true).unwrap());

        let mut tampered = payload;
        tampered.insert("amount".to_owned(), json!("11.00"));
        assert!(!verify_callback(&settings(), &tampered, "", false).unwrap());

        let err = verify_callback(&settings(), &tampered, "", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GatewayError>(),
            Some(GatewayError::SignatureMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_call_serializes_outcome() {
        let transport =
            FixedTransport(TransportResponse { status: 201, headers: vec![], body: String::new() });
        let client = GatewayClient::from_settings(transport, &settings()).unwrap();
        let data = parse_data(r#"{"id":"tx-1","amount":"10.00","currency":"DKK"}"#).unwrap();

        let outcome = call(&client, Endpoint::CaptureTransaction, &data, false).await.unwrap();
        assert_eq!(outcome, json!({"outcome": "approved"}));

        let outcome = call(&client, Endpoint::CancelTransaction, &data, true).await.unwrap();
        assert_eq!(outcome["outcome"], "verbose");
        assert_eq!(outcome["status"], 201);
    }
}
