//! ViaBill Gateway Bridge: request construction and signing for the ViaBill
//! payment gateway.
//!
//! The gateway exposes account, checkout and transaction operations over
//! HTTP (protocol 3.0). Each request is shaped by declarative metadata
//! (path, method, required and optional fields) and authenticated by digests
//! of `#`-joined field templates ending in the merchant secret. This crate
//! turns an endpoint name plus a bag of fields into a compliant request,
//! sends it through a pluggable transport, and interprets the answer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  GatewayClient   │  login, register, checkout, capture, refund, cancel,
//! │                  │  my_viabill, notifications, verify_callback
//! └────────┬─────────┘
//!          │ endpoint name + CallData
//! ┌────────▼─────────┐      ┌──────────────────┐
//! │ EndpointRegistry │──────│  RequestBuilder  │── SignatureEngine (MD5)
//! └──────────────────┘      └────────┬─────────┘
//!                                    │ RequestEnvelope
//!                           ┌────────▼─────────┐
//!                           │    Transport     │  HttpTransport (reqwest)
//!                           └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Create a Checkout Session
//!
//! ```rust,no_run
//! use serde_json::json;
//! use viabill_gateway::{
//!     CheckoutOutcome, GatewayClient, config::GatewaySettings, helpers, transport::HttpTransport,
//! };
//!
//! # async fn example() -> viabill_gateway::Result<()> {
//! let settings = GatewaySettings::from_file("viabill.toml")?;
//! let transport = HttpTransport::with_config(&settings.transport)?;
//! let client = GatewayClient::from_settings(transport, &settings)?;
//!
//! let data = json!({
//!     "transaction": helpers::transaction_id("1001"),
//!     "order_number": "1001",
//!     "amount": helpers::format_amount("249"),
//!     "currency": "DKK",
//!     "success_url": "https://shop.example/checkout/complete",
//!     "cancel_url": "https://shop.example/checkout/cancel",
//!     "callback_url": "https://shop.example/viabill/callback",
//! });
//!
//! match client.checkout(data.as_object().unwrap()).await? {
//!     CheckoutOutcome::Redirect { redirect_url, .. } => println!("redirect to {redirect_url}"),
//!     other => eprintln!("checkout failed: {:?}", other.error()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Verify a Checkout Callback
//!
//! ```rust
//! use serde_json::json;
//! use viabill_gateway::{RequestContext, signature::SignatureEngine};
//!
//! # fn example() -> viabill_gateway::Result<()> {
//! let ctx = RequestContext::new("merchant-key", "shh", false);
//! let callback = json!({
//!     "transaction": "123",
//!     "orderNumber": "A1",
//!     "amount": "10.00",
//!     "currency": "USD",
//!     "status": "approved",
//!     "time": "2020-01-01",
//!     "signature": "5c0ff1f562c6b0c7c1f32cf666e65a98",
//! });
//!
//! // empty template selects the default callback template
//! assert!(SignatureEngine::new(&ctx).verify(callback.as_object().unwrap(), "")?);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`registry`]: endpoint metadata and ISO country codes
//! - [`signature`]: template rendering, signing and callback verification
//! - [`builder`]: request envelope construction
//! - [`client`]: gateway operations and typed outcomes
//! - [`transport`]: transport abstraction and the reqwest implementation
//! - [`config`]: settings and the configuration provider seam
//! - [`helpers`]: amount, transaction id and flag formatting
//! - [`error`]: error types with recovery guidance
//!
//! # Error Handling
//!
//! All operations return [`Result<T, GatewayError>`](error::Result). Requests
//! that cannot be fully built are never sent:
//!
//! ```rust
//! use serde_json::json;
//! use viabill_gateway::{
//!     GatewayError, RequestContext,
//!     builder::RequestBuilder,
//!     registry::{Endpoint, EndpointRegistry},
//!     signature::SignatureEngine,
//! };
//!
//! let ctx = RequestContext::new("merchant-key", "shh", false);
//! let engine = SignatureEngine::new(&ctx);
//! let login = EndpointRegistry::builtin().get(Endpoint::Login).unwrap();
//!
//! let data = json!({"email": "shop@example.com"});
//! match RequestBuilder::build(login, data.as_object().unwrap(), &engine) {
//!     Err(GatewayError::MissingRequiredField(field)) => assert_eq!(field, "password"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions, reason = "transitive dependencies from reqwest")]

pub mod builder;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod helpers;
pub mod registry;
pub mod signature;
pub mod transport;

pub use builder::{CallData, RequestBuilder, RequestEnvelope};
pub use client::{
    CheckoutOutcome, GatewayClient, MyViabillLink, Notifications, TransactionOutcome,
};
pub use config::{ConfigProvider, GatewaySettings, TransactionType};
pub use context::{PROTOCOL_VERSION, RequestContext};
pub use error::{GatewayError, Result};
pub use registry::{Endpoint, EndpointDefinition, EndpointRegistry, HttpMethod};
pub use signature::{DEFAULT_CALLBACK_TEMPLATE, SignatureEngine};
