//! Basic checkout example.
//!
//! Creates a checkout session and prints the payment window URL.
//!
//! # Running this example
//!
//! ```bash
//! export VIABILL_API_KEY=<merchant key>
//! export VIABILL_API_SECRET=<merchant secret>
//! export VIABILL_TEST_MODE=test
//! cargo run --example basic_checkout
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use serde_json::json;
use viabill_gateway::{
    CallData, CheckoutOutcome, GatewayClient, GatewaySettings, helpers, transport::HttpTransport,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("ViaBill Gateway: Basic Checkout Example\n");

    println!("1. Loading settings from VIABILL_* environment variables...");
    let settings = GatewaySettings::from_env()?;
    settings.validate()?;
    println!("   test mode: {}", settings.test_mode);

    println!("\n2. Creating client...");
    let transport = HttpTransport::with_config(&settings.transport)?;
    let client = GatewayClient::from_settings(transport, &settings)?;
    println!("   transaction type: {}", client.transaction_type());

    println!("\n3. Preparing checkout data...");
    let order = "1001";
    let mut data = CallData::new();
    data.insert("apikey".to_owned(), json!(settings.api_key));
    data.insert("transaction".to_owned(), json!(helpers::transaction_id(order)));
    data.insert("order_number".to_owned(), json!(order));
    data.insert("amount".to_owned(), json!(helpers::format_amount("249")));
    data.insert("currency".to_owned(), json!("DKK"));
    data.insert("success_url".to_owned(), json!("https://shop.example/checkout/complete"));
    data.insert("cancel_url".to_owned(), json!("https://shop.example/checkout/cancel"));
    data.insert("callback_url".to_owned(), json!("https://shop.example/viabill/callback"));

    println!("\n4. Creating checkout session...");
    match client.checkout(&data).await? {
        CheckoutOutcome::Redirect { redirect_url, status, message, .. } => {
            println!("   ✓ {} ({})", message, status);
            println!("   redirect the customer to {}", redirect_url);
        }
        other => eprintln!("   ✗ {}", other.error().unwrap_or("unknown outcome")),
    }

    Ok(())
}
