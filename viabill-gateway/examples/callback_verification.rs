//! Callback verification example.
//!
//! Signs a callback the way the gateway does, then verifies it and a
//! tampered copy. Runs offline.
//!
//! ```bash
//! cargo run --example callback_verification
//! ```

#![allow(
    clippy::print_stdout,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use serde_json::json;
use viabill_gateway::{
    CallData, DEFAULT_CALLBACK_TEMPLATE, GatewayError, RequestContext, SignatureEngine,
};

fn main() -> Result<(), GatewayError> {
    let context = RequestContext::new("merchant-key", "merchant-secret", false);
    let engine = SignatureEngine::new(&context);

    let mut callback = CallData::new();
    for (field, value) in [
        ("transaction", "vb-1001-a1b2c3d4e5"),
        ("orderNumber", "1001"),
        ("amount", "249.00"),
        ("currency", "DKK"),
        ("status", "APPROVED"),
        ("time", "1700000000"),
    ] {
        callback.insert(field.to_owned(), json!(value));
    }

    let signature = engine.sign(DEFAULT_CALLBACK_TEMPLATE, &callback)?;
    callback.insert("signature".to_owned(), json!(signature));
    println!("signature:  {}", signature);
    // an empty template selects the default callback template
    println!("verified:   {}", engine.verify(&callback, "")?);

    callback.insert("amount".to_owned(), json!("1.00"));
    match engine.verify_strict(&callback, "") {
        Err(GatewayError::SignatureMismatch { expected, actual }) => {
            println!("tampered:   carried {}, computed {}", expected, actual);
        }
        other => println!("tampered:   {:?}", other),
    }

    Ok(())
}
