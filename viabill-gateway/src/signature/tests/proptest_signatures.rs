use proptest::prelude::*;
use serde_json::{Value, json};

use super::{DEFAULT_CALLBACK_TEMPLATE, SIGNATURE_FIELD, SignatureEngine};
use crate::{builder::CallData, context::RequestContext};

const CALLBACK_FIELDS: [&str; 6] = ["transaction", "orderNumber", "amount", "currency", "status", "time"];

fn callback(values: &[String; 6]) -> CallData {
    CALLBACK_FIELDS.iter().zip(values).map(|(field, value)| ((*field).to_owned(), json!(value))).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_callback_verification_roundtrip(
        secret in "[a-zA-Z0-9]{1,32}",
        values in proptest::array::uniform6("[a-zA-Z0-9.:-]{1,24}"),
    ) {
        let ctx = RequestContext::new("key", &secret, false);
        let engine = SignatureEngine::new(&ctx);

        let mut payload = callback(&values);
        let signature = engine.sign(DEFAULT_CALLBACK_TEMPLATE, &payload).expect("signing failed");
        payload.insert(SIGNATURE_FIELD.to_owned(), Value::String(signature));

        prop_assert!(engine.verify(&payload, "").expect("verification failed"));
        prop_assert!(engine.verify_strict(&payload, "").is_ok());
    }

    #[test]
    fn test_tampered_field_fails_verification(
        secret in "[a-zA-Z0-9]{1,32}",
        values in proptest::array::uniform6("[a-zA-Z0-9.:-]{1,24}"),
        tampered in 0..CALLBACK_FIELDS.len(),
    ) {
        let ctx = RequestContext::new("key", &secret, false);
        let engine = SignatureEngine::new(&ctx);

        let mut payload = callback(&values);
        let signature = engine.sign(DEFAULT_CALLBACK_TEMPLATE, &payload).expect("signing failed");
        payload.insert(SIGNATURE_FIELD.to_owned(), Value::String(signature));

        let field = CALLBACK_FIELDS[tampered];
        payload.insert(field.to_owned(), json!(format!("{}x", values[tampered])));

        prop_assert!(!engine.verify(&payload, "").expect("verification failed"));
        prop_assert!(engine.verify_strict(&payload, "").is_err());
    }

    #[test]
    fn test_signing_is_deterministic(
        secret in "[a-zA-Z0-9]{1,32}",
        values in proptest::array::uniform6("[a-zA-Z0-9.:-]{1,24}"),
    ) {
        let ctx = RequestContext::new("key", &secret, false);
        let engine = SignatureEngine::new(&ctx);
        let payload = callback(&values);

        let first = engine.sign(DEFAULT_CALLBACK_TEMPLATE, &payload).expect("signing failed");
        let second = engine.sign(DEFAULT_CALLBACK_TEMPLATE, &payload).expect("signing failed");
        prop_assert_eq!(first.len(), 32);
        prop_assert_eq!(first, second);
    }
}
