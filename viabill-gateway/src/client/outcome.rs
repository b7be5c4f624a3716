//! Typed results of gateway operations.

use serde::Serialize;
use serde_json::Value;

use crate::{builder::CallData, transport::TransportResponse};

/// Error text of [`CheckoutOutcome::AlreadyMade`].
pub const ALREADY_MADE_MESSAGE: &str = "Request already made";

/// Message of [`CheckoutOutcome::Unanswered`].
pub const UNANSWERED_MESSAGE: &str =
    "The checkout request to the ViaBill payment gateway could not be completed.";

/// Status reported by [`CheckoutOutcome::Unanswered`].
pub const UNANSWERED_STATUS: u16 = 400;

/// Result of a checkout call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// The gateway created a payment session; send the customer to
    /// `redirect_url`.
    Redirect {
        /// Payment window URL from the `Location` header.
        redirect_url: String,
        /// Redirect status, `301` or `302`.
        status: u16,
        /// Status table message, empty if the code is not listed.
        message: String,
        /// Call data as sent, protocol included.
        input_data: CallData,
    },
    /// The gateway answered without a redirect, typically because the
    /// transaction was already submitted.
    AlreadyMade,
    /// The transport produced no answer at all.
    Unanswered {
        /// Always [`UNANSWERED_STATUS`].
        status: u16,
        /// Always [`UNANSWERED_MESSAGE`].
        message: String,
        /// Call data as sent, protocol included.
        input_data: CallData,
    },
}

impl CheckoutOutcome {
    /// Redirect URL, if the session was created.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::Redirect { redirect_url, .. } => Some(redirect_url),
            Self::AlreadyMade | Self::Unanswered { .. } => None,
        }
    }

    /// Error text for outcomes that are not a redirect.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Redirect { .. } => None,
            Self::AlreadyMade => Some(ALREADY_MADE_MESSAGE),
            Self::Unanswered { message, .. } => Some(message),
        }
    }
}

/// Result of a capture, refund or cancel call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransactionOutcome {
    /// 2xx status.
    Approved,
    /// Any other status, with the raw gateway body.
    Rejected {
        /// HTTP status.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// Full response, returned when the caller asked for verbose output.
    Verbose(TransportResponse),
}

impl TransactionOutcome {
    /// Returns true for [`Approved`](Self::Approved) and for verbose
    /// responses with a 2xx status.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        match self {
            Self::Approved => true,
            Self::Rejected { .. } => false,
            Self::Verbose(response) => response.is_success(),
        }
    }
}

/// Link to the merchant's "My ViaBill" page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MyViabillLink {
    /// Page URL, absent if the gateway did not send one.
    pub url: Option<String>,
}

/// Merchant notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notifications {
    /// Messages as sent by the gateway, absent if none were sent.
    pub messages: Option<Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_checkout_outcome_accessors() {
        let redirect = CheckoutOutcome::Redirect {
            redirect_url: "https://pay.example/abc".to_owned(),
            status: 302,
            message: String::new(),
            input_data: CallData::new(),
        };
        assert_eq!(redirect.redirect_url(), Some("https://pay.example/abc"));
        assert_eq!(redirect.error(), None);

        assert_eq!(CheckoutOutcome::AlreadyMade.error(), Some("Request already made"));
        assert_eq!(CheckoutOutcome::AlreadyMade.redirect_url(), None);
    }

    #[test]
    fn test_checkout_outcome_serializes_tagged() {
        let value = serde_json::to_value(CheckoutOutcome::AlreadyMade).unwrap();
        assert_eq!(value, json!({"outcome": "already_made"}));
    }

    #[test]
    fn test_transaction_outcome_is_approved() {
        assert!(TransactionOutcome::Approved.is_approved());
        assert!(!TransactionOutcome::Rejected { status: 500, body: String::new() }.is_approved());

        let verbose = TransactionOutcome::Verbose(TransportResponse {
            status: 204,
            headers: vec![],
            body: String::new(),
        });
        assert!(verbose.is_approved());
    }
}
