//! Formatting helpers for values sent to the gateway.

use std::str::FromStr;

use rand::{Rng, distributions::Alphanumeric};
use rust_decimal::{Decimal, RoundingStrategy};

/// Length of the random suffix in generated transaction ids.
pub const TRANSACTION_SUFFIX_LEN: usize = 10;

/// Formats an amount with two decimals and `.` as separator, rounding
/// midpoints away from zero.
///
/// Non-numeric input yields `"0"`.
///
/// # Examples
///
/// ```
/// use viabill_gateway::helpers::format_amount;
///
/// assert_eq!(format_amount("10"), "10.00");
/// assert_eq!(format_amount(" 99.5 "), "99.50");
/// assert_eq!(format_amount("1.005"), "1.01");
/// assert_eq!(format_amount("ten"), "0");
/// ```
#[must_use]
pub fn format_amount(amount: &str) -> String {
    let amount = amount.trim();
    let Ok(value) = Decimal::from_str(amount).or_else(|_| Decimal::from_scientific(amount)) else {
        return "0".to_owned();
    };

    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(2);
    rounded.to_string()
}

/// Generates a gateway transaction id for an order: `vb-<order>-<suffix>`
/// with a random alphanumeric suffix.
///
/// # Examples
///
/// ```
/// use viabill_gateway::helpers::transaction_id;
///
/// let id = transaction_id("1001");
/// assert!(id.starts_with("vb-1001-"));
/// assert_eq!(id.len(), "vb-1001-".len() + 10);
/// ```
#[must_use]
pub fn transaction_id(order_id: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TRANSACTION_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("vb-{order_id}-{suffix}")
}

/// Interprets a host test-mode setting.
///
/// Empty, `test`, `true` and `1` enable test mode.
#[must_use]
pub fn parse_test_mode(mode: &str) -> bool {
    matches!(mode.trim().to_ascii_lowercase().as_str(), "" | "test" | "true" | "1")
}

/// Interprets a "try before you buy" setting. Only `true` and `1` enable it.
#[must_use]
pub fn parse_try_before_you_buy(tbyb: &str) -> bool {
    matches!(tbyb.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount("10"), "10.00");
        assert_eq!(format_amount("10.5"), "10.50");
        assert_eq!(format_amount("0.125"), "0.13");
        assert_eq!(format_amount("1.005"), "1.01");
        assert_eq!(format_amount("2.675"), "2.68");
        assert_eq!(format_amount("-2.675"), "-2.68");
        assert_eq!(format_amount("-0.001"), "0.00");
        assert_eq!(format_amount("1e3"), "1000.00");
        assert_eq!(format_amount("1234567.891"), "1234567.89");
        assert_eq!(format_amount("-3"), "-3.00");
    }

    #[test]
    fn test_format_amount_non_numeric() {
        assert_eq!(format_amount(""), "0");
        assert_eq!(format_amount("abc"), "0");
        assert_eq!(format_amount("NaN"), "0");
        assert_eq!(format_amount("inf"), "0");
    }

    #[test]
    fn test_transaction_id_shape() {
        let id = transaction_id("42");
        let suffix = id.strip_prefix("vb-42-").unwrap();
        assert_eq!(suffix.len(), TRANSACTION_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_transaction_ids_differ() {
        assert_ne!(transaction_id("42"), transaction_id("42"));
    }

    #[test]
    fn test_parse_test_mode() {
        for on in ["", "test", "true", "TRUE", "1", " 1 "] {
            assert!(parse_test_mode(on), "{on:?} should enable test mode");
        }
        for off in ["live", "false", "0", "no"] {
            assert!(!parse_test_mode(off), "{off:?} should disable test mode");
        }
    }

    #[test]
    fn test_parse_try_before_you_buy() {
        assert!(parse_try_before_you_buy("true"));
        assert!(parse_try_before_you_buy("1"));
        assert!(!parse_try_before_you_buy(""));
        assert!(!parse_try_before_you_buy("0"));
        assert!(!parse_try_before_you_buy("yes"));
    }
}
