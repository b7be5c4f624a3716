//! ISO 3166-1 alpha-2 country codes.
//!
//! Two explicit variants: [`validate_country`] is strict and returns
//! [`GatewayError::InvalidCountryCode`], [`normalize_country`] is lenient and
//! passes unknown values through unchanged.

use std::borrow::Cow;

use crate::error::{GatewayError, Result};

/// Officially assigned ISO 3166-1 alpha-2 codes, sorted.
pub const ISO_CODES: [&str; 249] = [
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX",
    "AZ", "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ",
    "BR", "BS", "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK",
    "CL", "CM", "CN", "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM",
    "DO", "DZ", "EC", "EE", "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR",
    "GA", "GB", "GD", "GE", "GF", "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS",
    "GT", "GU", "GW", "GY", "HK", "HM", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN",
    "IO", "IQ", "IR", "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN",
    "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV",
    "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK", "ML", "MM", "MN", "MO", "MP", "MQ",
    "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NC", "NE", "NF", "NG", "NI",
    "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG", "PH", "PK", "PL", "PM",
    "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW", "SA", "SB", "SC",
    "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS", "ST", "SV",
    "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO", "TR",
    "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI",
    "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW",
];

/// Returns true if `country`, trimmed and uppercased, is a known alpha-2 code.
#[must_use]
pub fn is_valid_country(country: &str) -> bool {
    let candidate = country.trim().to_ascii_uppercase();
    candidate.len() == 2 && ISO_CODES.binary_search(&candidate.as_str()).is_ok()
}

/// Strict check: returns the canonical (trimmed, uppercase) code.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidCountryCode`] if the value is not a known
/// alpha-2 code.
///
/// # Examples
///
/// ```
/// use viabill_gateway::registry::iso::validate_country;
///
/// assert_eq!(validate_country(" dk ").unwrap(), "DK");
/// assert!(validate_country("XX").is_err());
/// ```
pub fn validate_country(country: &str) -> Result<String> {
    if is_valid_country(country) {
        Ok(country.trim().to_ascii_uppercase())
    } else {
        Err(GatewayError::InvalidCountryCode(country.trim().to_ascii_uppercase()))
    }
}

/// Lenient normalization: known codes are trimmed and uppercased, anything
/// else is returned unchanged.
///
/// # Examples
///
/// ```
/// use viabill_gateway::registry::iso::normalize_country;
///
/// assert_eq!(normalize_country("dk"), "DK");
/// assert_eq!(normalize_country("United"), "United");
/// ```
#[must_use]
pub fn normalize_country(country: &str) -> Cow<'_, str> {
    if is_valid_country(country) {
        Cow::Owned(country.trim().to_ascii_uppercase())
    } else {
        Cow::Borrowed(country)
    }
}
