//! Token amount parsing and formatting
//!
//! Amounts travel as decimal strings of base units (wei-style) so that
//! values up to 2^256 survive JSON without floating-point loss.

use num_bigint::{BigInt, BigUint, Sign};

/// Decimals used by ERC-20 tokens unless configured otherwise
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// Parse a base-unit token amount
///
/// Only a non-empty run of ASCII digits is accepted. Signs, separators,
/// whitespace, decimal points and exponents are all rejected.
pub fn parse_token_amount(raw: &str) -> Option<BigUint> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(raw.as_bytes(), 10)
}

/// Render a base-unit amount in whole token units
///
/// Mirrors ethers' `formatUnits`: at least one fractional digit is kept and
/// trailing zeros are trimmed, so `1500000000000000000` with 18 decimals
/// becomes `1.5`.
pub fn format_units(value: &BigInt, decimals: u32) -> String {
    let sign = if value.sign() == Sign::Minus { "-" } else { "" };
    let digits = value.magnitude().to_string();
    let decimals = decimals as usize;

    let (int_part, frac_part) = if digits.len() > decimals {
        let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
        (int_part.to_string(), frac_part.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let frac = frac_part.trim_end_matches('0');
    let frac = if frac.is_empty() { "0" } else { frac };

    format!("{sign}{int_part}.{frac}")
}

/// Serde adapter that writes big integers as decimal strings
pub mod decimal_string {
    use num_bigint::BigInt;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as a decimal string
    pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Deserialize from a decimal string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
