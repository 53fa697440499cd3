//! # Token Amounts
//!
//! Human-scale token amounts backed by the contract's fixed-point integer unit.
//!
//! Every amount the sale contract and the input token deal in uses an 18-decimal exponent.
//! [`Amount`] stores the raw on-chain integer (`U256`) so conversions are exact in both
//! directions: `"12.5"` parses to `12_500_000_000_000_000_000` and formats back to `"12.5"`.
//! Comparison (`approved < requested`) is integer comparison, never float.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::{AppError, Result};

/// Decimal exponent declared by the sale contract and the input token.
pub const TOKEN_DECIMALS: u8 = 18;

/// Token amount with an 18-decimal fixed-point representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);

    /// Wrap a raw fixed-point value as returned by the contract.
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Raw fixed-point value to send to the contract.
    pub const fn raw(&self) -> U256 {
        self.0
    }

    /// Whole number of tokens.
    pub fn from_whole(tokens: u64) -> Self {
        Self(U256::from(tokens) * scale())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Share of `total` in percent with a fixed number of decimals, e.g. `"12.50000000"`.
    ///
    /// Returns `None` when `total` is zero.
    pub fn percent_of(&self, total: &Amount, decimals: u8) -> Option<String> {
        if total.is_zero() {
            return None;
        }
        let precision = U256::from(10u64).pow(U256::from(decimals));
        let scaled = self.0.checked_mul(U256::from(100u64))?.checked_mul(precision)? / total.0;
        let whole = scaled / precision;
        if decimals == 0 {
            return Some(whole.to_string());
        }
        let fraction = (scaled % precision).to_string();
        Some(format!(
            "{}.{:0>width$}",
            whole,
            fraction,
            width = decimals as usize
        ))
    }
}

fn scale() -> U256 {
    U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}

/// Parse a human-scale decimal string into the fixed-point unit.
///
/// Accepts `"12"`, `"12.5"`, `".5"` and `"12."`. Negative numbers, exponents, and more
/// fractional digits than `decimals` (after trailing zeros) are rejected.
pub fn parse_units(text: &str, decimals: u8) -> Result<U256> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Amount is empty".to_string()));
    }
    if text.starts_with('-') {
        return Err(AppError::Validation("Amount must not be negative".to_string()));
    }
    let text = text.strip_prefix('+').unwrap_or(text);

    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(AppError::Validation(format!("Invalid amount: {}", text)));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(AppError::Validation(format!("Invalid amount: {}", text)));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(AppError::Validation(format!(
            "Too many decimal places (max {})",
            decimals
        )));
    }

    let digits = format!(
        "{}{:0<width$}",
        whole,
        fraction,
        width = decimals as usize
    );
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10)
        .map_err(|_| AppError::Validation(format!("Amount is too large: {}", text)))
}

/// Format a fixed-point value at human scale, without trailing zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

impl FromStr for Amount {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        parse_units(s, TOKEN_DECIMALS).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.0, TOKEN_DECIMALS))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_expressed_precision() {
        for text in ["12.5", "0.000000000000000001", "100", "8000000", "1.230456789012345678"] {
            let amount: Amount = text.parse().unwrap();
            assert_eq!(amount.to_string(), text);
        }
    }

    #[test]
    fn test_parse_raw_value() {
        let amount: Amount = "12.5".parse().unwrap();
        assert_eq!(amount.raw(), U256::from(12_500_000_000_000_000_000u128));
        assert_eq!(Amount::from_whole(12).raw(), U256::from(12_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_parse_loose_forms() {
        assert_eq!(".5".parse::<Amount>().unwrap().to_string(), "0.5");
        assert_eq!("12.".parse::<Amount>().unwrap().to_string(), "12");
        assert_eq!(" 007.50 ".parse::<Amount>().unwrap().to_string(), "7.5");
        assert!("0".parse::<Amount>().unwrap().is_zero());
        assert!("0.000".parse::<Amount>().unwrap().is_zero());
    }

    #[test]
    fn test_parse_rejects() {
        for text in ["", "   ", "-1", "abc", "1.2.3", ".", "1e18", "0x10", "1,5"] {
            assert!(text.parse::<Amount>().is_err(), "{:?} should not parse", text);
        }
        assert!("0.0000000000000000001".parse::<Amount>().is_err());
        assert!("1.0000000000000000000".parse::<Amount>().is_ok());
    }

    #[test]
    fn test_ordering_is_exact() {
        let approved: Amount = "99.999999999999999999".parse().unwrap();
        let requested: Amount = "100".parse().unwrap();
        assert!(approved < requested);
        assert!(Amount::from_whole(100) >= requested);
    }

    #[test]
    fn test_percent_of() {
        let total = Amount::from_whole(8_000_000);
        assert_eq!(
            Amount::from_whole(2_000_000).percent_of(&total, 8).as_deref(),
            Some("25.00000000")
        );
        assert_eq!(
            Amount::from_whole(1).percent_of(&total, 8).as_deref(),
            Some("0.00001250")
        );
        assert_eq!(Amount::from_whole(1).percent_of(&Amount::ZERO, 8), None);
    }

    #[test]
    fn test_serde_as_string() {
        let amount: Amount = "12.5".parse().unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"12.5\"");
        let back: Amount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(back, amount);
    }
}
