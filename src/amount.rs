//! Arbitrary-precision amounts
//!
//! Balances are `BigUint` everywhere and travel as base-10 strings in
//! storage, config and RPC payloads.

use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;

/// Amount parsing errors
#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount '{0}': expected a non-negative base-10 integer")]
    Invalid(String),

    #[error("Amount must be greater than zero")]
    Zero,
}

/// Parse a non-negative base-10 integer
///
/// Rejects signs, whitespace inside the number, decimals and exponents.
pub fn parse_amount(input: &str) -> Result<BigUint, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(input.to_string()));
    }
    BigUint::from_str(trimmed).map_err(|_| AmountError::Invalid(input.to_string()))
}

/// Parse a strictly positive base-10 integer
pub fn parse_positive_amount(input: &str) -> Result<BigUint, AmountError> {
    let amount = parse_amount(input)?;
    if amount.is_zero() {
        return Err(AmountError::Zero);
    }
    Ok(amount)
}

/// Serde adapter storing a `BigUint` as a base-10 string
pub mod decimal_string {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_amount(&raw).map_err(D::Error::custom)
    }
}

/// Serde adapter for `Option<BigUint>` stored as an optional base-10 string
pub mod optional_decimal_string {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<BigUint>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_str_radix(10)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_amount(&raw).map_err(D::Error::custom))
            .transpose()
    }
}
