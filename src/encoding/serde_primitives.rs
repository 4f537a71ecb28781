use std::str::FromStr;

use num_bigint::BigUint;
use serde::{self, Deserialize, Deserializer, Serializer};

fn serialize_biguint<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Amounts arrive either as decimal strings or as `0x`-prefixed hex strings.
fn parse_biguint(s: &str) -> Result<BigUint, String> {
    let s = s.trim();
    if let Some(hex_digits) = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
    {
        if hex_digits.is_empty() {
            return Ok(BigUint::ZERO);
        }
        BigUint::parse_bytes(hex_digits.as_bytes(), 16)
            .ok_or_else(|| format!("Invalid hex amount: {}", s))
    } else {
        BigUint::from_str(s).map_err(|e| format!("Invalid amount {}: {}", s, e))
    }
}

fn deserialize_biguint<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_biguint(&s).map_err(serde::de::Error::custom)
}

pub mod biguint_string {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_biguint(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_biguint(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Amount {
        #[serde(with = "biguint_string")]
        value: BigUint,
    }

    #[test]
    fn test_amount_accepts_decimal_and_hex() {
        let decimal: Amount = serde_json::from_str(r#"{"value": "1000"}"#).unwrap();
        let hex: Amount = serde_json::from_str(r#"{"value": "0x3e8"}"#).unwrap();
        assert_eq!(decimal.value, BigUint::from(1000u32));
        assert_eq!(decimal, hex);
    }

    #[test]
    fn test_amount_serializes_as_decimal() {
        let amount = Amount { value: BigUint::from(1_000_000_000_000_000_000u64) };
        assert_eq!(serde_json::to_string(&amount).unwrap(), r#"{"value":"1000000000000000000"}"#);
    }

    #[test]
    fn test_amount_rejects_garbage() {
        let parsed: Result<Amount, _> = serde_json::from_str(r#"{"value": "12ab"}"#);
        assert!(parsed.is_err());
    }
}
