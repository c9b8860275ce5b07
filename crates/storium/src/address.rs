//! ethereum account/contract addresses
//!
//! the wallet hands out addresses in whatever casing it likes (checksummed,
//! lowercase). we keep the string exactly as received and only fold case
//! when comparing.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 20-byte address plus the `0x`-prefixed string it was read from
#[derive(Clone, Debug)]
pub struct Address {
    raw: String,
    inner: alloy_primitives::Address,
}

impl Address {
    pub fn parse(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ClientError::InvalidAddress(s.to_string()))?;
        if digits.len() != 40 {
            return Err(ClientError::InvalidAddress(s.to_string()));
        }
        let inner = alloy_primitives::Address::from_str(digits)
            .map_err(|_| ClientError::InvalidAddress(s.to_string()))?;
        Ok(Self {
            raw: s.to_string(),
            inner,
        })
    }

    /// build from raw bytes (abi decoding, event topics)
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        alloy_primitives::Address::from(bytes).into()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        out.copy_from_slice(self.inner.as_slice());
        out
    }

    /// abi-level address for calldata
    pub fn to_alloy(&self) -> alloy_primitives::Address {
        self.inner
    }

    /// case-insensitive comparison against a string the wallet or storage gave us
    pub fn matches(&self, other: &str) -> bool {
        self.raw.eq_ignore_ascii_case(other)
    }
}

/// decoded from return data or topics, rendered lowercase
impl From<alloy_primitives::Address> for Address {
    fn from(inner: alloy_primitives::Address) -> Self {
        Self {
            raw: format!("0x{}", hex::encode(inner.as_slice())),
            inner,
        }
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x2662b183bC1883e15B8E4D1E8DE1Da5ca126A626";

    #[test]
    fn test_parse_keeps_casing() {
        let addr = Address::parse(CHECKSUMMED).unwrap();
        assert_eq!(addr.as_str(), CHECKSUMMED);
        assert_eq!(addr.to_string(), CHECKSUMMED);
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a = Address::parse(CHECKSUMMED).unwrap();
        let b = Address::parse(&CHECKSUMMED.to_lowercase()).unwrap();
        assert_eq!(a, b);
        assert!(a.matches(&CHECKSUMMED.to_uppercase().replace("0X", "0x")));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Address::parse("").is_err());
        assert!(Address::parse("2662b183bc1883e15b8e4d1e8de1da5ca126a626").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzz62b183bc1883e15b8e4d1e8de1da5ca126a626").is_err());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let addr = Address::parse(CHECKSUMMED).unwrap();
        let back = Address::from_bytes(addr.to_bytes());
        assert_eq!(addr, back);
        assert_eq!(back.as_str(), CHECKSUMMED.to_lowercase());
        assert_eq!(Address::from(addr.to_alloy()), addr);
    }
}
