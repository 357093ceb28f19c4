use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// A canonical chain address: `0x` followed by 40 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address. Case-insensitive, prefix optional.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let body = strip_hex_prefix(raw.trim());

        if body.len() != 40 {
            return Err(ValidationError::InvalidAddress(format!(
                "{} (expected 40 hex characters, got {})",
                raw.trim(),
                body.len()
            )));
        }

        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress(format!(
                "{} (contains non-hexadecimal characters)",
                raw.trim()
            )));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Build an address from the low 20 bytes of a 32-byte ABI word
    pub fn from_slice(bytes: &[u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Strip a `0x`/`0X` prefix if present
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Snapshot of the tracked wallets, taken fresh for every block scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedSet {
    addresses: BTreeSet<Address>,
}

impl TrackedSet {
    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }
}

impl FromIterator<Address> for TrackedSet {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
        }
    }
}
