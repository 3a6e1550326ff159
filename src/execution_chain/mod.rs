mod node;

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use node::ExecutionNodeHttp;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid address {0}, expected 0x followed by 40 hex characters")]
pub struct ParseAddressError(String);

/// A 20 byte execution layer account address. Stored lowercase, checksum casing is accepted on
/// input but not preserved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct Address(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| ParseAddressError(s.to_string()))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseAddressError(s.to_string()));
        }

        Ok(Address(s.to_lowercase()))
    }
}

impl TryFrom<String> for Address {
    type Error = ParseAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(Address(address): Address) -> Self {
        address
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
