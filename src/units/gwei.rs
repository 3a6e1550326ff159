use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{de, de::Visitor, Deserialize, Serialize};

// Can handle at most 1.84e19 Gwei, ~18_000_000_000 ETH, which is more than the entire supply of
// any network we track. Consensus layer nodes report balances in Gwei, sometimes as JSON numbers,
// sometimes as strings. When serializing, it defaults to string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct GweiNewtype(pub u64);

impl fmt::Display for GweiNewtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<GweiNewtype> for String {
    fn from(GweiNewtype(amount): GweiNewtype) -> Self {
        amount.to_string()
    }
}

struct GweiAmountVisitor;

impl Visitor<'_> for GweiAmountVisitor {
    type Value = GweiNewtype;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(
            "a number, or string of number, smaller u64::MAX representing some amount in Gwei",
        )
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse::<u64>().map(GweiNewtype).map_err(|error| {
            de::Error::invalid_value(
                de::Unexpected::Str(&format!("unexpected value: {v}, error: {error}")),
                &"a number as string: \"118908973575220938\", which fits within u64",
            )
        })
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u64::try_from(v)
            .map(GweiNewtype)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(GweiNewtype(v))
    }
}

impl<'de> Deserialize<'de> for GweiNewtype {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(GweiAmountVisitor)
    }
}

impl FromStr for GweiNewtype {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(GweiNewtype)
    }
}
