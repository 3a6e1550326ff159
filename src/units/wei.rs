use std::{fmt::Display, str::FromStr};

use num_bigint::{BigUint, ParseBigIntError};
use serde::{Deserialize, Serialize};

use super::{GweiNewtype, WEI_PER_ETH, WEI_PER_GWEI};

/// An amount in wei, the smallest unit. Unbounded, so sums over the whole supply never overflow.
/// Serializes as a decimal string, JSON numbers can't hold these amounts safely.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub struct WeiNewtype(pub BigUint);

impl WeiNewtype {
    pub fn from_eth(eth: u64) -> Self {
        Self(BigUint::from(eth) * WEI_PER_ETH)
    }
}

impl Display for WeiNewtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let WeiNewtype(amount) = self;
        write!(f, "{amount}")
    }
}

impl From<WeiNewtype> for String {
    fn from(WeiNewtype(amount): WeiNewtype) -> Self {
        amount.to_string()
    }
}

impl FromStr for WeiNewtype {
    type Err = ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<BigUint>().map(WeiNewtype)
    }
}

impl TryFrom<String> for WeiNewtype {
    type Error = ParseBigIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse::<WeiNewtype>()
    }
}

impl From<u128> for WeiNewtype {
    fn from(amount: u128) -> Self {
        WeiNewtype(BigUint::from(amount))
    }
}

impl From<BigUint> for WeiNewtype {
    fn from(amount: BigUint) -> Self {
        WeiNewtype(amount)
    }
}

impl From<GweiNewtype> for WeiNewtype {
    fn from(GweiNewtype(amount): GweiNewtype) -> Self {
        WeiNewtype(BigUint::from(amount) * WEI_PER_GWEI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wei_from_gwei_test() {
        assert_eq!(
            WeiNewtype::from(GweiNewtype(320_000_000_000_000)),
            WeiNewtype::from_eth(320_000)
        );
    }

    #[test]
    fn wei_serialize_as_string_test() {
        let wei = WeiNewtype::from_eth(42_000_000);
        assert_eq!(
            serde_json::to_string(&wei).unwrap(),
            r#""42000000000000000000000000""#
        );
    }

    #[test]
    fn wei_deserialize_from_string_test() {
        let wei: WeiNewtype = serde_json::from_str(r#""11143518000000000000000000""#).unwrap();
        assert_eq!(wei, WeiNewtype::from_eth(11_143_518));
    }

    #[test]
    fn wei_deserialize_rejects_garbage_test() {
        assert!(serde_json::from_str::<WeiNewtype>(r#""12 wei""#).is_err());
    }
}
