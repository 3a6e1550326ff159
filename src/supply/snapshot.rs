use serde::Serialize;

use crate::{beacon_chain::Epoch, units::WeiNewtype};

use super::SupplyError;

/// A consistent supply figure as of a finalized epoch. Only constructible through [`Self::new`],
/// which guarantees `total_supply >= circulating_supply`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SupplySnapshot {
    circulating_supply: WeiNewtype,
    total_supply: WeiNewtype,
    as_of_epoch: Epoch,
}

impl SupplySnapshot {
    pub fn new(
        circulating_supply: WeiNewtype,
        total_supply: WeiNewtype,
        as_of_epoch: Epoch,
    ) -> Result<Self, SupplyError> {
        if circulating_supply > total_supply {
            return Err(SupplyError::NegativeResult {
                context: "total supply minus circulating supply".to_string(),
                value: format!("-{}", circulating_supply.0 - &total_supply.0),
            });
        }

        Ok(Self {
            circulating_supply,
            total_supply,
            as_of_epoch,
        })
    }

    pub fn circulating_supply(&self) -> &WeiNewtype {
        &self.circulating_supply
    }

    pub fn total_supply(&self) -> &WeiNewtype {
        &self.total_supply
    }

    pub fn as_of_epoch(&self) -> Epoch {
        self.as_of_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_test() {
        let snapshot = SupplySnapshot::new(
            WeiNewtype::from_eth(32_856_482),
            WeiNewtype::from_eth(43_000_000),
            Epoch(1_000),
        )
        .unwrap();

        assert_eq!(snapshot.total_supply(), &WeiNewtype::from_eth(43_000_000));
        assert_eq!(snapshot.as_of_epoch(), Epoch(1_000));
    }

    #[test]
    fn circulating_exceeds_total_test() {
        let result = SupplySnapshot::new(
            WeiNewtype::from(11u128),
            WeiNewtype::from(10u128),
            Epoch(1),
        );

        match result {
            Err(SupplyError::NegativeResult { value, .. }) => assert_eq!(value, "-1"),
            other => panic!("expected a negative result error, got {other:?}"),
        }
    }
}
