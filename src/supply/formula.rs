//! Which terms make up a network's supply, and with which sign. Each formula variant is a fixed
//! list of terms per output; the aggregator asks a formula what it requires instead of knowing
//! about variants, so a new variant is a new table entry only.
use std::fmt::Display;

use enum_iterator::Sequence;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::{network_profile::NetworkProfile, units::WeiNewtype};

use super::{SupplyError, SupplyInputs};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Sequence)]
pub enum SupplyTerm {
    GenesisTotal,
    GenesisFoundation,
    Withdrawn,
    ValidatorStake,
    DepositContractBalance,
    BurnedFees,
    PermanentlyLost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Add,
    Subtract,
}

impl SupplyTerm {
    pub fn sign(&self) -> Sign {
        match self {
            Self::GenesisTotal | Self::Withdrawn | Self::ValidatorStake => Sign::Add,
            Self::GenesisFoundation
            | Self::DepositContractBalance
            | Self::BurnedFees
            | Self::PermanentlyLost => Sign::Subtract,
        }
    }

    /// Terms taken from the network profile rather than fetched from a source.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Self::GenesisTotal | Self::GenesisFoundation | Self::PermanentlyLost
        )
    }
}

impl Display for SupplyTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GenesisTotal => "genesis_total",
            Self::GenesisFoundation => "genesis_foundation",
            Self::Withdrawn => "withdrawn",
            Self::ValidatorStake => "validator_stake",
            Self::DepositContractBalance => "deposit_contract_balance",
            Self::BurnedFees => "burned_fees",
            Self::PermanentlyLost => "permanently_lost",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaVariant {
    /// Genesis allocation plus withdrawals.
    Simple,
    /// Genesis allocation plus withdrawals and active stake, less what sits in the deposit
    /// contract, was burned, or is lost for good.
    Full,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Formula {
    pub total: &'static [SupplyTerm],
    pub circulating: &'static [SupplyTerm],
}

// Additions come first so a running sum only goes negative when the end result would.
const SIMPLE: Formula = Formula {
    total: &[SupplyTerm::GenesisTotal, SupplyTerm::Withdrawn],
    circulating: &[
        SupplyTerm::GenesisTotal,
        SupplyTerm::GenesisFoundation,
        SupplyTerm::Withdrawn,
    ],
};

const FULL: Formula = Formula {
    total: &[
        SupplyTerm::GenesisTotal,
        SupplyTerm::Withdrawn,
        SupplyTerm::ValidatorStake,
        SupplyTerm::DepositContractBalance,
        SupplyTerm::BurnedFees,
        SupplyTerm::PermanentlyLost,
    ],
    circulating: &[
        SupplyTerm::GenesisTotal,
        SupplyTerm::Withdrawn,
        SupplyTerm::ValidatorStake,
        SupplyTerm::DepositContractBalance,
        SupplyTerm::BurnedFees,
        SupplyTerm::PermanentlyLost,
        SupplyTerm::GenesisFoundation,
    ],
};

impl FormulaVariant {
    pub fn formula(&self) -> &'static Formula {
        match self {
            Self::Simple => &SIMPLE,
            Self::Full => &FULL,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SupplyTotals {
    pub circulating: WeiNewtype,
    pub total: WeiNewtype,
}

impl Formula {
    pub fn requires(&self, term: SupplyTerm) -> bool {
        self.total.contains(&term) || self.circulating.contains(&term)
    }

    pub fn evaluate(
        &self,
        profile: &NetworkProfile,
        inputs: &SupplyInputs,
    ) -> Result<SupplyTotals, SupplyError> {
        let amount_of = |term: SupplyTerm| -> Result<WeiNewtype, SupplyError> {
            let amount = match term {
                SupplyTerm::GenesisTotal => Some(profile.genesis_total_supply.clone()),
                SupplyTerm::GenesisFoundation => Some(profile.genesis_foundation_supply.clone()),
                SupplyTerm::PermanentlyLost => Some(
                    profile
                        .permanently_lost_amount
                        .clone()
                        .unwrap_or_default(),
                ),
                SupplyTerm::Withdrawn => inputs.total_withdrawn.clone(),
                SupplyTerm::ValidatorStake => inputs.validator_eligible_stake.clone(),
                SupplyTerm::DepositContractBalance => inputs.deposit_contract_balance.clone(),
                SupplyTerm::BurnedFees => inputs.cumulative_burned.clone(),
            };

            amount.ok_or(SupplyError::TermNotFetched(term))
        };

        let total = sum_terms("total supply", self.total, amount_of)?;
        let circulating = sum_terms("circulating supply", self.circulating, amount_of)?;

        Ok(SupplyTotals { circulating, total })
    }
}

fn sum_terms(
    output: &str,
    terms: &[SupplyTerm],
    amount_of: impl Fn(SupplyTerm) -> Result<WeiNewtype, SupplyError>,
) -> Result<WeiNewtype, SupplyError> {
    let mut sum = BigInt::zero();

    for term in terms {
        let WeiNewtype(amount) = amount_of(*term)?;
        let amount = BigInt::from(amount);

        match term.sign() {
            Sign::Add => sum += amount,
            Sign::Subtract => sum -= amount,
        }

        if sum.is_negative() {
            return Err(SupplyError::NegativeResult {
                context: format!("{output} after subtracting {term}"),
                value: sum.to_string(),
            });
        }
    }

    // Not negative, checked above.
    sum.to_biguint()
        .map(WeiNewtype)
        .ok_or_else(|| SupplyError::NegativeResult {
            context: output.to_string(),
            value: sum.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use enum_iterator::all;

    use super::*;

    fn profile(variant: FormulaVariant, genesis_total: u64, foundation: u64) -> NetworkProfile {
        NetworkProfile {
            name: "test".to_string(),
            genesis_total_supply: WeiNewtype::from_eth(genesis_total),
            genesis_foundation_supply: WeiNewtype::from_eth(foundation),
            deposit_contract_address: "0x4242424242424242424242424242424242424242".parse().ok(),
            permanently_lost_amount: None,
            formula_variant: variant,
            response_envelope: Default::default(),
        }
    }

    fn full_inputs(withdrawn: u64, stake: u64, deposit: u64, burned: u64) -> SupplyInputs {
        SupplyInputs {
            total_withdrawn: Some(WeiNewtype::from_eth(withdrawn)),
            validator_eligible_stake: Some(WeiNewtype::from_eth(stake)),
            deposit_contract_balance: Some(WeiNewtype::from_eth(deposit)),
            cumulative_burned: Some(WeiNewtype::from_eth(burned)),
        }
    }

    #[test]
    fn simple_formula_test() {
        let profile = profile(FormulaVariant::Simple, 42_000_000, 11_143_518);
        let inputs = SupplyInputs {
            total_withdrawn: Some(WeiNewtype::from_eth(1_000_000)),
            ..SupplyInputs::default()
        };

        let totals = FormulaVariant::Simple
            .formula()
            .evaluate(&profile, &inputs)
            .unwrap();

        assert_eq!(totals.circulating, WeiNewtype::from_eth(32_856_482));
        assert_eq!(totals.total, WeiNewtype::from_eth(43_000_000));
    }

    #[test]
    fn full_formula_test() {
        let profile = profile(FormulaVariant::Full, 120_000_000, 0);
        let inputs = full_inputs(500_000, 2_000_000, 300_000, 150_000);

        let totals = FormulaVariant::Full
            .formula()
            .evaluate(&profile, &inputs)
            .unwrap();

        assert_eq!(totals.total, WeiNewtype::from_eth(122_050_000));
        assert_eq!(totals.circulating, WeiNewtype::from_eth(122_050_000));
    }

    #[test]
    fn full_formula_subtracts_foundation_and_lost_test() {
        let mut profile = profile(FormulaVariant::Full, 42_000_000, 11_143_518);
        profile.permanently_lost_amount = Some(WeiNewtype::from_eth(320_000));
        let inputs = full_inputs(1_000, 10_000_000, 10_500_000, 2_000);

        let totals = FormulaVariant::Full
            .formula()
            .evaluate(&profile, &inputs)
            .unwrap();

        // 42_000_000 + 1_000 + 10_000_000 - 10_500_000 - 2_000 - 320_000
        assert_eq!(totals.total, WeiNewtype::from_eth(41_179_000));
        assert_eq!(
            totals.circulating,
            WeiNewtype::from_eth(41_179_000 - 11_143_518)
        );
    }

    #[test]
    fn total_at_least_circulating_test() {
        let cases = [
            (FormulaVariant::Simple, 42_000_000, 11_143_518, 0, 0, 0, 0),
            (FormulaVariant::Simple, 42_000_000, 0, 5, 0, 0, 0),
            (FormulaVariant::Full, 120_000_000, 0, 500_000, 2_000_000, 300_000, 150_000),
            (FormulaVariant::Full, 42_000_000, 42_000_000, 0, 1, 0, 1),
            (FormulaVariant::Full, 42_000_000, 11_143_518, 7, 64, 32, 3),
        ];

        for (variant, genesis, foundation, withdrawn, stake, deposit, burned) in cases {
            let profile = profile(variant, genesis, foundation);
            let inputs = full_inputs(withdrawn, stake, deposit, burned);
            let totals = variant.formula().evaluate(&profile, &inputs).unwrap();
            assert!(totals.total >= totals.circulating);
        }
    }

    #[test]
    fn negative_sum_is_an_error_test() {
        let profile = profile(FormulaVariant::Full, 100, 0);
        let inputs = full_inputs(0, 0, 200, 0);

        let result = FormulaVariant::Full.formula().evaluate(&profile, &inputs);

        assert!(matches!(result, Err(SupplyError::NegativeResult { .. })));
    }

    #[test]
    fn missing_input_is_an_error_test() {
        let profile = profile(FormulaVariant::Full, 120_000_000, 0);
        let inputs = SupplyInputs {
            validator_eligible_stake: None,
            ..full_inputs(500_000, 0, 300_000, 150_000)
        };

        let result = FormulaVariant::Full.formula().evaluate(&profile, &inputs);

        assert!(matches!(
            result,
            Err(SupplyError::TermNotFetched(SupplyTerm::ValidatorStake))
        ));
    }

    #[test]
    fn every_variant_requires_withdrawals_test() {
        for variant in [FormulaVariant::Simple, FormulaVariant::Full] {
            assert!(variant.formula().requires(SupplyTerm::Withdrawn));
        }
    }

    #[test]
    fn simple_requires_no_consensus_terms_test() {
        let formula = FormulaVariant::Simple.formula();
        let fetched_terms = all::<SupplyTerm>()
            .filter(|term| !term.is_constant() && formula.requires(*term))
            .collect::<Vec<_>>();

        assert_eq!(fetched_terms, vec![SupplyTerm::Withdrawn]);
    }

    #[test]
    fn circulating_is_total_minus_foundation_test() {
        for variant in [FormulaVariant::Simple, FormulaVariant::Full] {
            let formula = variant.formula();
            let mut total_with_foundation = formula.total.to_vec();
            total_with_foundation.push(SupplyTerm::GenesisFoundation);
            let mut circulating = formula.circulating.to_vec();
            circulating.sort_by_key(|term| *term as u8);
            total_with_foundation.sort_by_key(|term| *term as u8);
            assert_eq!(circulating, total_with_foundation);
        }
    }
}
