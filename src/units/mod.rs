//! Amounts of the native token and conversions between its denominations.
//!
//! Everything that affects a supply figure stays in integer wei (`WeiNewtype`, backed by a
//! `BigUint`) or in a fixed-point `Decimal`. Rounding only happens when crossing a unit boundary,
//! never on an accumulated value.
mod gwei;
mod wei;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

pub use gwei::GweiNewtype;
pub use wei::WeiNewtype;

pub const WEI_PER_GWEI: u64 = 1_000_000_000;

pub const GWEI_PER_ETH: u64 = 1_000_000_000;

pub const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Wei,
    Gwei,
    /// The whole-coin unit, 10^18 wei.
    Eth,
}

impl Unit {
    fn decimals(&self) -> u32 {
        match self {
            Unit::Wei => 0,
            Unit::Gwei => 9,
            Unit::Eth => 18,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("cannot convert negative amount {0} to wei")]
    Negative(Decimal),
    #[error("{amount} wei does not fit when expressed in {unit:?}")]
    OutOfRange { amount: WeiNewtype, unit: Unit },
}

fn pow10(exponent: u32) -> BigUint {
    BigUint::from(10u32).pow(exponent)
}

fn div_round_half_up(numerator: BigUint, denominator: &BigUint) -> BigUint {
    (numerator + denominator / 2u32) / denominator
}

/// Converts an amount denominated in `from` into wei. Precision beyond one wei is rounded half up.
pub fn to_wei(amount: Decimal, from: Unit) -> Result<WeiNewtype, UnitError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitError::Negative(amount));
    }

    // A Decimal is mantissa * 10^-scale.
    let mantissa = BigUint::from(amount.mantissa().unsigned_abs());
    let scaled = mantissa * pow10(from.decimals());
    let wei = div_round_half_up(scaled, &pow10(amount.scale()));

    Ok(WeiNewtype(wei))
}

/// Expresses a wei amount in whole coins. Exact, as long as the amount fits a 96 bit mantissa
/// (~79 billion coins).
pub fn wei_to_eth(wei: &WeiNewtype) -> Result<Decimal, UnitError> {
    let out_of_range = || UnitError::OutOfRange {
        amount: wei.clone(),
        unit: Unit::Eth,
    };

    let mantissa = wei.0.to_i128().ok_or_else(out_of_range)?;
    let eth = Decimal::try_from_i128_with_scale(mantissa, Unit::Eth.decimals())
        .map_err(|_| out_of_range())?;

    Ok(eth.normalize())
}

/// Converts wei to gwei, rounding half up at the boundary.
pub fn wei_to_gwei_rounded(wei: &WeiNewtype) -> Result<GweiNewtype, UnitError> {
    div_round_half_up(wei.0.clone(), &BigUint::from(WEI_PER_GWEI))
        .to_u64()
        .map(GweiNewtype)
        .ok_or_else(|| UnitError::OutOfRange {
            amount: wei.clone(),
            unit: Unit::Gwei,
        })
}
