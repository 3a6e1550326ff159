//! The data providers the supply engine reads from. Each is an external system with its own
//! failure modes; the engine only sees these traits. Every call goes through [`with_timeout`], a
//! call that doesn't finish in time fails the same way an erroring call does.
//!
//! Retrying is up to the implementations, the engine never retries.
use std::{fmt::Display, future::Future, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    beacon_chain::Epoch,
    execution_chain::Address,
    units::{GweiNewtype, WeiNewtype},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceName {
    AddressBalanceIndex,
    BurnTracker,
    FinalizedEpochOracle,
    ValidatorParticipation,
    WithdrawalLedger,
}

impl Display for SourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AddressBalanceIndex => "address-balance-index",
            Self::BurnTracker => "burn-tracker",
            Self::FinalizedEpochOracle => "finalized-epoch-oracle",
            Self::ValidatorParticipation => "validator-participation",
            Self::WithdrawalLedger => "withdrawal-ledger",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{adapter} did not respond within {timeout:?}")]
pub struct SourceTimeout {
    pub adapter: SourceName,
    pub timeout: Duration,
}

#[automock]
#[async_trait]
pub trait FinalizedEpochOracle: Send + Sync {
    async fn latest_finalized_epoch(&self) -> Result<Epoch>;
}

/// Cumulative amount withdrawn from the consensus layer, in Gwei.
#[automock]
#[async_trait]
pub trait WithdrawalLedger: Send + Sync {
    async fn total_amount_withdrawn(&self) -> Result<GweiNewtype>;
}

/// Total effective balance of validators that were active, i.e. able to vote, in `epoch`.
#[automock]
#[async_trait]
pub trait ValidatorParticipationSource: Send + Sync {
    async fn eligible_stake(&self, epoch: Epoch) -> Result<GweiNewtype>;
}

#[automock]
#[async_trait]
pub trait AddressBalanceIndex: Send + Sync {
    async fn balance_of(&self, address: &Address) -> Result<WeiNewtype>;
}

#[automock]
#[async_trait]
pub trait BurnTracker: Send + Sync {
    async fn cumulative_burned(&self) -> Result<WeiNewtype>;
}

/// Stands in for a source the environment provides no connection details for. Any network
/// profile whose formula needs it fails on that term instead of at startup.
pub struct Unconfigured {
    pub env_var: &'static str,
}

#[async_trait]
impl AddressBalanceIndex for Unconfigured {
    async fn balance_of(&self, address: &Address) -> Result<WeiNewtype> {
        Err(anyhow!(
            "can't look up balance of {address}, {} is not configured",
            self.env_var
        ))
    }
}

pub async fn with_timeout<T, F>(adapter: SourceName, timeout: Duration, request: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result.with_context(|| format!("{adapter} request failed")),
        Err(_) => Err(SourceTimeout { adapter, timeout }.into()),
    }
}
