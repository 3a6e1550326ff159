use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use futures::join;
use tracing::{debug, info, warn};

use crate::{
    beacon_chain::{BeaconNodeHttp, WithdrawalLedgerPostgres},
    burn_sums::BurnTrackerPostgres,
    db,
    env::EnvConfig,
    execution_chain::ExecutionNodeHttp,
    network_profile::NetworkProfile,
    sources::{
        self, AddressBalanceIndex, BurnTracker, FinalizedEpochOracle, SourceName, Unconfigured,
        ValidatorParticipationSource, WithdrawalLedger,
    },
    units::WeiNewtype,
};

use super::{SupplyError, SupplySnapshot, SupplyTerm};

#[derive(Clone)]
pub struct Sources {
    pub epoch_oracle: Arc<dyn FinalizedEpochOracle>,
    pub withdrawal_ledger: Arc<dyn WithdrawalLedger>,
    pub validator_participation: Arc<dyn ValidatorParticipationSource>,
    pub address_balance_index: Arc<dyn AddressBalanceIndex>,
    pub burn_tracker: Arc<dyn BurnTracker>,
}

impl Sources {
    pub async fn from_env(env_config: &EnvConfig, app_name: &str) -> Result<Self> {
        let beacon_node = Arc::new(BeaconNodeHttp::new(
            &env_config.beacon_url,
            env_config.max_finality_lag_epochs,
        ));
        let db_pool = db::get_db_pool(&env_config.db_url, app_name).await?;

        let address_balance_index: Arc<dyn AddressBalanceIndex> = match &env_config.execution_url
        {
            Some(execution_url) => Arc::new(ExecutionNodeHttp::new(execution_url)),
            None => Arc::new(Unconfigured {
                env_var: "EXECUTION_URL",
            }),
        };

        Ok(Self {
            epoch_oracle: beacon_node.clone(),
            withdrawal_ledger: Arc::new(WithdrawalLedgerPostgres::new(db_pool.clone())),
            validator_participation: beacon_node,
            address_balance_index,
            burn_tracker: Arc::new(BurnTrackerPostgres::new(db_pool)),
        })
    }
}

/// The fetched, smallest unit amounts a formula is evaluated over. `None` means not requested.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupplyInputs {
    pub total_withdrawn: Option<WeiNewtype>,
    pub validator_eligible_stake: Option<WeiNewtype>,
    pub deposit_contract_balance: Option<WeiNewtype>,
    pub cumulative_burned: Option<WeiNewtype>,
}

/// Only runs `request` when `required`, so sources for terms outside the formula are never called.
async fn fetch_if<T, F, Fut>(
    required: bool,
    adapter: SourceName,
    timeout: Duration,
    request: F,
) -> Option<Result<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if required {
        Some(sources::with_timeout(adapter, timeout, request()).await)
    } else {
        None
    }
}

fn into_input<T>(
    term: SupplyTerm,
    fetched: Option<Result<T>>,
) -> Result<Option<WeiNewtype>, SupplyError>
where
    T: Into<WeiNewtype>,
{
    match fetched {
        None => Ok(None),
        Some(Ok(amount)) => {
            let amount: WeiNewtype = amount.into();
            debug!(%term, %amount, "fetched supply term");
            Ok(Some(amount))
        }
        Some(Err(error)) => {
            warn!(%term, "failed to fetch supply term: {error:#}");
            Err(SupplyError::RequiredTermUnavailable {
                term,
                source: error,
            })
        }
    }
}

#[derive(Clone)]
pub struct SupplyAggregator {
    sources: Sources,
    timeout: Duration,
}

impl SupplyAggregator {
    pub fn new(sources: Sources, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    /// Computes total and circulating supply for `profile` as of the latest finalized epoch. Any
    /// term the profile's formula needs that can't be fetched fails the whole computation.
    pub async fn compute(&self, profile: &NetworkProfile) -> Result<SupplySnapshot, SupplyError> {
        let formula = profile.formula_variant.formula();
        let timeout = self.timeout;

        let as_of_epoch = sources::with_timeout(
            SourceName::FinalizedEpochOracle,
            timeout,
            self.sources.epoch_oracle.latest_finalized_epoch(),
        )
        .await
        .map_err(|error| {
            warn!("failed to get latest finalized epoch: {error:#}");
            SupplyError::EpochUnavailable(error)
        })?;

        debug!(%as_of_epoch, network = %profile.name, "computing supply");

        let deposit_contract_address = profile.deposit_contract_address.as_ref();

        let (withdrawn, validator_stake, deposit_contract_balance, burned_fees) = join!(
            fetch_if(
                formula.requires(SupplyTerm::Withdrawn),
                SourceName::WithdrawalLedger,
                timeout,
                || self.sources.withdrawal_ledger.total_amount_withdrawn(),
            ),
            fetch_if(
                formula.requires(SupplyTerm::ValidatorStake),
                SourceName::ValidatorParticipation,
                timeout,
                || self.sources.validator_participation.eligible_stake(as_of_epoch),
            ),
            fetch_if(
                formula.requires(SupplyTerm::DepositContractBalance),
                SourceName::AddressBalanceIndex,
                timeout,
                || async move {
                    match deposit_contract_address {
                        Some(address) => {
                            self.sources.address_balance_index.balance_of(address).await
                        }
                        None => Err(anyhow!(
                            "network profile {} has no deposit contract address",
                            profile.name
                        )),
                    }
                },
            ),
            fetch_if(
                formula.requires(SupplyTerm::BurnedFees),
                SourceName::BurnTracker,
                timeout,
                || self.sources.burn_tracker.cumulative_burned(),
            ),
        );

        // Fetched terms appear in this order in every formula, so the first error here is the
        // first failing term in formula order.
        let inputs = SupplyInputs {
            total_withdrawn: into_input(SupplyTerm::Withdrawn, withdrawn)?,
            validator_eligible_stake: into_input(SupplyTerm::ValidatorStake, validator_stake)?,
            deposit_contract_balance: into_input(
                SupplyTerm::DepositContractBalance,
                deposit_contract_balance,
            )?,
            cumulative_burned: into_input(SupplyTerm::BurnedFees, burned_fees)?,
        };

        let totals = formula.evaluate(profile, &inputs)?;
        let snapshot = SupplySnapshot::new(totals.circulating, totals.total, as_of_epoch)?;

        info!(
            network = %profile.name,
            %as_of_epoch,
            total_supply = %snapshot.total_supply(),
            circulating_supply = %snapshot.circulating_supply(),
            "computed supply"
        );

        Ok(snapshot)
    }
}
