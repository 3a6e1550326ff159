//! Talks to a consensus layer node. Finality comes from the standard beacon API, participation
//! from the Lighthouse specific validator inclusion API.
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use backoff::{self, ExponentialBackoffBuilder};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info};

use crate::{
    json_codecs::from_u64_string,
    performance::TimedExt,
    sources::{FinalizedEpochOracle, ValidatorParticipationSource},
    units::GweiNewtype,
};

use super::Epoch;

// Retrying beyond this is pointless, the supply engine gives up on a source well before.
const MAX_RETRY_DURATION: Duration = Duration::from_secs(4);

const SECONDS_PER_SLOT: i64 = 12;
const SLOTS_PER_EPOCH: i64 = 32;

#[derive(Deserialize)]
struct Genesis {
    #[serde(deserialize_with = "from_u64_string")]
    genesis_time: u64,
}

#[derive(Deserialize)]
struct GenesisEnvelope {
    data: Genesis,
}

#[derive(Deserialize)]
struct FinalityCheckpoint {
    #[serde(deserialize_with = "from_u64_string")]
    epoch: u64,
    #[allow(dead_code)]
    root: String,
}

#[derive(Deserialize)]
struct FinalityCheckpoints {
    finalized: FinalityCheckpoint,
}

#[derive(Deserialize)]
struct CheckpointEnvelope {
    data: FinalityCheckpoints,
}

#[derive(Deserialize)]
struct GlobalValidatorInclusion {
    current_epoch_active_gwei: GweiNewtype,
}

#[derive(Deserialize)]
struct GlobalValidatorInclusionEnvelope {
    data: GlobalValidatorInclusion,
}

#[derive(Clone, Debug)]
pub struct BeaconNodeHttp {
    beacon_url: String,
    client: reqwest::Client,
    max_finality_lag_epochs: u64,
}

/// The epoch the wall clock is in, given the chain's genesis time.
fn epoch_at(genesis_time: DateTime<Utc>, at: DateTime<Utc>) -> Epoch {
    let seconds_since_genesis = (at - genesis_time).num_seconds().max(0);
    Epoch((seconds_since_genesis / (SECONDS_PER_SLOT * SLOTS_PER_EPOCH)) as u64)
}

fn check_finality_lag(finalized: Epoch, current: Epoch, max_lag: u64) -> Result<Epoch> {
    let lag = current.0.saturating_sub(finalized.0);
    if lag > max_lag {
        Err(anyhow!(
            "finalized epoch {finalized} is stale, {lag} epochs behind current epoch {current}, allowed lag is {max_lag}"
        ))
    } else {
        Ok(finalized)
    }
}

impl BeaconNodeHttp {
    pub fn new(beacon_url: &str, max_finality_lag_epochs: u64) -> Self {
        Self {
            beacon_url: beacon_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            max_finality_lag_epochs,
        }
    }

    fn make_genesis_url(&self) -> String {
        format!("{}/eth/v1/beacon/genesis", self.beacon_url)
    }

    async fn get_genesis_time(&self) -> Result<DateTime<Utc>> {
        let url = self.make_genesis_url();
        let envelope = self
            .get_json::<GenesisEnvelope>(&url)
            .timed("get_genesis")
            .await?;
        let genesis_time = envelope.data.genesis_time;

        i64::try_from(genesis_time)
            .ok()
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
            .ok_or_else(|| anyhow!("genesis time {genesis_time} is not a valid timestamp"))
    }

    fn make_finality_checkpoint_url(&self) -> String {
        format!(
            "{}/eth/v1/beacon/states/head/finality_checkpoints",
            self.beacon_url
        )
    }

    fn make_validator_inclusion_url(&self, epoch: Epoch) -> String {
        format!(
            "{}/lighthouse/validator_inclusion/{epoch}/global",
            self.beacon_url
        )
    }

    /// Server errors and failed connections are retried, anything else the node says is final.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(MAX_RETRY_DURATION))
            .build();

        backoff::future::retry(backoff, || async {
            let res = self.client.get(url).send().await.map_err(|err| {
                info!(%err, url, "error sending request to beacon node, retrying");
                backoff::Error::transient(anyhow::Error::from(err))
            })?;

            match res.status() {
                StatusCode::OK => res
                    .json::<T>()
                    .await
                    .map_err(|err| backoff::Error::permanent(anyhow::Error::from(err))),
                status if status.is_server_error() => {
                    info!(%status, url, "beacon node server error, retrying");
                    Err(backoff::Error::transient(anyhow!(
                        "beacon node responded with server error. status = {} url = {}",
                        status,
                        url
                    )))
                }
                status => Err(backoff::Error::permanent(anyhow!(
                    "beacon node request failed. status = {} url = {}",
                    status,
                    url
                ))),
            }
        })
        .await
    }
}

#[async_trait]
impl FinalizedEpochOracle for BeaconNodeHttp {
    async fn latest_finalized_epoch(&self) -> Result<Epoch> {
        let url = self.make_finality_checkpoint_url();
        let envelope = self
            .get_json::<CheckpointEnvelope>(&url)
            .timed("get_last_finality_checkpoint")
            .await?;

        let finalized = Epoch(envelope.data.finalized.epoch);
        let current = epoch_at(self.get_genesis_time().await?, Utc::now());
        debug!(%finalized, %current, "got last finalized epoch");

        check_finality_lag(finalized, current, self.max_finality_lag_epochs)
    }
}

#[async_trait]
impl ValidatorParticipationSource for BeaconNodeHttp {
    async fn eligible_stake(&self, epoch: Epoch) -> Result<GweiNewtype> {
        let url = self.make_validator_inclusion_url(epoch);
        let envelope = self
            .get_json::<GlobalValidatorInclusionEnvelope>(&url)
            .timed("get_validator_inclusion")
            .await?;

        Ok(envelope.data.current_epoch_active_gwei)
    }
}
