//! # Burn Sums
//! Cumulative base fee burn, the amount permanently removed from supply since fee burning began.

mod store;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::{performance::TimedExt, sources::BurnTracker, units::WeiNewtype};

use self::store::BurnSumStore;

pub struct BurnTrackerPostgres {
    store: BurnSumStore,
}

impl BurnTrackerPostgres {
    pub fn new(db_pool: PgPool) -> Self {
        Self {
            store: BurnSumStore::new(db_pool),
        }
    }
}

#[async_trait]
impl BurnTracker for BurnTrackerPostgres {
    async fn cumulative_burned(&self) -> Result<WeiNewtype> {
        let burn_sum = self
            .store
            .burn_sum_all_blocks()
            .timed("burn_sum_all_blocks")
            .await?;

        debug!(%burn_sum, "summed burn");

        Ok(burn_sum)
    }
}
