mod node;
mod withdrawals;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub use node::BeaconNodeHttp;

pub use withdrawals::WithdrawalLedgerPostgres;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
