pub mod beacon_chain;
mod burn_sums;
pub mod db;
pub mod env;
pub mod execution_chain;
mod health;
mod json_codecs;
pub mod log;
pub mod network_profile;
mod performance;
pub mod serve;
pub mod sources;
pub mod supply;
pub mod units;

pub use serve::start_server;
