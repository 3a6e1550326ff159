//! Fns to read variables from the environment more conveniently, and the config the binaries
//! build from it once at startup.

use std::{env, time::Duration};

use lazy_static::lazy_static;
use tracing::debug;

const SECRET_LOG_BLACKLIST: [&str; 1] = ["DATABASE_URL"];

const DEFAULT_NETWORK: &str = "lukso";

const DEFAULT_PORT: &str = "3002";

const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 5_000;

// Finality normally trails the current epoch by two.
const DEFAULT_MAX_FINALITY_LAG_EPOCHS: u64 = 8;

lazy_static! {
    pub static ref ENV_CONFIG: EnvConfig = get_env_config();
}

fn obfuscate_if_secret(blacklist: &[&str], key: &str, value: &str) -> String {
    if blacklist.contains(&key) {
        let mut last_four = value.to_string();
        last_four.drain(0..value.len().saturating_sub(4));
        format!("****{last_four}")
    } else {
        value.to_string()
    }
}

/// Get an environment variable, encoding found or missing as Option, and panic otherwise.
pub fn get_env_var(key: &str) -> Option<String> {
    let var = match env::var(key) {
        Err(env::VarError::NotPresent) => None,
        Err(e) => panic!("{e}"),
        Ok(var) => Some(var),
    };

    if let Some(ref existing_var) = var {
        let output = obfuscate_if_secret(&SECRET_LOG_BLACKLIST, key, existing_var);
        debug!("env var {key}: {output}");
    } else {
        debug!("env var {key} requested but not found")
    };

    var
}

pub fn get_env_bool(key: &str) -> Option<bool> {
    get_env_var(key).map(|var| match var.to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        "t" => true,
        "f" => false,
        "1" => true,
        "0" => false,
        str => panic!("invalid bool value {str} for {key}"),
    })
}

pub fn get_env_duration_ms(key: &str) -> Option<Duration> {
    get_env_var(key).map(|var| match var.parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => panic!("invalid millisecond value {var} for {key}"),
    })
}

pub fn get_env_u64(key: &str) -> Option<u64> {
    get_env_var(key).map(|var| match var.parse::<u64>() {
        Ok(number) => number,
        Err(_) => panic!("invalid number {var} for {key}"),
    })
}

pub struct EnvConfig {
    pub beacon_url: String,
    pub bind_public_interface: bool,
    pub db_url: String,
    /// Only networks whose formula subtracts the deposit contract balance need an execution node.
    pub execution_url: Option<String>,
    /// How many epochs finality may trail the wall clock before the finalized epoch is stale.
    pub max_finality_lag_epochs: u64,
    pub network: String,
    pub network_profile_path: Option<String>,
    pub port: String,
    pub source_timeout: Duration,
}

pub fn get_env_config() -> EnvConfig {
    EnvConfig {
        beacon_url: get_env_var("BEACON_URL").expect("BEACON_URL is required"),
        bind_public_interface: get_env_bool("BIND_PUBLIC_INTERFACE").unwrap_or(true),
        db_url: get_env_var("DATABASE_URL").expect("DATABASE_URL is required"),
        execution_url: get_env_var("EXECUTION_URL"),
        max_finality_lag_epochs: get_env_u64("MAX_FINALITY_LAG_EPOCHS")
            .unwrap_or(DEFAULT_MAX_FINALITY_LAG_EPOCHS),
        network: get_env_var("NETWORK").unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
        network_profile_path: get_env_var("NETWORK_PROFILE_PATH"),
        port: get_env_var("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string()),
        source_timeout: get_env_duration_ms("SOURCE_TIMEOUT_MS")
            .unwrap_or(Duration::from_millis(DEFAULT_SOURCE_TIMEOUT_MS)),
    }
}
