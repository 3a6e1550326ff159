//! Per network constants the supply formulas are parameterized by. A profile is built once at
//! startup, either from the built-in table or from a JSON file, and shared read-only afterwards.
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    env::EnvConfig,
    execution_chain::Address,
    supply::{FormulaVariant, SupplyTerm},
    units::WeiNewtype,
};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no built-in profile for network {0}")]
    UnknownNetwork(String),
    #[error("failed to read network profile {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse network profile {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("network profile {name} uses the {variant:?} formula, which needs {term}, but sets no deposit contract address")]
    MissingDepositContract {
        name: String,
        variant: FormulaVariant,
        term: SupplyTerm,
    },
    #[error("network profile {name} has a foundation allocation larger than its genesis supply")]
    FoundationExceedsGenesis { name: String },
}

/// How the supply endpoint wraps its payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseEnvelope {
    /// `{ "circulating_supply": "..", "total_supply": ".." }`
    #[default]
    Flat,
    /// `{ "status": "OK", "data": { "total_supply": ".." } }`
    Wrapped,
}

/// All amounts in wei.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkProfile {
    pub name: String,
    pub genesis_total_supply: WeiNewtype,
    #[serde(default)]
    pub genesis_foundation_supply: WeiNewtype,
    #[serde(default)]
    pub deposit_contract_address: Option<Address>,
    #[serde(default)]
    pub permanently_lost_amount: Option<WeiNewtype>,
    pub formula_variant: FormulaVariant,
    #[serde(default)]
    pub response_envelope: ResponseEnvelope,
}

// From https://github.com/lukso-network/network-configs/blob/main/mainnet/shared/genesis.json
const LUKSO_GENESIS_TOTAL_SUPPLY_LYX: u64 = 42_000_000;
const LUKSO_GENESIS_FOUNDATION_SUPPLY_LYX: u64 = 11_143_518;
const LUKSO_DEPOSIT_CONTRACT: &str = "0xCAfe00000000000000000000000000000000CAfe";
// The deposit contract holds 320k LYX that can never leave it.
const LUKSO_PERMANENTLY_LOST_LYX: u64 = 320_000;

impl NetworkProfile {
    pub fn built_in(network: &str) -> Result<Self, ProfileError> {
        let profile = match network {
            "lukso" => NetworkProfile {
                name: network.to_string(),
                genesis_total_supply: WeiNewtype::from_eth(LUKSO_GENESIS_TOTAL_SUPPLY_LYX),
                genesis_foundation_supply: WeiNewtype::from_eth(
                    LUKSO_GENESIS_FOUNDATION_SUPPLY_LYX,
                ),
                deposit_contract_address: LUKSO_DEPOSIT_CONTRACT.parse().ok(),
                permanently_lost_amount: Some(WeiNewtype::from_eth(LUKSO_PERMANENTLY_LOST_LYX)),
                formula_variant: FormulaVariant::Full,
                response_envelope: ResponseEnvelope::Wrapped,
            },
            "lukso-circulating" => NetworkProfile {
                name: network.to_string(),
                genesis_total_supply: WeiNewtype::from_eth(LUKSO_GENESIS_TOTAL_SUPPLY_LYX),
                genesis_foundation_supply: WeiNewtype::from_eth(
                    LUKSO_GENESIS_FOUNDATION_SUPPLY_LYX,
                ),
                deposit_contract_address: None,
                permanently_lost_amount: None,
                formula_variant: FormulaVariant::Simple,
                response_envelope: ResponseEnvelope::Flat,
            },
            unknown => return Err(ProfileError::UnknownNetwork(unknown.to_string())),
        };

        profile.validate()
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ProfileError> {
        let path_text = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path_text.clone(),
            source,
        })?;
        let profile: NetworkProfile =
            serde_json::from_str(&text).map_err(|source| ProfileError::Parse {
                path: path_text,
                source,
            })?;

        profile.validate()
    }

    /// A profile file, when configured, takes precedence over the built-in table.
    pub fn from_env(env_config: &EnvConfig) -> Result<Self, ProfileError> {
        let profile = match &env_config.network_profile_path {
            Some(path) => Self::from_json_file(Path::new(path))?,
            None => Self::built_in(&env_config.network)?,
        };

        info!(
            network = %profile.name,
            formula = ?profile.formula_variant,
            envelope = ?profile.response_envelope,
            "loaded network profile"
        );

        Ok(profile)
    }

    fn validate(self) -> Result<Self, ProfileError> {
        let formula = self.formula_variant.formula();
        if formula.requires(SupplyTerm::DepositContractBalance)
            && self.deposit_contract_address.is_none()
        {
            return Err(ProfileError::MissingDepositContract {
                name: self.name,
                variant: self.formula_variant,
                term: SupplyTerm::DepositContractBalance,
            });
        }

        if self.genesis_foundation_supply > self.genesis_total_supply {
            return Err(ProfileError::FoundationExceedsGenesis { name: self.name });
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn built_in_lukso_test() {
        let profile = NetworkProfile::built_in("lukso").unwrap();
        assert_eq!(profile.formula_variant, FormulaVariant::Full);
        assert_eq!(profile.response_envelope, ResponseEnvelope::Wrapped);
        assert_eq!(
            profile.deposit_contract_address.unwrap().to_string(),
            "0xcafe00000000000000000000000000000000cafe"
        );
        assert_eq!(
            profile.permanently_lost_amount,
            Some(WeiNewtype::from_eth(320_000))
        );
    }

    #[test]
    fn built_in_lukso_circulating_test() {
        let profile = NetworkProfile::built_in("lukso-circulating").unwrap();
        assert_eq!(profile.formula_variant, FormulaVariant::Simple);
        assert_eq!(profile.response_envelope, ResponseEnvelope::Flat);
        assert_eq!(
            profile.genesis_foundation_supply,
            WeiNewtype::from_eth(11_143_518)
        );
    }

    #[test]
    fn built_in_unknown_test() {
        assert!(matches!(
            NetworkProfile::built_in("dogecoin"),
            Err(ProfileError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn from_json_file_test() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "testnet",
                "genesis_total_supply": "120000000000000000000000000",
                "deposit_contract_address": "0x4242424242424242424242424242424242424242",
                "formula_variant": "full",
                "response_envelope": "wrapped"
            }}"#
        )
        .unwrap();

        let profile = NetworkProfile::from_json_file(file.path()).unwrap();

        assert_eq!(profile.name, "testnet");
        assert_eq!(
            profile.genesis_total_supply,
            WeiNewtype::from_eth(120_000_000)
        );
        assert_eq!(profile.genesis_foundation_supply, WeiNewtype::default());
        assert_eq!(profile.permanently_lost_amount, None);
        assert_eq!(profile.formula_variant, FormulaVariant::Full);
    }

    #[test]
    fn from_json_file_missing_deposit_contract_test() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "testnet",
                "genesis_total_supply": "120000000000000000000000000",
                "formula_variant": "full"
            }}"#
        )
        .unwrap();

        assert!(matches!(
            NetworkProfile::from_json_file(file.path()),
            Err(ProfileError::MissingDepositContract { .. })
        ));
    }

    #[test]
    fn from_json_file_foundation_exceeds_genesis_test() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "testnet",
                "genesis_total_supply": "10",
                "genesis_foundation_supply": "11",
                "formula_variant": "simple"
            }}"#
        )
        .unwrap();

        assert!(matches!(
            NetworkProfile::from_json_file(file.path()),
            Err(ProfileError::FoundationExceedsGenesis { .. })
        ));
    }

    #[test]
    fn from_json_file_not_found_test() {
        assert!(matches!(
            NetworkProfile::from_json_file(Path::new("/definitely/not/here.json")),
            Err(ProfileError::Read { .. })
        ));
    }
}
