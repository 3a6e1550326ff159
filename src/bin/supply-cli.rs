use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;

use supply_accounting::{
    beacon_chain::Epoch,
    env::ENV_CONFIG,
    log,
    network_profile::NetworkProfile,
    supply::{Sources, SupplyAggregator, SupplySnapshot},
    units::{self, WeiNewtype},
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputUnit {
    Wei,
    /// Rounded to the nearest gwei.
    Gwei,
    Eth,
}

/// Computes the supply of the configured network once and prints it as JSON.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Built-in network profile to use, overrides NETWORK.
    #[clap(long)]
    network: Option<String>,
    /// Denomination of the printed amounts.
    #[clap(long, value_enum, default_value = "wei")]
    unit: OutputUnit,
}

#[derive(Serialize)]
struct SupplyOutput {
    network: String,
    as_of_epoch: Epoch,
    circulating_supply: String,
    total_supply: String,
}

fn format_amount(amount: &WeiNewtype, unit: OutputUnit) -> Result<String> {
    let formatted = match unit {
        OutputUnit::Wei => amount.to_string(),
        OutputUnit::Gwei => units::wei_to_gwei_rounded(amount)?.to_string(),
        OutputUnit::Eth => units::wei_to_eth(amount)?.to_string(),
    };
    Ok(formatted)
}

fn output(
    profile: &NetworkProfile,
    snapshot: &SupplySnapshot,
    unit: OutputUnit,
) -> Result<SupplyOutput> {
    Ok(SupplyOutput {
        network: profile.name.clone(),
        as_of_epoch: snapshot.as_of_epoch(),
        circulating_supply: format_amount(snapshot.circulating_supply(), unit)?,
        total_supply: format_amount(snapshot.total_supply(), unit)?,
    })
}

#[tokio::main]
pub async fn main() -> Result<()> {
    log::init_with_env();

    let cli = Cli::parse();

    let profile = match cli.network {
        Some(network) => NetworkProfile::built_in(&network)?,
        None => NetworkProfile::from_env(&ENV_CONFIG)?,
    };
    let sources = Sources::from_env(&ENV_CONFIG, "supply-cli").await?;
    let aggregator = SupplyAggregator::new(sources, ENV_CONFIG.source_timeout);

    let snapshot = aggregator.compute(&profile).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&output(&profile, &snapshot, cli.unit)?)?
    );

    Ok(())
}
