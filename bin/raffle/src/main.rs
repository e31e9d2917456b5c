//! raffle deploys a VRF raffle contract, with a mock coordinator and a funded
//! subscription on local development chains.

mod cli;

use std::path::Path;

use alloy_core::primitives::utils::format_ether;
use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};

use cli::{Cli, Command, DeployArgs, EtherscanArgs};
use raffle_deploy::{
    ArtifactStore, DeploymentReport, DeploymentStore, EtherscanConfig, EtherscanVerifier,
    NetworkConfig, NetworkProfile, Pipeline, RpcChain, SubscriptionSource,
    etherscan::{DEFAULT_MAX_STATUS_POLLS, DEFAULT_STATUS_POLL_INTERVAL, default_api_url},
    rpc,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Deploy(args) => deploy(&config, args).await,
        Command::Networks => {
            println!("{}", networks_table(&config));
            Ok(())
        }
    }
}

/// Built-in defaults, overridden by the TOML file when one is given.
fn load_config(path: Option<&Path>) -> Result<NetworkConfig> {
    let mut figment = Figment::from(Serialized::defaults(NetworkConfig::default()));

    if let Some(path) = path {
        tracing::info!(config_path = %path.display(), "Loading configuration file...");
        figment = figment.merge(Toml::file_exact(path));
    }

    figment.extract().context("Failed to load configuration")
}

async fn deploy(config: &NetworkConfig, args: DeployArgs) -> Result<()> {
    let client = rpc::create_client()?;
    let chain_id = rpc::chain_id(&client, args.rpc_url.as_str())
        .await
        .with_context(|| format!("Failed to reach {}", args.rpc_url))?;

    if let Some(expected) = args.chain_id.filter(|expected| *expected != chain_id) {
        anyhow::bail!(
            "Node at {} reports chain id {}, expected {}",
            args.rpc_url,
            chain_id,
            expected
        );
    }

    let profile = config.profile(chain_id)?;
    let chain = RpcChain::new(
        args.rpc_url.clone(),
        ArtifactStore::new(args.artifacts.clone()),
        DeploymentStore::new(&args.deployments, &profile.name),
    )?;

    let deployer = match args.deployer {
        Some(deployer) => deployer,
        None => chain.default_account().await?,
    };

    let verifier = build_verifier(&args.etherscan, profile);

    tracing::info!(
        rpc_url = %args.rpc_url,
        deployments = %chain.store().dir().display(),
        "Connected to node"
    );

    let report = Pipeline::new(config, &chain, &chain, verifier.as_ref(), deployer)
        .tags(args.tags)
        .run(chain_id)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report_table(&report));
    }

    Ok(())
}

/// The block explorer verifier of the run, if verification can be attempted.
///
/// Incomplete settings only disable verification: the pipeline then records
/// it as skipped and the deployment goes ahead.
fn build_verifier(args: &EtherscanArgs, profile: &NetworkProfile) -> Option<EtherscanVerifier> {
    if !profile.is_publicly_verifiable() {
        return None;
    }

    match etherscan_verifier(args, profile.chain_id) {
        Ok(verifier) => verifier,
        Err(err) => {
            tracing::warn!(
                network = %profile.name,
                error = %format!("{:#}", err),
                "Verification settings are incomplete, verification disabled"
            );
            None
        }
    }
}

fn etherscan_verifier(args: &EtherscanArgs, chain_id: u64) -> Result<Option<EtherscanVerifier>> {
    let Some(api_key) = args.etherscan_api_key.clone() else {
        return Ok(None);
    };

    let api_url = match &args.etherscan_api_url {
        Some(url) => url.clone(),
        None => default_api_url(chain_id)
            .with_context(|| {
                format!(
                    "No known Etherscan endpoint for chain id {}; pass --etherscan-api-url",
                    chain_id
                )
            })?
            .parse()?,
    };

    let source_path = args
        .verify_source
        .clone()
        .context("--verify-source is required when an Etherscan API key is set")?;
    let compiler_version = args
        .compiler_version
        .clone()
        .context("--compiler-version is required when an Etherscan API key is set")?;

    let verifier = EtherscanVerifier::new(EtherscanConfig {
        api_url,
        api_key,
        source_path,
        contract_name: args.contract_name.clone(),
        compiler_version,
        poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
        max_polls: DEFAULT_MAX_STATUS_POLLS,
    })?;

    Ok(Some(verifier))
}

fn report_table(report: &DeploymentReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Item", "Value"]);

    table.add_row(vec!["Network".to_string(), report.network.clone()]);
    table.add_row(vec!["Chain id".to_string(), report.chain_id.to_string()]);
    table.add_row(vec!["Deployer".to_string(), report.deployer.to_string()]);

    if let Some(mock) = &report.mock_oracle {
        table.add_row(vec![
            format!("{} (mock)", mock.name),
            mock.address.to_string(),
        ]);
    }

    if let Some(subscription) = &report.subscription {
        table.add_row(vec![
            "VRF coordinator".to_string(),
            subscription.vrf_coordinator.to_string(),
        ]);

        let source = match &subscription.source {
            SubscriptionSource::Configured => "configured".to_string(),
            SubscriptionSource::Created { funded_amount, .. } => format!(
                "created, funded with {} ether",
                format_ether(*funded_amount)
            ),
        };
        table.add_row(vec![
            "Subscription".to_string(),
            format!("{} ({})", subscription.subscription_id, source),
        ]);
    }

    if let Some(raffle) = &report.raffle {
        let address = if raffle.newly_deployed {
            raffle.address.to_string()
        } else {
            format!("{} (reused)", raffle.address)
        };
        table.add_row(vec![raffle.name.clone(), address]);
        table.add_row(vec![
            "Confirmations".to_string(),
            format!(
                "{} / {}",
                raffle.confirmations, raffle.confirmations_requested
            ),
        ]);
    }

    table.add_row(vec![
        "Verification".to_string(),
        report.verification.to_string(),
    ]);

    table
}

fn networks_table(config: &NetworkConfig) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Chain id",
        "Name",
        "VRF coordinator",
        "Subscription",
        "Entrance fee",
        "Confirmations",
        "Verify",
    ]);

    for profile in &config.networks {
        table.add_row(vec![
            profile.chain_id.to_string(),
            profile.name.clone(),
            profile
                .vrf_coordinator
                .map(|address| address.to_string())
                .unwrap_or_else(|| "mock".to_string()),
            profile
                .subscription_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "created on deploy".to_string()),
            format!(
                "{} ether",
                format_ether(profile.entrance_fee)
            ),
            profile.deploy_confirmations(&config.constants).to_string(),
            profile.is_publicly_verifiable().to_string(),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, NetworkConfig::default());
    }

    #[test]
    fn test_load_config_overrides_constants() {
        let dir = TempDir::new("raffle-config").unwrap();
        let path = dir.path().join("raffle.toml");
        fs::write(
            &path,
            r#"
            [constants]
            subscription_fund_amount = "5"
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        let defaults = NetworkConfig::default();

        assert_eq!(
            config.constants.subscription_fund_amount,
            alloy_core::primitives::utils::parse_ether("5").unwrap()
        );
        assert_eq!(config.constants.base_fee, defaults.constants.base_fee);
        assert_eq!(config.networks, defaults.networks);
    }

    #[test]
    fn test_load_config_missing_file_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/raffle.toml"))).is_err());
    }

    #[test]
    fn test_networks_table_lists_every_profile() {
        let rendered = networks_table(&NetworkConfig::default()).to_string();
        assert!(rendered.contains("goerli"));
        assert!(rendered.contains("localhost"));
        assert!(rendered.contains("1560"));
    }

    fn etherscan_args(api_key: Option<&str>) -> EtherscanArgs {
        EtherscanArgs {
            etherscan_api_key: api_key.map(str::to_string),
            etherscan_api_url: None,
            verify_source: None,
            contract_name: "contracts/Raffle.sol:Raffle".to_string(),
            compiler_version: None,
        }
    }

    #[test]
    fn test_local_network_never_builds_a_verifier() {
        let config = NetworkConfig::default();
        let local = config.profile(31337).unwrap();

        assert!(build_verifier(&etherscan_args(Some("key")), local).is_none());
    }

    #[test]
    fn test_incomplete_verifier_settings_disable_verification() {
        let config = NetworkConfig::default();
        let goerli = config.profile(5).unwrap();

        // Missing source and compiler version.
        assert!(etherscan_verifier(&etherscan_args(Some("key")), 5).is_err());
        assert!(build_verifier(&etherscan_args(Some("key")), goerli).is_none());

        // No known endpoint for the chain.
        let mut custom = goerli.clone();
        custom.chain_id = 424242;
        assert!(build_verifier(&etherscan_args(Some("key")), &custom).is_none());
    }

    #[test]
    fn test_no_api_key_means_no_verifier() {
        let config = NetworkConfig::default();
        let goerli = config.profile(5).unwrap();

        assert!(etherscan_verifier(&etherscan_args(None), 5).unwrap().is_none());
        assert!(build_verifier(&etherscan_args(None), goerli).is_none());
    }

    #[test]
    fn test_complete_settings_build_a_verifier() {
        let dir = TempDir::new("raffle-verify").unwrap();
        let source = dir.path().join("standard-input.json");
        fs::write(&source, r#"{"language":"Solidity","sources":{}}"#).unwrap();

        let args = EtherscanArgs {
            verify_source: Some(source),
            compiler_version: Some("v0.8.7+commit.e28d00a7".to_string()),
            ..etherscan_args(Some("key"))
        };

        let config = NetworkConfig::default();
        assert!(build_verifier(&args, config.profile(5).unwrap()).is_some());
    }
}
