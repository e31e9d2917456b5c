use std::path::PathBuf;

use alloy_core::primitives::Address;
use clap::{Args, Parser, Subcommand};
use raffle_deploy::Tag;
use tracing::level_filters::LevelFilter;
use url::Url;

/// The default RPC endpoint (a local Hardhat or Anvil node).
const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default fully qualified name of the raffle contract.
const DEFAULT_CONTRACT_NAME: &str = "contracts/Raffle.sol:Raffle";

#[derive(Parser)]
#[command(name = "raffle")]
#[command(
    author,
    version,
    about = "Deploy a VRF raffle, with a mock coordinator on local chains"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "RAFFLE_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a TOML file overriding the built-in constants and network table.
    #[arg(long, alias = "conf", env = "RAFFLE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy the mocks, the subscription and the raffle.
    Deploy(DeployArgs),
    /// List the configured networks.
    Networks,
}

#[derive(Args)]
pub struct DeployArgs {
    /// The URL of the JSON-RPC endpoint. The node signs the transactions.
    #[arg(long, alias = "rpc", env = "RAFFLE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: Url,

    /// The expected chain id. The run is aborted if the node reports another one.
    #[arg(long, env = "RAFFLE_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// The account sending the transactions.
    ///
    /// If not provided, the first account managed by the node is used.
    #[arg(long, env = "RAFFLE_DEPLOYER")]
    pub deployer: Option<Address>,

    /// Build directories searched for contract artifacts (Hardhat or Foundry).
    #[arg(
        long,
        env = "RAFFLE_ARTIFACTS",
        value_delimiter = ',',
        default_value = "artifacts,out"
    )]
    pub artifacts: Vec<PathBuf>,

    /// The directory deployment records are written to, one sub-directory per network.
    #[arg(long, env = "RAFFLE_DEPLOYMENTS", default_value = "deployments")]
    pub deployments: PathBuf,

    /// Only run the stages carrying one of these tags (all, mocks, raffle).
    #[arg(long, env = "RAFFLE_TAGS", value_delimiter = ',', default_value = "all")]
    pub tags: Vec<Tag>,

    /// Print the deployment report as JSON instead of a table.
    #[arg(long, env = "RAFFLE_JSON")]
    pub json: bool,

    #[command(flatten)]
    pub etherscan: EtherscanArgs,
}

#[derive(Args)]
pub struct EtherscanArgs {
    /// Etherscan API key. Verification is skipped when absent.
    #[arg(long, env = "RAFFLE_ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Etherscan API endpoint.
    ///
    /// If not provided, the endpoint of the chain is used when one is known.
    #[arg(long, env = "RAFFLE_ETHERSCAN_API_URL")]
    pub etherscan_api_url: Option<Url>,

    /// Solidity standard-JSON input the raffle was compiled from.
    #[arg(long, env = "RAFFLE_VERIFY_SOURCE")]
    pub verify_source: Option<PathBuf>,

    /// Fully qualified name of the raffle contract.
    #[arg(long, env = "RAFFLE_CONTRACT_NAME", default_value = DEFAULT_CONTRACT_NAME)]
    pub contract_name: String,

    /// Full solc version, e.g. v0.8.7+commit.e28d00a7.
    #[arg(long, env = "RAFFLE_COMPILER_VERSION")]
    pub compiler_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_defaults() {
        let cli = Cli::try_parse_from(["raffle", "deploy"]).unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected the deploy command");
        };

        assert_eq!(args.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(args.tags, vec![Tag::All]);
        assert_eq!(
            args.artifacts,
            vec![PathBuf::from("artifacts"), PathBuf::from("out")]
        );
        assert!(args.deployer.is_none());
        assert!(args.etherscan.etherscan_api_key.is_none());
    }

    #[test]
    fn test_deploy_tags_and_deployer() {
        let cli = Cli::try_parse_from([
            "raffle",
            "deploy",
            "--tags",
            "mocks,raffle",
            "--deployer",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "--chain-id",
            "31337",
        ])
        .unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected the deploy command");
        };

        assert_eq!(args.tags, vec![Tag::Mocks, Tag::Raffle]);
        assert_eq!(args.chain_id, Some(31337));
        assert!(args.deployer.is_some());
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert!(Cli::try_parse_from(["raffle", "deploy", "--tags", "oracle"]).is_err());
    }
}
