//! raffle-deploy - Deployment library for the VRF raffle.
//!
//! This crate deploys a raffle contract wired to a Chainlink-style VRF
//! coordinator. On local development chains it first deploys a mock
//! coordinator and creates and funds a subscription on it; on public chains
//! it uses the configured coordinator and subscription, waits for extra
//! confirmations and submits the raffle for source verification.

mod artifacts;
pub use artifacts::{Artifact, ArtifactStore};

mod chain;
pub use chain::{DEFAULT_CONFIRMATION_TIMEOUT, RpcChain};

pub mod config;
pub use config::{DeployConstants, NetworkConfig, NetworkProfile};

mod deployments;
pub use deployments::{DeploymentRecord, DeploymentStore, deployment_hash};

mod error;
pub use error::DeployError;

pub mod etherscan;
pub use etherscan::{EtherscanConfig, EtherscanVerifier};

mod pipeline;
pub use pipeline::{DeploymentReport, Pipeline};

mod receipt;
pub use receipt::{Log, TransactionReceipt};

pub mod rpc;
pub mod stages;
pub use stages::{
    Tag,
    raffle::DeployedContract,
    subscription::{ResolvedSubscription, SubscriptionSource},
};

pub mod traits;
pub use traits::{
    ContractVerifier, DeployOptions, Deployment, DeploymentBackend, OracleSimulator,
    VerificationStatus,
};

pub mod types;
pub use types::{AbiArg, ConstructorArgs, SubscriptionId};
