//! Collaborator interfaces of the deployment pipeline.
//!
//! The pipeline only talks to the chain and the block explorer through these
//! traits. [`crate::RpcChain`] implements the chain side over JSON-RPC and
//! [`crate::EtherscanVerifier`] the explorer side.

mod backend;
mod oracle;
mod verifier;

pub use backend::{DeployOptions, Deployment, DeploymentBackend};
pub use oracle::{OracleSimulator, subscription_id_from_receipt};
pub use verifier::{ContractVerifier, VerificationStatus};
