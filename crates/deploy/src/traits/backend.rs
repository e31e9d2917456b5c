//! Deployment backend: deploys named contracts and remembers them.

use std::future::Future;

use alloy_core::primitives::{Address, B256};
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::types::AbiArg;

/// Options of a single named deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// Account sending the creation transaction.
    pub from: Address,
    /// Constructor arguments, in constructor order.
    pub args: Vec<AbiArg>,
    /// Confirmations to wait for before returning.
    pub confirmations: u64,
}

/// A contract deployment known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    pub address: Address,
    pub transaction_hash: Option<B256>,
    pub args: Vec<AbiArg>,
    /// Confirmations observed when the deployment returned.
    pub confirmations: u64,
    /// `false` when an identical earlier deployment was reused.
    pub newly_deployed: bool,
}

/// Deploys contracts by name and looks up earlier deployments.
///
/// Implementations are expected to detect re-deployments of identical
/// bytecode and arguments and return the recorded deployment instead.
pub trait DeploymentBackend: Send + Sync {
    /// Deploy contract `name`, waiting for `options.confirmations`.
    fn deploy(
        &self,
        name: &str,
        options: DeployOptions,
    ) -> impl Future<Output = Result<Deployment>> + Send;

    /// Look up a deployment recorded earlier.
    fn deployment(&self, name: &str) -> impl Future<Output = Result<Option<Deployment>>> + Send;
}
