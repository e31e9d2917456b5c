//! Raffle deployment and source verification.

use alloy_core::primitives::{Address, B256};
use serde::Serialize;

use super::{StageContext, Tag, subscription::ResolvedSubscription};
use crate::{
    DeployError,
    config::NetworkProfile,
    traits::{ContractVerifier, DeployOptions, DeploymentBackend, VerificationStatus},
    types::ConstructorArgs,
};

/// Name of the primary contract.
pub const RAFFLE: &str = "Raffle";

/// The subscription and raffle stages both run under the `raffle` tag.
pub const TAGS: &[Tag] = &[Tag::All, Tag::Raffle];

/// A deployed raffle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedContract {
    pub name: String,
    pub address: Address,
    pub args: ConstructorArgs,
    pub transaction_hash: Option<B256>,
    pub confirmations_requested: u64,
    /// Confirmations reported by the backend.
    pub confirmations: u64,
    pub newly_deployed: bool,
}

/// Assemble the raffle constructor arguments.
pub fn constructor_args(
    profile: &NetworkProfile,
    subscription: &ResolvedSubscription,
) -> ConstructorArgs {
    ConstructorArgs {
        entrance_fee: profile.entrance_fee,
        vrf_coordinator: subscription.vrf_coordinator,
        subscription_id: subscription.subscription_id,
        gas_lane: profile.gas_lane,
        callback_gas_limit: profile.callback_gas_limit,
        interval: profile.interval,
    }
}

/// Deploy the raffle wired to `subscription`.
pub async fn deploy_raffle<B: DeploymentBackend>(
    ctx: &StageContext<'_>,
    backend: &B,
    subscription: &ResolvedSubscription,
) -> Result<DeployedContract, DeployError> {
    let args = constructor_args(ctx.profile, subscription);
    let confirmations = ctx.profile.deploy_confirmations(ctx.constants);

    tracing::info!(
        network = %ctx.profile.name,
        vrf_coordinator = %args.vrf_coordinator,
        subscription_id = %args.subscription_id,
        confirmations,
        "Deploying raffle..."
    );

    let deployment = backend
        .deploy(
            RAFFLE,
            DeployOptions {
                from: ctx.deployer,
                args: args.to_abi_args(),
                confirmations,
            },
        )
        .await
        .map_err(|err| DeployError::transaction("deploying the raffle", err))?;

    tracing::info!(
        address = %deployment.address,
        newly_deployed = deployment.newly_deployed,
        "Raffle deployed"
    );

    Ok(DeployedContract {
        name: deployment.name,
        address: deployment.address,
        args,
        transaction_hash: deployment.transaction_hash,
        confirmations_requested: confirmations,
        confirmations: deployment.confirmations,
        newly_deployed: deployment.newly_deployed,
    })
}

/// Submit the raffle for source verification when the network supports it.
///
/// Never fails: verification problems are logged and reported in the
/// returned status, the deployment itself stands.
pub async fn verify_raffle<V: ContractVerifier>(
    ctx: &StageContext<'_>,
    verifier: Option<&V>,
    contract: &DeployedContract,
) -> VerificationStatus {
    if !ctx.profile.is_publicly_verifiable() {
        return VerificationStatus::NotRequested;
    }

    let Some(verifier) = verifier else {
        tracing::warn!(
            network = %ctx.profile.name,
            "No block explorer configured, skipping verification"
        );
        return VerificationStatus::Skipped("no block explorer verifier configured".to_string());
    };

    tracing::info!(address = %contract.address, "Verifying raffle...");

    match verifier.verify(contract.address, &contract.args).await {
        Ok(status) => {
            tracing::info!(address = %contract.address, status = %status, "Verification finished");
            status
        }
        Err(err) => {
            tracing::warn!(
                address = %contract.address,
                error = %err,
                "Verification failed, the deployment is kept"
            );
            VerificationStatus::Failed(err.to_string())
        }
    }
}
