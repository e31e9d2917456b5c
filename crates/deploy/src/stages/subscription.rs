//! VRF subscription lifecycle.
//!
//! On networks with a live coordinator the subscription already exists and is
//! read from the network profile. On local networks a new subscription is
//! created on the mock coordinator and funded before the raffle is deployed,
//! since the raffle's first randomness request would otherwise be rejected.

use alloy_core::primitives::{Address, B256, U256, utils::format_ether};
use serde::Serialize;

use super::{StageContext, mocks::VRF_COORDINATOR_MOCK};
use crate::{
    DeployError,
    config::NetworkProfile,
    traits::{DeploymentBackend, OracleSimulator},
    types::SubscriptionId,
};

/// Confirmations waited for on the `createSubscription` transaction.
pub const SUBSCRIPTION_CONFIRMATIONS: u64 = 1;

/// Where the subscription of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionSource {
    /// Pre-existing subscription on a live coordinator.
    Configured,
    /// Created and funded on the mock coordinator during this run.
    Created {
        creation_tx: B256,
        funding_tx: B256,
        funded_amount: U256,
    },
}

/// The coordinator address and subscription id the raffle is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSubscription {
    pub vrf_coordinator: Address,
    pub subscription_id: SubscriptionId,
    pub source: SubscriptionSource,
}

/// Resolve the subscription of the run, creating and funding one on local
/// networks.
pub async fn resolve_subscription<B, O>(
    ctx: &StageContext<'_>,
    backend: &B,
    oracle: &O,
) -> Result<ResolvedSubscription, DeployError>
where
    B: DeploymentBackend,
    O: OracleSimulator,
{
    match ctx.profile.vrf_coordinator {
        Some(coordinator) => configured_subscription(ctx.profile, coordinator),
        None => create_subscription(ctx, backend, oracle).await,
    }
}

fn configured_subscription(
    profile: &NetworkProfile,
    coordinator: Address,
) -> Result<ResolvedSubscription, DeployError> {
    let subscription_id = profile.subscription_id.ok_or_else(|| {
        DeployError::config(format!(
            "network '{}' has a VRF coordinator but no subscription_id",
            profile.name
        ))
    })?;

    tracing::info!(
        coordinator = %coordinator,
        subscription_id = %subscription_id,
        "Using configured VRF subscription"
    );

    Ok(ResolvedSubscription {
        vrf_coordinator: coordinator,
        subscription_id,
        source: SubscriptionSource::Configured,
    })
}

async fn create_subscription<B, O>(
    ctx: &StageContext<'_>,
    backend: &B,
    oracle: &O,
) -> Result<ResolvedSubscription, DeployError>
where
    B: DeploymentBackend,
    O: OracleSimulator,
{
    let mock = backend
        .deployment(VRF_COORDINATOR_MOCK)
        .await
        .map_err(|err| DeployError::transaction("looking up the VRF coordinator mock", err))?
        .ok_or_else(|| {
            DeployError::config(format!(
                "{} is not deployed on '{}'; run the mocks stage first",
                VRF_COORDINATOR_MOCK, ctx.profile.name
            ))
        })?;

    let creation_tx = oracle
        .create_subscription(mock.address, ctx.deployer)
        .await
        .map_err(|err| DeployError::transaction("creating the subscription", err))?;

    let receipt = oracle
        .wait_for_receipt(creation_tx, SUBSCRIPTION_CONFIRMATIONS)
        .await
        .map_err(|err| DeployError::transaction("creating the subscription", err))?;

    let subscription_id = oracle
        .decode_subscription_id(&receipt)
        .map_err(|err| DeployError::transaction("decoding the subscription id", err))?;

    tracing::info!(
        coordinator = %mock.address,
        subscription_id = %subscription_id,
        tx_hash = %creation_tx,
        "Subscription created"
    );

    let amount = ctx.constants.subscription_fund_amount;
    let funding_tx = oracle
        .fund_subscription(mock.address, ctx.deployer, subscription_id, amount)
        .await
        .map_err(|err| DeployError::transaction("funding the subscription", err))?;

    tracing::info!(
        subscription_id = %subscription_id,
        amount = %format_ether(amount),
        tx_hash = %funding_tx,
        "Subscription funding submitted"
    );

    Ok(ResolvedSubscription {
        vrf_coordinator: mock.address,
        subscription_id,
        source: SubscriptionSource::Created {
            creation_tx,
            funding_tx,
            funded_amount: amount,
        },
    })
}
