//! Mock infrastructure: the VRF coordinator simulator.

use alloy_core::primitives::U256;

use super::{StageContext, Tag};
use crate::{
    DeployError,
    config::{DeployConstants, LOCAL_BLOCK_CONFIRMATIONS},
    traits::{DeployOptions, Deployment, DeploymentBackend},
    types::AbiArg,
};

/// Name under which the mock coordinator is deployed and looked up.
pub const VRF_COORDINATOR_MOCK: &str = "VRFCoordinatorV2Mock";

pub const TAGS: &[Tag] = &[Tag::All, Tag::Mocks];

/// Constructor arguments of the mock: `(uint96 baseFee, uint96 gasPriceLink)`.
pub fn mock_constructor_args(constants: &DeployConstants) -> Vec<AbiArg> {
    vec![
        AbiArg::Uint(constants.base_fee),
        AbiArg::Uint(U256::from(constants.gas_price_link)),
    ]
}

/// Deploy the mock coordinator if the network has no live one.
///
/// Returns `None` without touching the backend on networks with a live
/// coordinator.
pub async fn deploy_mocks<B: DeploymentBackend>(
    ctx: &StageContext<'_>,
    backend: &B,
) -> Result<Option<Deployment>, DeployError> {
    if !ctx.profile.needs_mock_oracle() {
        tracing::debug!(
            network = %ctx.profile.name,
            "Live VRF coordinator configured, no mocks needed"
        );
        return Ok(None);
    }

    tracing::info!(network = %ctx.profile.name, "Local network detected! Deploying mocks...");

    let deployment = backend
        .deploy(
            VRF_COORDINATOR_MOCK,
            DeployOptions {
                from: ctx.deployer,
                args: mock_constructor_args(ctx.constants),
                confirmations: LOCAL_BLOCK_CONFIRMATIONS,
            },
        )
        .await
        .map_err(|err| DeployError::transaction("deploying the VRF coordinator mock", err))?;

    tracing::info!(address = %deployment.address, "Mocks deployed!");

    Ok(Some(deployment))
}
