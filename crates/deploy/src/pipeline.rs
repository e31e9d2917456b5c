//! The deployment run: mocks, subscription, raffle, verification.

use alloy_core::primitives::Address;
use serde::Serialize;

use crate::{
    DeployError,
    config::NetworkConfig,
    stages::{
        self, StageContext, Tag, mocks,
        raffle::{self, DeployedContract},
        subscription::{self, ResolvedSubscription},
    },
    traits::{ContractVerifier, Deployment, DeploymentBackend, OracleSimulator, VerificationStatus},
};

const STAGE_SEPARATOR: &str = "---------------------------------";

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub network: String,
    pub chain_id: u64,
    pub deployer: Address,
    /// Set on local networks when the mocks stage ran.
    pub mock_oracle: Option<Deployment>,
    /// Set when the raffle stage ran.
    pub subscription: Option<ResolvedSubscription>,
    pub raffle: Option<DeployedContract>,
    pub verification: VerificationStatus,
}

/// Runs the deployment stages against one network.
///
/// `backend` deploys and looks up contracts, `oracle` manages subscriptions on
/// the mock coordinator and `verifier`, when given, submits the raffle to a
/// block explorer. On a real chain the backend and the oracle are usually the
/// same [`crate::RpcChain`].
pub struct Pipeline<'a, B, O, V> {
    config: &'a NetworkConfig,
    backend: &'a B,
    oracle: &'a O,
    verifier: Option<&'a V>,
    deployer: Address,
    tags: Vec<Tag>,
}

impl<'a, B, O, V> Pipeline<'a, B, O, V>
where
    B: DeploymentBackend,
    O: OracleSimulator,
    V: ContractVerifier,
{
    pub fn new(
        config: &'a NetworkConfig,
        backend: &'a B,
        oracle: &'a O,
        verifier: Option<&'a V>,
        deployer: Address,
    ) -> Self {
        Self {
            config,
            backend,
            oracle,
            verifier,
            deployer,
            tags: vec![Tag::All],
        }
    }

    /// Restrict the run to the stages carrying one of `tags`.
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Run the selected stages against `chain_id`.
    ///
    /// Configuration is checked before any transaction is sent. Any
    /// transaction failure aborts the run; a verification failure does not.
    pub async fn run(&self, chain_id: u64) -> Result<DeploymentReport, DeployError> {
        let profile = self.config.profile(chain_id)?;
        profile.validate()?;

        let ctx = StageContext {
            profile,
            constants: &self.config.constants,
            deployer: self.deployer,
        };

        tracing::info!(
            network = %profile.name,
            chain_id,
            deployer = %self.deployer,
            needs_mock_oracle = profile.needs_mock_oracle(),
            publicly_verifiable = profile.is_publicly_verifiable(),
            tags = ?self.tags,
            "Starting deployment..."
        );

        let mut report = DeploymentReport {
            network: profile.name.clone(),
            chain_id,
            deployer: self.deployer,
            mock_oracle: None,
            subscription: None,
            raffle: None,
            verification: VerificationStatus::NotRequested,
        };

        if stages::is_selected(mocks::TAGS, &self.tags) {
            report.mock_oracle = mocks::deploy_mocks(&ctx, self.backend).await?;
            tracing::info!("{}", STAGE_SEPARATOR);
        }

        if stages::is_selected(raffle::TAGS, &self.tags) {
            let subscription =
                subscription::resolve_subscription(&ctx, self.backend, self.oracle).await?;
            let contract = raffle::deploy_raffle(&ctx, self.backend, &subscription).await?;
            report.verification = raffle::verify_raffle(&ctx, self.verifier, &contract).await;

            report.subscription = Some(subscription);
            report.raffle = Some(contract);
            tracing::info!("{}", STAGE_SEPARATOR);
        }

        tracing::info!(network = %profile.name, "✓ Deployment complete!");

        Ok(report)
    }
}
