//! JSON-RPC implementation of the chain collaborators.
//!
//! Transactions are sent with `eth_sendTransaction`, so signing is left to
//! the node (an unlocked development account, or a signer proxy in front of
//! a public node).

use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use anyhow::{Context, Result};
use serde_json::json;
use url::Url;

use crate::{
    artifacts::ArtifactStore,
    deployments::{DeploymentRecord, DeploymentStore, deployment_hash},
    receipt::TransactionReceipt,
    rpc,
    traits::{DeployOptions, Deployment, DeploymentBackend, OracleSimulator},
    types::{AbiArg, SubscriptionId, encode_args, encode_call},
};

/// Default time allowed for a transaction to reach its confirmation target.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Bit width of the `uint96` funding amount.
const UINT96_BITS: usize = 96;

/// Chain access over an Ethereum JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcChain {
    client: reqwest::Client,
    url: Url,
    artifacts: ArtifactStore,
    store: DeploymentStore,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl RpcChain {
    pub fn new(url: Url, artifacts: ArtifactStore, store: DeploymentStore) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            url,
            artifacts,
            store,
            poll_interval: rpc::DEFAULT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn store(&self) -> &DeploymentStore {
        &self.store
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<T> {
        rpc::json_rpc_call(&self.client, self.url.as_str(), method, params).await
    }

    /// The chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64> {
        rpc::chain_id(&self.client, self.url.as_str()).await
    }

    /// The first account managed by the node, used as the default deployer.
    pub async fn default_account(&self) -> Result<Address> {
        let accounts: Vec<Address> = self.call("eth_accounts", vec![]).await?;
        accounts
            .first()
            .copied()
            .context("Node manages no accounts; pass a deployer address explicitly")
    }

    pub async fn block_number(&self) -> Result<u64> {
        let block: String = self.call("eth_blockNumber", vec![]).await?;
        rpc::parse_hex_u64(&block)
    }

    pub async fn code_at(&self, address: Address) -> Result<Bytes> {
        self.call("eth_getCode", vec![json!(address), json!("latest")])
            .await
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Option<Address>,
        data: Vec<u8>,
    ) -> Result<B256> {
        let mut tx = json!({
            "from": from,
            "data": Bytes::from(data),
        });
        if let Some(to) = to {
            tx["to"] = json!(to);
        }

        self.call("eth_sendTransaction", vec![tx]).await
    }

    /// Wait until `tx_hash` is mined and `confirmations` blocks deep.
    ///
    /// Returns the receipt and the number of confirmations observed.
    pub async fn wait_for_confirmations(
        &self,
        tx_hash: B256,
        confirmations: u64,
    ) -> Result<(TransactionReceipt, u64)> {
        let receipt: TransactionReceipt = rpc::poll_until(
            &format!("receipt of {}", tx_hash),
            self.confirmation_timeout,
            self.poll_interval,
            || async move {
                self.call::<Option<TransactionReceipt>>(
                    "eth_getTransactionReceipt",
                    vec![json!(tx_hash)],
                )
                .await
            },
        )
        .await?;

        ensure_succeeded(tx_hash, &receipt)?;

        let target = confirmation_target(receipt.block_number, confirmations);
        let head = rpc::poll_until(
            &format!("{} confirmations of {}", confirmations, tx_hash),
            self.confirmation_timeout,
            self.poll_interval,
            || async move {
                let head = self.block_number().await?;
                Ok((head >= target).then_some(head))
            },
        )
        .await?;

        let observed = observed_confirmations(receipt.block_number, head);
        tracing::debug!(
            tx_hash = %tx_hash,
            block_number = receipt.block_number,
            confirmations = observed,
            "Transaction confirmed"
        );

        Ok((receipt, observed))
    }

    /// Return the recorded deployment if it matches `hash` and its code is
    /// still on chain (a restarted local node loses it).
    async fn reusable_deployment(&self, name: &str, hash: &str) -> Result<Option<Deployment>> {
        let Some(record) = matching_record(&self.store, name, hash)? else {
            return Ok(None);
        };

        let code = self.code_at(record.address).await?;
        Ok(live_deployment(record, &code))
    }
}

/// The recorded deployment of `name`, if its hash is `hash`.
fn matching_record(
    store: &DeploymentStore,
    name: &str,
    hash: &str,
) -> Result<Option<DeploymentRecord>> {
    let Some(record) = store.load(name)? else {
        return Ok(None);
    };

    if record.deployment_hash != hash {
        tracing::info!(contract = name, "Deployment changed, redeploying");
        return Ok(None);
    }

    Ok(Some(record))
}

/// `record` as a reused deployment, unless the chain has no code at its
/// address.
fn live_deployment(record: DeploymentRecord, code: &Bytes) -> Option<Deployment> {
    if code.is_empty() {
        tracing::info!(
            contract = %record.contract_name,
            address = %record.address,
            "Recorded deployment has no code on chain"
        );
        return None;
    }

    Some(record.into_deployment(false))
}

fn ensure_succeeded(tx_hash: B256, receipt: &TransactionReceipt) -> Result<()> {
    if !receipt.succeeded() {
        anyhow::bail!(
            "Transaction {} reverted in block {}",
            tx_hash,
            receipt.block_number
        );
    }

    Ok(())
}

/// Block height at which a transaction mined in `block` has `confirmations`
/// confirmations. The inclusion block counts as the first one.
fn confirmation_target(block: u64, confirmations: u64) -> u64 {
    block + confirmations.max(1) - 1
}

fn observed_confirmations(block: u64, head: u64) -> u64 {
    head.saturating_sub(block) + 1
}

/// Calldata of `fundSubscription(uint64,uint96)`.
fn fund_subscription_call(subscription_id: SubscriptionId, amount: U256) -> Result<Vec<u8>> {
    if amount.bit_len() > UINT96_BITS {
        anyhow::bail!("Funding amount {} does not fit in uint96", amount);
    }

    Ok(encode_call(
        "fundSubscription(uint64,uint96)",
        &[
            AbiArg::Uint(U256::from(subscription_id.0)),
            AbiArg::Uint(amount),
        ],
    ))
}

impl DeploymentBackend for RpcChain {
    async fn deploy(&self, name: &str, options: DeployOptions) -> Result<Deployment> {
        let artifact = self.artifacts.load(name)?;
        let encoded_args = encode_args(&options.args);
        let hash = deployment_hash(&artifact.bytecode, &encoded_args);

        if let Some(deployment) = self.reusable_deployment(name, &hash).await? {
            tracing::info!(
                contract = name,
                address = %deployment.address,
                "Reusing deployment"
            );
            return Ok(deployment);
        }

        let mut data = artifact.bytecode.to_vec();
        data.extend(encoded_args);

        let tx_hash = self
            .send_transaction(options.from, None, data)
            .await
            .with_context(|| format!("Failed to send {} creation transaction", name))?;

        tracing::info!(
            contract = name,
            tx_hash = %tx_hash,
            confirmations = options.confirmations,
            "Deploying contract"
        );

        let (receipt, observed) = self
            .wait_for_confirmations(tx_hash, options.confirmations)
            .await
            .with_context(|| format!("Failed to confirm {} deployment", name))?;

        let address = receipt
            .contract_address
            .with_context(|| format!("{} creation receipt has no contract address", name))?;

        tracing::info!(
            contract = name,
            address = %address,
            gas_used = ?receipt.gas_used,
            "Contract deployed"
        );

        let record = DeploymentRecord::new(
            name,
            address,
            tx_hash,
            receipt.block_number,
            options.args,
            observed,
            hash,
        );
        self.store.save(&record)?;

        Ok(record.into_deployment(true))
    }

    async fn deployment(&self, name: &str) -> Result<Option<Deployment>> {
        let Some(record) = self.store.load(name)? else {
            return Ok(None);
        };

        let code = self.code_at(record.address).await?;
        Ok(live_deployment(record, &code))
    }
}

impl OracleSimulator for RpcChain {
    async fn create_subscription(&self, coordinator: Address, from: Address) -> Result<B256> {
        self.send_transaction(from, Some(coordinator), encode_call("createSubscription()", &[]))
            .await
            .context("Failed to send createSubscription transaction")
    }

    async fn wait_for_receipt(&self, tx_hash: B256, confirmations: u64) -> Result<TransactionReceipt> {
        let (receipt, _) = self.wait_for_confirmations(tx_hash, confirmations).await?;
        Ok(receipt)
    }

    async fn fund_subscription(
        &self,
        coordinator: Address,
        from: Address,
        subscription_id: SubscriptionId,
        amount: U256,
    ) -> Result<B256> {
        let data = fund_subscription_call(subscription_id, amount)?;

        self.send_transaction(from, Some(coordinator), data)
            .await
            .with_context(|| format!("Failed to send fundSubscription({}) transaction", subscription_id))
    }
}
