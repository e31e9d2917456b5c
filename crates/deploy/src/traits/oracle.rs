//! VRF coordinator simulator: subscription management on a local network.

use std::future::Future;

use alloy_core::primitives::{Address, B256, U256};
use anyhow::{Context, Result};

use crate::{receipt::TransactionReceipt, types::SubscriptionId};

/// Subscription operations of a (mock) VRF coordinator.
pub trait OracleSimulator: Send + Sync {
    /// Send `createSubscription()` to `coordinator`. Returns the transaction hash.
    fn create_subscription(
        &self,
        coordinator: Address,
        from: Address,
    ) -> impl Future<Output = Result<B256>> + Send;

    /// Wait until `tx_hash` is mined with `confirmations` blocks. Fails if the
    /// transaction reverted.
    fn wait_for_receipt(
        &self,
        tx_hash: B256,
        confirmations: u64,
    ) -> impl Future<Output = Result<TransactionReceipt>> + Send;

    /// Extract the new subscription id from a confirmed `createSubscription`
    /// receipt.
    fn decode_subscription_id(&self, receipt: &TransactionReceipt) -> Result<SubscriptionId> {
        subscription_id_from_receipt(receipt)
    }

    /// Send `fundSubscription(id, amount)` to `coordinator`. Returns the
    /// transaction hash without waiting for it to be mined.
    fn fund_subscription(
        &self,
        coordinator: Address,
        from: Address,
        subscription_id: SubscriptionId,
        amount: U256,
    ) -> impl Future<Output = Result<B256>> + Send;
}

/// Read the subscription id out of a `createSubscription` receipt.
///
/// The mock coordinator emits `SubscriptionCreated(uint64 indexed subId,
/// address owner)` as its first event, so the id is the first indexed topic
/// of the first log.
pub fn subscription_id_from_receipt(receipt: &TransactionReceipt) -> Result<SubscriptionId> {
    let event = receipt
        .logs
        .first()
        .context("createSubscription receipt contains no events")?;

    let topic = event
        .topics
        .get(1)
        .context("SubscriptionCreated event has no subscription id topic")?;

    let (high, low) = topic.0.split_at(24);
    if high.iter().any(|byte| *byte != 0) {
        anyhow::bail!("Subscription id does not fit in uint64: {}", topic);
    }

    Ok(SubscriptionId(u64::from_be_bytes(low.try_into()?)))
}
